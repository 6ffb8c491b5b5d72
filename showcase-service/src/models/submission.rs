use chrono::{DateTime, Utc};
use mongodb::bson::{spec::BinarySubtype, Binary};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Annotated,
}

/// One uploaded image with its submitter's email. `gemini_uri` is absent
/// until the annotation service accepts the image, then written exactly once
/// together with the `annotated` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub image: Binary,
    pub content_type: String,
    pub status: SubmissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_uri: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(email: String, image: Vec<u8>, content_type: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            image: Binary {
                subtype: BinarySubtype::Generic,
                bytes: image,
            },
            content_type,
            status: SubmissionStatus::Pending,
            gemini_uri: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_submission_starts_pending_without_reference() {
        let submission = Submission::new(
            "a@b.com".to_string(),
            vec![1, 2, 3],
            "image/jpeg".to_string(),
        );

        assert_eq!(submission.status, SubmissionStatus::Pending);
        assert!(submission.gemini_uri.is_none());
        assert_eq!(submission.image.bytes, vec![1, 2, 3]);
        assert_eq!(submission.content_type, "image/jpeg");
    }

    #[test]
    fn pending_submission_serializes_without_reference_field() {
        let submission = Submission::new(
            "a@b.com".to_string(),
            vec![0u8; 4],
            "image/png".to_string(),
        );

        let doc = mongodb::bson::to_document(&submission).unwrap();
        assert!(!doc.contains_key("gemini_uri"));
        assert_eq!(doc.get_str("status").unwrap(), "pending");
    }
}
