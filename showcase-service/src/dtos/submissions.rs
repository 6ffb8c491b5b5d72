use base64::{engine::general_purpose::STANDARD, Engine};
use mongodb::bson::Binary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub gemini_response: String,
    pub gemini_uri: String,
}

/// Projection read back from the store for the leaderboard. Image and
/// reference are optional so rows that predate this writer still project.
#[derive(Debug, Deserialize)]
pub struct LeaderboardRow {
    pub email: String,
    pub content_type: String,
    #[serde(default)]
    pub image: Option<Binary>,
    #[serde(default)]
    pub gemini_uri: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub email: String,
    pub content_type: String,
    /// Base64-encoded image bytes; null when the row carries no image.
    pub image: Option<String>,
    pub gemini_uri: Option<String>,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            email: row.email,
            content_type: row.content_type,
            image: row.image.map(|binary| STANDARD.encode(binary.bytes)),
            gemini_uri: row.gemini_uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::spec::BinarySubtype;

    #[test]
    fn entry_encodes_image_as_base64() {
        let row = LeaderboardRow {
            email: "a@b.com".to_string(),
            content_type: "image/jpeg".to_string(),
            image: Some(Binary {
                subtype: BinarySubtype::Generic,
                bytes: vec![0xFF, 0xD8, 0xFF],
            }),
            gemini_uri: Some("files/abc".to_string()),
        };

        let entry = LeaderboardEntry::from(row);
        assert_eq!(entry.image.as_deref(), Some("/9j/"));
    }

    #[test]
    fn entry_without_image_serializes_as_null() {
        let row = LeaderboardRow {
            email: "a@b.com".to_string(),
            content_type: "image/png".to_string(),
            image: None,
            gemini_uri: None,
        };

        let json = serde_json::to_value(LeaderboardEntry::from(row)).unwrap();
        assert_eq!(json["image"], serde_json::Value::Null);
        assert_eq!(json["geminiUri"], serde_json::Value::Null);
        assert_eq!(json["contentType"], "image/png");
    }

    #[test]
    fn upload_response_uses_camel_case_keys() {
        let json = serde_json::to_value(UploadResponse {
            message: "Image uploaded successfully!".to_string(),
            gemini_response: "Two cans of Pepsi.".to_string(),
            gemini_uri: "files/abc".to_string(),
        })
        .unwrap();

        assert!(json.get("geminiResponse").is_some());
        assert!(json.get("geminiUri").is_some());
    }
}
