//! Gemini-backed annotator.
//!
//! Uploads the image through the Files API resumable protocol, then asks
//! `generateContent` for a classification and upcycling instruction
//! conditioned on the uploaded asset.

use super::{Annotation, Annotator, AnnotatorError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Base URL for the Files API upload protocol.
const GEMINI_UPLOAD_BASE: &str = "https://generativelanguage.googleapis.com/upload/v1beta";

/// Prompt sent with every annotation request. `{products}` is replaced with
/// the catalog contents; the rest of the wording is fixed, including the
/// exact refusal sentence.
const ANNOTATION_PROMPT: &str = "Here is a full list of Pepsico products:\n {products}. Is the object in the image a Pepsico product? If not, reply 'This is not a Pepsico product, please take a photo of a Pepsico product!' If it is a pepsico product, describe how many and what brands they are. Then, give me an easy-to-follow instruction for upcycling projects with this object. the project has to be creative, environment-friendly, and fun to make. Give me only one but a different one each time";

fn annotation_prompt(products: &str) -> String {
    ANNOTATION_PROMPT.replace("{products}", products)
}

/// Gemini annotator configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

pub struct GeminiAnnotator {
    config: GeminiConfig,
    client: Client,
}

impl GeminiAnnotator {
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn upload_url(&self) -> String {
        format!("{}/files?key={}", GEMINI_UPLOAD_BASE, self.config.api_key)
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API_BASE, self.config.model, self.config.api_key
        )
    }

    /// Push the image bytes through the resumable upload handshake: a start
    /// request that yields an upload URL in a response header, then a single
    /// upload-and-finalize request carrying the bytes.
    async fn upload_file(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, AnnotatorError> {
        let start = self
            .client
            .post(self.upload_url())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&StartUploadRequest {
                file: StartUploadFile {
                    display_name: display_name.to_string(),
                },
            })
            .send()
            .await
            .map_err(|e| AnnotatorError::Network(e.to_string()))?;

        if !start.status().is_success() {
            let status = start.status();
            let error_text = start.text().await.unwrap_or_default();
            return Err(AnnotatorError::Api(format!(
                "Gemini upload start failed {}: {}",
                status, error_text
            )));
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                AnnotatorError::MalformedResponse(
                    "upload start response missing x-goog-upload-url header".to_string(),
                )
            })?;

        let response = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AnnotatorError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnnotatorError::Api(format!(
                "Gemini upload failed {}: {}",
                status, error_text
            )));
        }

        let body: UploadFileResponse = response
            .json()
            .await
            .map_err(|e| AnnotatorError::MalformedResponse(e.to_string()))?;

        Ok(body.file)
    }

    async fn generate(
        &self,
        prompt: String,
        file: &UploadedFile,
    ) -> Result<String, AnnotatorError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::FileData {
                        file_data: FileData {
                            file_uri: file.uri.clone(),
                            mime_type: file.mime_type.clone(),
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AnnotatorError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnnotatorError::Api(format!(
                "Gemini generate failed {}: {}",
                status, error_text
            )));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| AnnotatorError::Network(e.to_string()))?;
        tracing::info!(response = %raw, "Gemini generate response");

        let api_response: GenerateContentResponse = serde_json::from_str(&raw)
            .map_err(|e| AnnotatorError::MalformedResponse(e.to_string()))?;

        candidate_text(&api_response).ok_or_else(|| {
            AnnotatorError::MalformedResponse("generate response contains no text".to_string())
        })
    }
}

/// Concatenated text parts of the first candidate, if any.
fn candidate_text(response: &GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let text: String = candidate
        .content
        .parts
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl Annotator for GeminiAnnotator {
    async fn annotate(
        &self,
        image_path: &Path,
        mime_type: &str,
        display_name: &str,
        product_catalog: &str,
    ) -> Result<Annotation, AnnotatorError> {
        let bytes = tokio::fs::read(image_path).await?;

        let file = self.upload_file(bytes, mime_type, display_name).await?;
        tracing::info!(
            display_name = %display_name,
            uri = %file.uri,
            "Uploaded file to Gemini"
        );

        let text = self
            .generate(annotation_prompt(product_catalog), &file)
            .await?;

        Ok(Annotation {
            file_uri: file.uri,
            text,
        })
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct StartUploadRequest {
    file: StartUploadFile,
}

#[derive(Debug, Serialize)]
struct StartUploadFile {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct UploadFileResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    uri: String,
    mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    file_uri: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
