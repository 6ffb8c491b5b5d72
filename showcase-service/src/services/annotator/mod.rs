//! Annotation client abstraction and implementations.
//!
//! The trait keeps the Gemini backend swappable for a mock in tests.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiAnnotator, GeminiConfig};
pub use mock::MockAnnotator;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Error type for annotation operations. Callers see all of these as one
/// generic annotation failure; the variants exist for logging.
#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),
}

/// Result of a successful annotation.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Reference URI the service assigned to the uploaded asset.
    pub file_uri: String,

    /// Generated text: either the refusal sentence or a brand rundown plus
    /// one upcycling instruction.
    pub text: String,
}

/// Uploads a local image to the annotation service and asks it for a
/// generated description conditioned on the product catalog.
#[async_trait]
pub trait Annotator: Send + Sync {
    async fn annotate(
        &self,
        image_path: &Path,
        mime_type: &str,
        display_name: &str,
        product_catalog: &str,
    ) -> Result<Annotation, AnnotatorError>;
}
