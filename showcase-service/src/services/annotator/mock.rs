//! Mock annotator for testing.

use super::{Annotation, Annotator, AnnotatorError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Test double: reads the staged file like the real client, counts calls,
/// and either returns a canned annotation or a forced failure.
pub struct MockAnnotator {
    fail: bool,
    calls: AtomicUsize,
}

impl MockAnnotator {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of annotate calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Annotator for MockAnnotator {
    async fn annotate(
        &self,
        image_path: &Path,
        _mime_type: &str,
        display_name: &str,
        _product_catalog: &str,
    ) -> Result<Annotation, AnnotatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Read the staged file the way the real client does, so callers
        // exercise the staging contract.
        let bytes = tokio::fs::read(image_path).await?;

        if self.fail {
            return Err(AnnotatorError::Api(
                "mock annotator configured to fail".to_string(),
            ));
        }

        Ok(Annotation {
            file_uri: format!(
                "https://generativelanguage.googleapis.com/v1beta/files/mock-{}",
                display_name
            ),
            text: format!(
                "Mock annotation for {} ({} bytes)",
                display_name,
                bytes.len()
            ),
        })
    }
}
