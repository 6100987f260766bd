/// Text recognition
///
/// The recognizer is a black box: it takes an image handle and resolves to
/// the recognized text or an error. `engine.rs` provides the ocrs-backed
/// implementation used by the app.

pub mod engine;

use async_trait::async_trait;

use crate::error::RecognitionError;
use crate::state::data::{ImageHandle, RecognitionOutcome};

pub use engine::OcrsRecognizer;

#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize the text in `image`. Single shot, no retry, no timeout.
    async fn recognize(&self, image: &ImageHandle) -> Result<String, RecognitionError>;
}

impl RecognitionOutcome {
    /// Classify a raw recognizer result for display.
    /// Whitespace-only text counts as nothing found.
    pub fn from_result(result: Result<String, RecognitionError>) -> Self {
        match result {
            Ok(text) if text.trim().is_empty() => RecognitionOutcome::Empty,
            Ok(text) => RecognitionOutcome::Text(text),
            Err(e) => RecognitionOutcome::Failed(e.to_string()),
        }
    }
}
