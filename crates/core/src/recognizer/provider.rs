// crates/core/src/recognizer/provider.rs
//! Recognizer trait defining the interface to an OCR engine.

use std::path::Path;

use async_trait::async_trait;

use super::types::{RecognitionOutput, RecognizeError, RecognizeOptions};

/// Trait for engines that turn an image file into text.
///
/// Implementations include:
/// - `PaddleCliRecognizer` - spawns the `paddleocr` CLI process
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognise the text in the image stored at `image`.
    ///
    /// Dropping the returned future must stop any work it started.
    async fn recognize(
        &self,
        image: &Path,
        options: &RecognizeOptions,
    ) -> Result<RecognitionOutput, RecognizeError>;

    /// Check if the engine is available (binary installed, models present, etc.)
    async fn health_check(&self) -> Result<(), RecognizeError>;

    /// Engine name for logging/display (e.g. "paddleocr-cli").
    fn name(&self) -> &str;
}
