// crates/core/src/recognizer/types.rs
//! Request/response/error types for text recognition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default PaddleOCR language model.
pub const DEFAULT_LANG: &str = "ch";

/// Per-call engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizeOptions {
    pub lang: String,
    pub use_angle_cls: bool,
    pub use_gpu: bool,
}

impl Default for RecognizeOptions {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            use_angle_cls: true,
            use_gpu: false,
        }
    }
}

impl RecognizeOptions {
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Reject options that cannot be passed to the engine verbatim.
    ///
    /// The language code ends up as a process argument, so it is limited to
    /// ASCII alphanumerics, `_` and `-`, and may not start with `-`.
    pub fn validate(&self) -> Result<(), RecognizeError> {
        if self.lang.is_empty() {
            return Err(RecognizeError::InvalidOptions(
                "language code must not be empty".to_string(),
            ));
        }
        if self.lang.len() > 32
            || self.lang.starts_with('-')
            || !self
                .lang
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(RecognizeError::InvalidOptions(format!(
                "invalid language code: {:?}",
                self.lang
            )));
        }
        Ok(())
    }
}

/// One detected text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedLine {
    pub text: String,
    pub confidence: f32,
    /// Corner points, clockwise from top-left.
    pub bbox: [[f32; 2]; 4],
}

/// Everything the engine produced for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionOutput {
    /// Verbatim engine stdout.
    pub raw: String,
    pub lines: Vec<RecognizedLine>,
}

impl RecognitionOutput {
    /// Build an output from raw engine stdout, parsing whatever detections it contains.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let lines = super::parser::parse_lines(&raw);
        Self { raw, lines }
    }

    /// Recognised text, one detection per line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.text.trim().is_empty())
    }
}

/// Errors that can occur while running the recognition engine.
#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("Failed to spawn recognizer process: {0}")]
    SpawnFailed(String),

    #[error("Recognizer returned error: {0}")]
    CliError(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Image not found: {0}")]
    MissingImage(String),

    #[error("Invalid recognize options: {0}")]
    InvalidOptions(String),
}
