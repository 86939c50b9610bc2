// crates/core/src/recognizer/mod.rs
//! OCR engine integration.
//!
//! Provides the `Recognizer` trait and the PaddleOCR CLI implementation that
//! the server runs for every submitted image.

pub mod paddle_cli;
pub mod parser;
pub mod provider;
pub mod types;

pub use paddle_cli::PaddleCliRecognizer;
pub use provider::Recognizer;
pub use types::{RecognitionOutput, RecognizeError, RecognizeOptions, RecognizedLine};
