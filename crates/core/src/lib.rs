// crates/core/src/lib.rs
//! Engine-facing half of inferbox: the `Recognizer` abstraction, the
//! PaddleOCR CLI implementation and its output parser.

pub mod recognizer;

pub use recognizer::{
    PaddleCliRecognizer, RecognitionOutput, RecognizeError, RecognizeOptions, RecognizedLine,
    Recognizer,
};
