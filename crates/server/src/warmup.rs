// crates/server/src/warmup.rs
//! Model warm-up: run the engine once per language before serving so the
//! first real request does not pay for model download and load.

use std::path::Path;
use std::time::Instant;

use inferbox_core::{RecognizeOptions, Recognizer};

/// Recognize `image` once per language in `langs`.
///
/// Failures are logged and skipped; warm-up never blocks startup.
/// Returns how many languages warmed up successfully.
pub async fn warm_up(
    recognizer: &dyn Recognizer,
    image: &Path,
    langs: &[String],
    defaults: &RecognizeOptions,
) -> usize {
    let mut warmed = 0;
    for lang in langs {
        let options = defaults.clone().with_lang(lang.clone());
        let start = Instant::now();
        match recognizer.recognize(image, &options).await {
            Ok(output) => {
                warmed += 1;
                tracing::info!(
                    lang = %lang,
                    detections = output.lines.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Model warmed up"
                );
            }
            Err(e) => {
                tracing::warn!(lang = %lang, error = %e, "Model warm-up failed (non-fatal)");
            }
        }
    }
    warmed
}
