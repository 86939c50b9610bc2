// crates/server/src/routes/recognize.rs
//! Synchronous recognition: POST /recognize waits for the engine and returns
//! the result in the response body. The legacy `POST /infer/{lang}` answers
//! the same way through [`recognize_now`].

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use inferbox_core::{RecognizeOptions, RecognizedLine};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::routes::params::OptionsQuery;
use crate::state::AppState;
use crate::upload::ImageUpload;

/// Response for a synchronous recognition.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct RecognizeResponse {
    pub lang: String,
    pub text: String,
    pub lines: Vec<RecognizedLine>,
    pub raw: String,
}

/// POST /api/recognize - Recognize an image and wait for the result.
pub async fn recognize(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OptionsQuery>,
    upload: ImageUpload,
) -> ApiResult<Json<RecognizeResponse>> {
    let options = query.resolve(&state.defaults)?;
    recognize_now(&state, options, upload).await.map(Json)
}

/// Stage `upload` in a scratch file, run the engine and remove the file.
pub(crate) async fn recognize_now(
    state: &AppState,
    options: RecognizeOptions,
    upload: ImageUpload,
) -> ApiResult<RecognizeResponse> {
    let path = state.staging.scratch_path(&upload.bytes);
    if let Err(e) = state.staging.write(&path, &upload.bytes).await {
        state.staging.remove(&path).await;
        return Err(ApiError::Internal(format!(
            "failed to write {}: {e}",
            path.display()
        )));
    }
    tracing::debug!(
        lang = %options.lang,
        bytes = upload.bytes.len(),
        file = upload.file_name.as_deref().unwrap_or("-"),
        "synchronous recognition"
    );

    let start = Instant::now();
    let result = state.recognizer.recognize(&path, &options).await;
    state.staging.remove(&path).await;
    metrics::record_sync_recognition(result.is_ok(), start.elapsed());

    let output = result?;
    Ok(RecognizeResponse {
        lang: options.lang,
        text: output.text(),
        lines: output.lines,
        raw: output.raw,
    })
}

/// Build the recognize router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/recognize", post(recognize))
}
