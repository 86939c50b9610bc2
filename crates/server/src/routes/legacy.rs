// crates/server/src/routes/legacy.rs
//! Single-slot submit/poll endpoints kept for existing clients.
//!
//! - POST /infer - Stage the upload at the fixed path, clear the slot, start recognition
//! - POST /infer/{lang} - Recognize with the language in the path and answer
//!   with the per-line result, without touching the slot
//! - GET /get - Current slot value
//!
//! There is no job identifier for `/infer`: overlapping submissions share one
//! image path and one result, and whichever recognition finishes last wins.
//! `/api/jobs` is the race-free alternative.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use inferbox_core::RecognizeOptions;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::routes::params::OptionsQuery;
use crate::routes::recognize::{recognize_now, RecognizeResponse};
use crate::state::AppState;
use crate::upload::ImageUpload;

/// POST /infer - Submit an image to the shared slot.
///
/// Returns the slot's value right after clearing it, which is empty unless
/// a previous submission's task finished in between.
async fn infer(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OptionsQuery>,
    upload: ImageUpload,
) -> ApiResult<String> {
    let options = query.resolve(&state.defaults)?;
    submit(&state, options, upload).await
}

/// POST /infer/{lang} - Recognize synchronously in the path's language.
///
/// Each call stages its own scratch file, so concurrent calls never see each
/// other's image.
async fn infer_lang(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
    Query(query): Query<OptionsQuery>,
    upload: ImageUpload,
) -> ApiResult<Json<RecognizeResponse>> {
    let query = OptionsQuery {
        lang: Some(lang),
        ..query
    };
    let options = query.resolve(&state.defaults)?;
    recognize_now(&state, options, upload).await.map(Json)
}

/// GET /get - Poll the shared slot. Never blocks.
async fn poll(State(state): State<Arc<AppState>>) -> String {
    state.slot.get()
}

async fn submit(
    state: &Arc<AppState>,
    options: RecognizeOptions,
    upload: ImageUpload,
) -> ApiResult<String> {
    let path = state.staging.legacy_path().to_path_buf();
    state
        .staging
        .write(&path, &upload.bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to write {}: {e}", path.display())))?;

    state.slot.clear();
    metrics::record_legacy_submission();
    tracing::info!(
        lang = %options.lang,
        bytes = upload.bytes.len(),
        file = upload.file_name.as_deref().unwrap_or("-"),
        "legacy inference submitted"
    );

    let recognizer = Arc::clone(&state.recognizer);
    let slot = Arc::clone(&state.slot);
    tokio::spawn(async move {
        match recognizer.recognize(&path, &options).await {
            Ok(output) => slot.set(output.raw),
            Err(e) => tracing::warn!(error = %e, "legacy inference failed"),
        }
    });

    Ok(state.slot.get())
}

/// Build the legacy router. Mounted at the root, not under `/api`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/infer", post(infer))
        .route("/infer/{lang}", post(infer_lang))
        .route("/get", get(poll))
}
