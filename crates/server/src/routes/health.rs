// crates/server/src/routes/health.rs
//! Health check endpoint for the API.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Response for the health check endpoint.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub recognizer: String,
    pub active_jobs: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthQuery {
    /// Also probe the engine binary.
    #[serde(default)]
    pub check: bool,
}

/// GET /api/health - Health check endpoint.
///
/// Returns server status, version, and uptime. With `?check=true` the
/// recognizer is probed as well and a failure reports `degraded`.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HealthQuery>,
) -> Json<HealthResponse> {
    let status = if query.check {
        match state.recognizer.health_check().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(error = %e, recognizer = state.recognizer.name(), "Recognizer health check failed");
                "degraded"
            }
        }
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        recognizer: state.recognizer.name().to_string(),
        active_jobs: state.jobs.active_jobs().len(),
    })
}

/// Create the health routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
