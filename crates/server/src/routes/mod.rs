//! API route handlers for the inferbox server.

pub mod health;
pub mod jobs;
pub mod legacy;
pub mod metrics;
pub mod params;
pub mod recognize;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - POST /infer - Legacy submit into the shared slot
/// - POST /infer/{lang} - Legacy synchronous recognition, language in the path
/// - GET  /get - Legacy poll of the shared slot
/// - GET  /metrics - Prometheus metrics
/// - GET  /api/health - Health check
/// - POST /api/recognize - Synchronous recognition
/// - POST /api/jobs - Submit a recognition job
/// - GET  /api/jobs - List jobs
/// - GET  /api/jobs/stream - SSE stream of job progress
/// - GET  /api/jobs/{id} - Job snapshot
/// - GET  /api/jobs/{id}/text - Recognised text of a completed job
/// - DELETE /api/jobs/{id} - Cancel a job
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(legacy::router())
        .merge(metrics::router())
        .nest("/api", health::router())
        .nest("/api", recognize::router())
        .nest("/api", jobs::router())
        .with_state(state)
}
