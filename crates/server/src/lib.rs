// crates/server/src/lib.rs
//! Inferbox server library.
//!
//! Axum HTTP front-end for the PaddleOCR command-line engine: the legacy
//! single-slot `/infer` + `/get` pair, a job registry under `/api/jobs`,
//! synchronous recognition, health and Prometheus metrics.

pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod routes;
pub mod slot;
pub mod staging;
pub mod state;
pub mod upload;
pub mod warmup;

pub use config::Config;
pub use error::*;
pub use jobs::{JobProgress, JobRunner, JobStatus};
pub use metrics::{init_metrics, render_metrics};
pub use routes::api_routes;
pub use slot::LatestSlot;
pub use staging::Staging;
pub use state::AppState;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - Legacy, job, recognize, health and metrics routes
/// - A request body cap of `max_upload_bytes`
/// - CORS (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
