// crates/server/src/main.rs
//! Inferbox server binary.
//!
//! Loads `.env`, parses configuration, optionally warms up the engine's
//! models, then serves the HTTP API until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use inferbox_core::Recognizer;
use inferbox_server::{create_app, init_metrics, warmup, AppState, Config, JobRunner, Staging};
use tracing_subscriber::EnvFilter;

/// How often finished jobs are checked for expiry.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; HTTP_HOST/HTTP_PORT may come from the real environment.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,inferbox_server=info,inferbox_core=info".into()),
        )
        .init();

    let config = Config::parse();
    let addr = config.bind_addr()?;

    init_metrics();

    let recognizer = Arc::new(config.recognizer());
    if let Err(e) = recognizer.health_check().await {
        tracing::warn!(bin = %config.paddleocr_bin, error = %e, "PaddleOCR not usable yet; requests will fail until it is");
    }

    let staging = Staging::new(config.stage_dir(), &config.legacy_image);
    staging
        .ensure_dirs()
        .await
        .with_context(|| format!("creating stage dir {}", staging.dir().display()))?;

    let defaults = config.default_options();
    if let Some(image) = &config.warmup_image {
        let langs = config.warmup_langs();
        let warmed = warmup::warm_up(recognizer.as_ref(), image, &langs, &defaults).await;
        tracing::info!(warmed, requested = langs.len(), "Warm-up finished");
    }

    let jobs = Arc::new(JobRunner::new());
    let _sweeper = jobs.spawn_sweeper(config.job_ttl(), SWEEP_INTERVAL);

    let state = AppState::with_jobs(recognizer, staging, defaults, jobs);
    let app = create_app(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, stage_dir = %config.stage_dir().display(), "Inferbox listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
