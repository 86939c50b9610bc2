// crates/server/src/routes/jobs.rs
//! API routes for recognition jobs.
//!
//! - POST /jobs - Submit an image, returns 202 with the new job
//! - GET /jobs - List tracked jobs, newest first (`?active=true` for live ones only)
//! - GET /jobs/stream - SSE stream of job progress updates
//! - GET /jobs/{id} - Job snapshot
//! - GET /jobs/{id}/text - Recognised text of a completed job
//! - DELETE /jobs/{id} - Cancel a pending or running job

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::error::{ApiError, ApiResult};
use crate::jobs::{JobId, JobProgress, JobState, JobStatus};
use crate::routes::params::OptionsQuery;
use crate::staging::Staging;
use crate::state::AppState;
use crate::upload::ImageUpload;

/// POST /api/jobs - Submit an image for recognition.
async fn submit_job(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OptionsQuery>,
    upload: ImageUpload,
) -> ApiResult<(StatusCode, Json<JobProgress>)> {
    let options = query.resolve(&state.defaults)?;
    let recognizer = Arc::clone(&state.recognizer);
    let staging = Arc::clone(&state.staging);
    let ImageUpload { bytes, file_name } = upload;

    let id = state
        .jobs
        .start_job("ocr", options.lang.clone(), move |job| async move {
            let path = stage_upload(staging, job, bytes).await?;
            recognizer
                .recognize(&path, &options)
                .await
                .map_err(|e| e.to_string())
        });
    tracing::debug!(job_id = id, file = file_name.as_deref().unwrap_or("-"), "upload accepted");

    let progress = state
        .jobs
        .get_job(id)
        .ok_or_else(|| ApiError::Internal(format!("job {id} vanished after submission")))?;
    Ok((StatusCode::ACCEPTED, Json(progress)))
}

/// Write a job's upload to its staged path.
///
/// The write runs in its own task so a cancel cannot abandon it halfway. If
/// the job went terminal meanwhile, the runner's cleanup may already have
/// run, so the file is removed here instead.
async fn stage_upload(
    staging: Arc<Staging>,
    job: Arc<JobState>,
    bytes: Bytes,
) -> Result<PathBuf, String> {
    let path = staging.job_path(job.id(), &bytes);
    job.set_staged(path.clone());

    let write = tokio::spawn({
        let path = path.clone();
        async move {
            let written = staging.write(&path, &bytes).await;
            if job.status().is_terminal() {
                staging.remove(&path).await;
            }
            written
        }
    });
    match write.await {
        Ok(Ok(())) => Ok(path),
        Ok(Err(e)) => Err(format!("failed to stage upload: {e}")),
        Err(e) => Err(format!("staging task failed: {e}")),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    active: bool,
}

/// GET /api/jobs - List jobs.
async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<JobProgress>> {
    if query.active {
        Json(state.jobs.active_jobs())
    } else {
        Json(state.jobs.jobs())
    }
}

/// GET /api/jobs/stream - SSE stream of all job progress updates.
async fn stream_jobs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.jobs.subscribe();

    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(progress) => match serde_json::to_string(&progress) {
                    Ok(json) => {
                        yield Ok(Event::default().event("progress").data(json));
                    }
                    Err(e) => {
                        tracing::warn!(job_id = progress.job_id, error = %e, "unserialisable job progress");
                        continue;
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "job stream subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /api/jobs/{id} - Current snapshot of one job.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<JobId>,
) -> ApiResult<Json<JobProgress>> {
    state
        .jobs
        .get_job(id)
        .map(Json)
        .ok_or(ApiError::JobNotFound(id))
}

/// GET /api/jobs/{id}/text - Plain text of a completed job.
///
/// Empty when the image had no text; 409 while the job is still live and
/// 422 once it failed or was cancelled.
async fn job_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<JobId>,
) -> ApiResult<String> {
    let job = state.jobs.state(id).ok_or(ApiError::JobNotFound(id))?;
    match job.outcome() {
        (JobStatus::Completed, output, _) => Ok(output.map(|o| o.text()).unwrap_or_default()),
        (status @ (JobStatus::Pending | JobStatus::Running), _, _) => {
            Err(ApiError::JobNotFinished {
                id,
                status: status.as_str(),
            })
        }
        (status @ (JobStatus::Failed | JobStatus::Cancelled), _, error) => {
            Err(ApiError::JobFailed {
                id,
                status: status.as_str(),
                reason: error.unwrap_or_default(),
            })
        }
    }
}

/// DELETE /api/jobs/{id} - Cancel a job.
async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<JobId>,
) -> ApiResult<StatusCode> {
    state.jobs.cancel(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list_jobs).post(submit_job))
        .route("/jobs/stream", get(stream_jobs))
        .route("/jobs/{id}", get(get_job).delete(cancel_job))
        .route("/jobs/{id}/text", get(job_text))
}
