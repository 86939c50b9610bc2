// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use inferbox_core::{RecognizeOptions, Recognizer};

use crate::jobs::JobRunner;
use crate::slot::LatestSlot;
use crate::staging::Staging;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// The OCR engine every endpoint runs.
    pub recognizer: Arc<dyn Recognizer>,
    /// Registry of recognition jobs submitted through `/api/jobs`.
    pub jobs: Arc<JobRunner>,
    /// The single result slot behind `/infer` and `/get`.
    pub slot: Arc<LatestSlot>,
    /// Where uploads are written before recognition.
    pub staging: Arc<Staging>,
    /// Options used when a request leaves them unset.
    pub defaults: RecognizeOptions,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        staging: Staging,
        defaults: RecognizeOptions,
    ) -> Arc<Self> {
        Self::with_jobs(recognizer, staging, defaults, Arc::new(JobRunner::new()))
    }

    /// Like `new`, but sharing an existing job runner (e.g. one with a sweeper attached).
    pub fn with_jobs(
        recognizer: Arc<dyn Recognizer>,
        staging: Staging,
        defaults: RecognizeOptions,
        jobs: Arc<JobRunner>,
    ) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            recognizer,
            jobs,
            slot: Arc::new(LatestSlot::new()),
            staging: Arc::new(staging),
            defaults,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
