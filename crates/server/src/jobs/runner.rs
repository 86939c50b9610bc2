// crates/server/src/jobs/runner.rs
//! Central job runner that owns every recognition job.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use inferbox_core::RecognitionOutput;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use super::state::JobState;
use super::types::{CancelError, JobId, JobProgress};
use crate::metrics;

type CancelMap = Arc<Mutex<HashMap<JobId, oneshot::Sender<()>>>>;

/// Registry of recognition jobs keyed by `JobId`.
///
/// Thread-safe; share it behind an `Arc`. Call `start_job` to spawn work,
/// `get_job` to poll it, and `subscribe` for SSE-compatible updates.
pub struct JobRunner {
    next_id: AtomicU64,
    jobs: RwLock<HashMap<JobId, Arc<JobState>>>,
    cancels: CancelMap,
    global_tx: broadcast::Sender<JobProgress>,
}

impl JobRunner {
    /// Create a new job runner.
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(256);
        Self {
            next_id: AtomicU64::new(1),
            jobs: RwLock::new(HashMap::new()),
            cancels: Arc::new(Mutex::new(HashMap::new())),
            global_tx,
        }
    }

    /// Start a new background job and return its id immediately.
    ///
    /// `f` receives the job's `JobState` (to record the staged upload path)
    /// and resolves to the engine output or an error message. If the job is
    /// cancelled the future is dropped, which stops the engine process.
    /// Any staged file is removed once the job reaches a terminal state.
    pub fn start_job<F, Fut>(&self, job_type: impl Into<String>, lang: impl Into<String>, f: F) -> JobId
    where
        F: FnOnce(Arc<JobState>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<RecognitionOutput, String>> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let state = Arc::new(JobState::new(
            id,
            job_type.into(),
            lang.into(),
            self.global_tx.clone(),
        ));

        match self.jobs.write() {
            Ok(mut jobs) => {
                jobs.insert(id, Arc::clone(&state));
            }
            Err(e) => tracing::error!("RwLock poisoned writing jobs map: {e}"),
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        match self.cancels.lock() {
            Ok(mut cancels) => {
                cancels.insert(id, cancel_tx);
            }
            Err(e) => tracing::error!("Mutex poisoned writing cancel map: {e}"),
        }

        metrics::record_job_submitted();
        tracing::info!(job_id = id, lang = %state.lang(), "job submitted");

        let cancels = Arc::clone(&self.cancels);
        tokio::spawn(async move {
            let started = Instant::now();
            if state.set_running() {
                tokio::select! {
                    res = f(Arc::clone(&state)) => match res {
                        Ok(output) => {
                            tracing::info!(job_id = id, detections = output.lines.len(), "job completed");
                            state.complete(output);
                        }
                        Err(e) => {
                            tracing::warn!(job_id = id, error = %e, "job failed");
                            state.fail(e);
                        }
                    },
                    _ = cancel_rx => {
                        tracing::info!(job_id = id, "job cancelled while running");
                        state.cancel();
                    }
                }
            }

            match cancels.lock() {
                Ok(mut cancels) => {
                    cancels.remove(&id);
                }
                Err(e) => tracing::error!("Mutex poisoned clearing cancel map: {e}"),
            }
            if let Some(path) = state.take_staged() {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::debug!(job_id = id, path = %path.display(), error = %e, "staged file not removed");
                }
            }
            metrics::record_job_finished(state.status().as_str(), started.elapsed());
        });

        id
    }

    /// Cancel a pending or running job.
    pub fn cancel(&self, id: JobId) -> Result<(), CancelError> {
        let state = self.state(id).ok_or(CancelError::NotFound(id))?;
        if !state.cancel() {
            return Err(CancelError::AlreadyFinished {
                id,
                status: state.status().as_str(),
            });
        }

        let sender = match self.cancels.lock() {
            Ok(mut cancels) => cancels.remove(&id),
            Err(e) => {
                tracing::error!("Mutex poisoned reading cancel map: {e}");
                None
            }
        };
        if let Some(tx) = sender {
            // The task may already be past its select; that is fine.
            let _ = tx.send(());
        }
        tracing::info!(job_id = id, "job cancelled");
        Ok(())
    }

    /// Subscribe to all job progress updates (for SSE streaming).
    pub fn subscribe(&self) -> broadcast::Receiver<JobProgress> {
        self.global_tx.subscribe()
    }

    /// Get current status of a specific job.
    pub fn get_job(&self, id: JobId) -> Option<JobProgress> {
        self.state(id).map(|s| s.snapshot())
    }

    /// Shared state of a specific job.
    pub fn state(&self, id: JobId) -> Option<Arc<JobState>> {
        match self.jobs.read() {
            Ok(jobs) => jobs.get(&id).cloned(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                None
            }
        }
    }

    /// Every tracked job, newest first.
    pub fn jobs(&self) -> Vec<JobProgress> {
        let mut all: Vec<JobProgress> = match self.jobs.read() {
            Ok(jobs) => jobs.values().map(|s| s.snapshot()).collect(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs: {e}");
                Vec::new()
            }
        };
        all.sort_by(|a, b| b.job_id.cmp(&a.job_id));
        all
    }

    /// Get all active (non-terminal) jobs.
    pub fn active_jobs(&self) -> Vec<JobProgress> {
        match self.jobs.read() {
            Ok(jobs) => jobs
                .values()
                .filter(|s| !s.status().is_terminal())
                .map(|s| s.snapshot())
                .collect(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs: {e}");
                Vec::new()
            }
        }
    }

    /// Drop finished jobs whose result has been available for longer than `ttl`.
    /// Returns how many were removed.
    pub fn purge_expired(&self, ttl: Duration) -> usize {
        match self.jobs.write() {
            Ok(mut jobs) => {
                let before = jobs.len();
                jobs.retain(|_, s| s.finished_elapsed().map_or(true, |age| age < ttl));
                before - jobs.len()
            }
            Err(e) => {
                tracing::error!("RwLock poisoned purging jobs: {e}");
                0
            }
        }
    }

    /// Spawn a background loop that purges expired jobs every `every`.
    pub fn spawn_sweeper(self: &Arc<Self>, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                let removed = runner.purge_expired(ttl);
                if removed > 0 {
                    tracing::debug!(removed, "purged expired jobs");
                }
            }
        })
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
