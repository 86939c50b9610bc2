// crates/server/src/jobs/state.rs
//! State tracking for a single recognition job.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use inferbox_core::RecognitionOutput;
use tokio::sync::broadcast;

use super::types::{JobId, JobProgress, JobStatus};

/// Mutable part of a job, written once when the job finishes.
#[derive(Default)]
struct Outcome {
    output: Option<RecognitionOutput>,
    error: Option<String>,
    finished_at: Option<DateTime<Utc>>,
    finished_instant: Option<Instant>,
}

/// State for a single job.
///
/// The status is an atomic so pollers never wait on a writer; the outcome
/// and staged path sit behind `RwLock`s that are never held across `.await`.
/// Once the status is terminal it never changes again.
pub struct JobState {
    id: JobId,
    job_type: String,
    lang: String,
    created_at: DateTime<Utc>,
    status: AtomicU8,
    staged: RwLock<Option<PathBuf>>,
    outcome: RwLock<Outcome>,
    progress_tx: broadcast::Sender<JobProgress>,
}

impl JobState {
    /// Create a pending job that publishes its progress on `progress_tx`.
    pub fn new(
        id: JobId,
        job_type: String,
        lang: String,
        progress_tx: broadcast::Sender<JobProgress>,
    ) -> Self {
        Self {
            id,
            job_type,
            lang,
            created_at: Utc::now(),
            status: AtomicU8::new(JobStatus::Pending as u8),
            staged: RwLock::new(None),
            outcome: RwLock::new(Outcome::default()),
            progress_tx,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn status(&self) -> JobStatus {
        JobStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Record where the job's upload was written so it can be removed later.
    pub fn set_staged(&self, path: PathBuf) {
        match self.staged.write() {
            Ok(mut guard) => *guard = Some(path),
            Err(e) => tracing::error!("RwLock poisoned writing staged path: {e}"),
        }
    }

    /// Take the staged path, leaving `None` behind.
    pub fn take_staged(&self) -> Option<PathBuf> {
        match self.staged.write() {
            Ok(mut guard) => guard.take(),
            Err(e) => {
                tracing::error!("RwLock poisoned taking staged path: {e}");
                None
            }
        }
    }

    /// Transition Pending → Running. Returns false if the job already left Pending.
    pub fn set_running(&self) -> bool {
        let moved = self
            .status
            .compare_exchange(
                JobStatus::Pending as u8,
                JobStatus::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if moved {
            self.broadcast_progress();
        }
        moved
    }

    /// Mark the job as completed with the engine's output.
    pub fn complete(&self, output: RecognitionOutput) -> bool {
        self.finish(JobStatus::Completed, Some(output), None)
    }

    /// Mark the job as failed with an error message.
    pub fn fail(&self, error: impl Into<String>) -> bool {
        self.finish(JobStatus::Failed, None, Some(error.into()))
    }

    /// Mark the job as cancelled.
    pub fn cancel(&self) -> bool {
        self.finish(JobStatus::Cancelled, None, Some("cancelled".to_string()))
    }

    /// Move to a terminal status unless the job already reached one.
    fn finish(
        &self,
        to: JobStatus,
        output: Option<RecognitionOutput>,
        error: Option<String>,
    ) -> bool {
        // Hold the outcome lock across the status flip so a reader that sees a
        // terminal status also sees the outcome that goes with it.
        let mut guard = match self.outcome.write() {
            Ok(g) => g,
            Err(e) => {
                tracing::error!("RwLock poisoned writing job outcome: {e}");
                e.into_inner()
            }
        };

        let mut current = self.status.load(Ordering::Acquire);
        loop {
            if JobStatus::from_u8(current).is_terminal() {
                return false;
            }
            match self.status.compare_exchange(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        guard.output = output;
        guard.error = error;
        guard.finished_at = Some(Utc::now());
        guard.finished_instant = Some(Instant::now());
        drop(guard);

        self.broadcast_progress();
        true
    }

    /// Time since the job reached a terminal state, `None` while it is live.
    pub fn finished_elapsed(&self) -> Option<Duration> {
        self.read_outcome(|_, g| g.finished_instant.map(|t| t.elapsed()))
    }

    /// Engine output, present only for completed jobs.
    pub fn output(&self) -> Option<RecognitionOutput> {
        self.read_outcome(|_, g| g.output.clone())
    }

    /// Status, output and error read together, so a terminal status always
    /// comes with its outcome.
    pub fn outcome(&self) -> (JobStatus, Option<RecognitionOutput>, Option<String>) {
        self.read_outcome(|status, g| (status, g.output.clone(), g.error.clone()))
    }

    /// Get a snapshot of the current job state.
    pub fn snapshot(&self) -> JobProgress {
        let (status, output, error, finished_at) =
            self.read_outcome(|status, g| (status, g.output.clone(), g.error.clone(), g.finished_at));
        JobProgress {
            job_id: self.id,
            job_type: self.job_type.clone(),
            status: status.as_str().to_string(),
            lang: self.lang.clone(),
            text: output.as_ref().map(|o| o.text()),
            raw: output.as_ref().map(|o| o.raw.clone()),
            lines: output.map(|o| o.lines),
            error,
            created_at: self.created_at.to_rfc3339(),
            finished_at: finished_at.map(|t| t.to_rfc3339()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn read_outcome<T>(&self, f: impl FnOnce(JobStatus, &Outcome) -> T) -> T {
        match self.outcome.read() {
            Ok(g) => f(self.status(), &g),
            Err(e) => {
                tracing::error!("RwLock poisoned reading job outcome: {e}");
                let g = e.into_inner();
                f(self.status(), &g)
            }
        }
    }

    fn broadcast_progress(&self) {
        // No subscribers is fine.
        let _ = self.progress_tx.send(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state(id: JobId) -> (JobState, broadcast::Receiver<JobProgress>) {
        let (tx, rx) = broadcast::channel(16);
        (JobState::new(id, "ocr".into(), "en".into(), tx), rx)
    }

    #[test]
    fn test_job_state_lifecycle() {
        let (state, _rx) = new_state(1);

        let snap = state.snapshot();
        assert_eq!(snap.status, "pending");
        assert_eq!(snap.lang, "en");
        assert!(snap.finished_at.is_none());
        assert!(state.finished_elapsed().is_none());

        assert!(state.set_running());
        assert_eq!(state.snapshot().status, "running");
        assert!(!state.set_running());

        assert!(state.complete(RecognitionOutput::from_raw("HELLO")));
        let (status, output, error) = state.outcome();
        assert_eq!(status, JobStatus::Completed);
        assert_eq!(output.map(|o| o.raw).as_deref(), Some("HELLO"));
        assert!(error.is_none());
        let snap = state.snapshot();
        assert_eq!(snap.status, "completed");
        assert_eq!(snap.raw.as_deref(), Some("HELLO"));
        assert!(snap.finished_at.is_some());
        assert!(state.finished_elapsed().is_some());
    }

    #[test]
    fn test_job_state_failure() {
        let (state, _rx) = new_state(2);
        state.set_running();
        assert!(state.fail("Recognizer returned error: boom"));

        let snap = state.snapshot();
        assert_eq!(snap.status, "failed");
        assert_eq!(snap.error.as_deref(), Some("Recognizer returned error: boom"));
        assert!(snap.text.is_none());
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let (state, _rx) = new_state(3);
        state.set_running();
        assert!(state.cancel());

        // A late completion from the superseded task must not overwrite the cancel.
        assert!(!state.complete(RecognitionOutput::from_raw("late")));
        assert!(!state.fail("late"));
        assert_eq!(state.status(), JobStatus::Cancelled);
        assert!(state.output().is_none());
    }

    #[test]
    fn test_pending_job_can_be_cancelled() {
        let (state, _rx) = new_state(4);
        assert!(state.cancel());
        assert!(!state.set_running());
        assert_eq!(state.snapshot().status, "cancelled");
    }

    #[test]
    fn test_staged_path_is_taken_once() {
        let (state, _rx) = new_state(5);
        state.set_staged(PathBuf::from("/tmp/job-5.png"));
        assert_eq!(state.take_staged(), Some(PathBuf::from("/tmp/job-5.png")));
        assert_eq!(state.take_staged(), None);
    }

    #[tokio::test]
    async fn test_job_state_broadcasts_transitions() {
        let (state, mut rx) = new_state(6);

        state.set_running();
        let progress = rx.recv().await.unwrap();
        assert_eq!(progress.status, "running");
        assert_eq!(progress.job_id, 6);

        state.complete(RecognitionOutput::default());
        assert_eq!(rx.recv().await.unwrap().status, "completed");
    }
}
