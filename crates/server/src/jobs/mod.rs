// crates/server/src/jobs/mod.rs
//! Recognition job registry.
//!
//! Provides:
//! - `JobRunner` - spawns one task per upload and tracks it by `JobId`
//! - `JobState` - per-job status, outcome and staged upload path
//! - `JobProgress` - snapshot served by the API and the SSE stream

pub mod runner;
pub mod state;
pub mod types;

pub use runner::JobRunner;
pub use state::JobState;
pub use types::{CancelError, JobId, JobProgress, JobStatus};
