// crates/server/src/jobs/types.rs
//! Types for the recognition job registry.

use inferbox_core::RecognizedLine;
use serde::Serialize;
use thiserror::Error;

/// Unique identifier for a submitted job.
pub type JobId = u64;

/// Status of a recognition job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending = 0,
    Running = 1,
    Completed = 2,
    Cancelled = 3,
    Failed = 4,
}

impl JobStatus {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => JobStatus::Pending,
            1 => JobStatus::Running,
            2 => JobStatus::Completed,
            3 => JobStatus::Cancelled,
            _ => JobStatus::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
        }
    }

    /// Completed, cancelled and failed jobs never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Failed
        )
    }
}

/// Why a cancellation request was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CancelError {
    #[error("job {0} does not exist")]
    NotFound(JobId),

    #[error("job {id} already {status}")]
    AlreadyFinished { id: JobId, status: &'static str },
}

/// Point-in-time view of a job, served by the API and sent via SSE.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub job_id: JobId,
    pub job_type: String,
    pub status: String,
    pub lang: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<RecognizedLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    pub timestamp: String,
}
