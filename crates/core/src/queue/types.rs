//! Types for the download queue.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::placer::PlacerError;
use crate::torrent_client::TorrentClientError;

/// Response text for a descriptor that could not be resolved.
pub const REJECTED_MESSAGE: &str = "Invalid torrent file. Please check the file and try again.";

/// Response text for a job where at least one file failed to place.
pub const FAILED_MESSAGE: &str = "An error occurred while processing the torrent.";

/// Errors that end a job or one of its files.
#[derive(Debug, Error)]
pub enum JobError {
    /// The engine could not turn the descriptor into a torrent.
    #[error("{0}")]
    DescriptorInvalid(#[source] TorrentClientError),

    /// The engine could not open a byte stream for a contained file.
    #[error("Could not open stream for {name}: {source}")]
    StreamUnavailable {
        name: String,
        #[source]
        source: TorrentClientError,
    },

    /// Directory creation or the file transfer failed.
    #[error(transparent)]
    Placement(#[from] PlacerError),

    /// The job task panicked.
    #[error("Job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Terminal status a job ends with when this error reaches it.
    pub fn status(&self) -> JobStatus {
        match self {
            JobError::DescriptorInvalid(_) => JobStatus::Rejected,
            _ => JobStatus::Failed,
        }
    }
}

/// Terminal status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    /// Descriptor was invalid; the caller is at fault.
    Rejected,
    /// One or more files could not be placed.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Succeeded => "succeeded",
            JobStatus::Rejected => "rejected",
            JobStatus::Failed => "failed",
        }
    }

    /// HTTP status code reported to the uploader.
    pub fn http_status(&self) -> u16 {
        match self {
            JobStatus::Succeeded => 200,
            JobStatus::Rejected => 400,
            JobStatus::Failed => 500,
        }
    }
}

/// Outcome delivered to whoever enqueued the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
}

impl JobResponse {
    pub fn succeeded(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Succeeded,
            message: message.into(),
        }
    }

    pub fn rejected(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Rejected,
            message: REJECTED_MESSAGE.to_string(),
        }
    }

    pub fn failed(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Failed,
            message: FAILED_MESSAGE.to_string(),
        }
    }
}

/// A job waiting for the active slot.
#[derive(Debug)]
pub struct QueuedJob {
    pub id: String,
    pub descriptor: PathBuf,
    pub queued_at: DateTime<Utc>,
    responder: oneshot::Sender<JobResponse>,
}

impl QueuedJob {
    /// Creates a job and the receiver its response will arrive on.
    pub fn new(descriptor: impl Into<PathBuf>) -> (Self, oneshot::Receiver<JobResponse>) {
        let (responder, rx) = oneshot::channel();
        let job = Self {
            id: uuid::Uuid::new_v4().to_string(),
            descriptor: descriptor.into(),
            queued_at: Utc::now(),
            responder,
        };
        (job, rx)
    }

    pub fn summary(&self) -> PendingJob {
        PendingJob {
            id: self.id.clone(),
            descriptor: self.descriptor.clone(),
            queued_at: self.queued_at,
        }
    }

    pub(crate) fn into_parts(self) -> (PendingJob, oneshot::Sender<JobResponse>) {
        let summary = self.summary();
        (summary, self.responder)
    }
}

/// Snapshot of a queued job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingJob {
    pub id: String,
    pub descriptor: PathBuf,
    pub queued_at: DateTime<Utc>,
}

/// What the active job is currently doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum JobPhase {
    Resolving,
    Transferring {
        info_hash: String,
        name: String,
        is_show: bool,
        files_total: usize,
        files_settled: usize,
    },
}

/// The single job holding the active slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveJob {
    pub id: String,
    pub descriptor: PathBuf,
    pub queued_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    #[serde(flatten)]
    pub phase: JobPhase,
}

/// Per-file tallies for one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTally {
    pub placed: usize,
    pub unmatched: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes_placed: u64,
}

/// Result of running a job to completion.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub response: JobResponse,
    pub info_hash: Option<String>,
    pub name: Option<String>,
    pub files: FileTally,
}

/// History entry for a finished job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub descriptor: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: JobStatus,
    pub message: String,
    pub files: FileTally,
    pub queued_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounters {
    pub enqueued: u64,
    pub succeeded: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl QueueCounters {
    pub(crate) fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Succeeded => self.succeeded += 1,
            JobStatus::Rejected => self.rejected += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }
}

/// Snapshot of the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<ActiveJob>,
    pub pending: Vec<PendingJob>,
    /// Most recent first.
    pub history: Vec<JobRecord>,
    pub counters: QueueCounters,
}

impl QueueStatus {
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }
}
