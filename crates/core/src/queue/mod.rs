//! Single-worker download queue.
//!
//! Uploaded descriptors are queued in FIFO order and processed one at a time:
//!
//! 1. The engine resolves the descriptor into a torrent.
//! 2. The torrent is classified once as a show or a movie.
//! 3. Every eligible file is placed concurrently.
//! 4. The uploader receives a [`JobResponse`] and the next job starts.
//!
//! A rejected descriptor, a failed file or a panicking job all release the
//! active slot.

mod config;
mod job;
mod progress;
mod scheduler;
mod types;

pub use config::{ProgressConfig, QueueConfig};
pub use job::JobRunner;
pub use progress::{ProgressEstimate, ProgressNotifier, ProgressSample};
pub use scheduler::DownloadQueue;
pub use types::{
    ActiveJob, FileTally, JobError, JobOutcome, JobPhase, JobRecord, JobResponse, JobStatus,
    PendingJob, QueueCounters, QueueStatus, QueuedJob, FAILED_MESSAGE, REJECTED_MESSAGE,
};
