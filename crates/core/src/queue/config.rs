//! Queue and progress configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the download queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Deadline for resolving a descriptor into torrent metadata (seconds).
    /// Unset waits forever.
    #[serde(default)]
    pub resolve_timeout_secs: Option<u64>,

    /// Deadline for streaming one file into the library (seconds).
    /// Unset waits forever.
    #[serde(default)]
    pub transfer_timeout_secs: Option<u64>,

    /// Number of finished jobs kept for the status endpoint.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    50
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_secs: None,
            transfer_timeout_secs: None,
            history_limit: default_history_limit(),
        }
    }
}

/// Configuration for the per-job progress notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Seconds between progress samples.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Multiplier applied to the sampled rate when decrementing the
    /// remaining-size estimate on each tick.
    #[serde(default = "default_smoothing_factor")]
    pub smoothing_factor: f64,
}

fn default_interval() -> u64 {
    10
}

fn default_smoothing_factor() -> f64 {
    9.5
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            smoothing_factor: default_smoothing_factor(),
        }
    }
}
