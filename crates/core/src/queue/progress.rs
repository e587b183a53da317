//! Periodic download progress logging for the active job.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::config::ProgressConfig;
use crate::torrent_client::TorrentHandle;

const MIB: f64 = 1024.0 * 1024.0;

/// One progress sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub speed_bytes_per_sec: u64,
    pub remaining_bytes: f64,
    pub eta_secs: f64,
}

/// Running estimate of bytes left to download.
///
/// Each tick subtracts `rate * smoothing_factor` from the remaining size.
/// The estimate is never clamped and may go negative.
#[derive(Debug, Clone)]
pub struct ProgressEstimate {
    remaining_bytes: f64,
    smoothing_factor: f64,
}

impl ProgressEstimate {
    pub fn new(total_bytes: u64, smoothing_factor: f64) -> Self {
        Self {
            remaining_bytes: total_bytes as f64,
            smoothing_factor,
        }
    }

    pub fn remaining_bytes(&self) -> f64 {
        self.remaining_bytes
    }

    /// Applies one sampled rate. Returns `None` while nothing is flowing.
    pub fn tick(&mut self, rate_bytes_per_sec: u64) -> Option<ProgressSample> {
        let rate = rate_bytes_per_sec as f64;
        self.remaining_bytes -= rate * self.smoothing_factor;

        if rate_bytes_per_sec == 0 {
            return None;
        }

        Some(ProgressSample {
            speed_bytes_per_sec: rate_bytes_per_sec,
            remaining_bytes: self.remaining_bytes,
            eta_secs: self.remaining_bytes / rate,
        })
    }
}

/// Handle to a running progress task. Dropping it stops the task.
pub struct ProgressNotifier {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl ProgressNotifier {
    /// Spawns the sampling task for a torrent.
    pub fn start(
        info_hash: &str,
        handle: Arc<dyn TorrentHandle>,
        total_bytes: u64,
        config: &ProgressConfig,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let period = Duration::from_secs(config.interval_secs);
        let mut estimate = ProgressEstimate::new(total_bytes, config.smoothing_factor);
        let info_hash = info_hash.to_string();

        info!(
            info_hash = %info_hash,
            "Total size: {:.2} MB",
            total_bytes as f64 / MIB
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!(info_hash = %info_hash, "Progress notifier stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Some(sample) = estimate.tick(handle.download_speed()) {
                            info!(
                                info_hash = %info_hash,
                                "Current speed: {:.2} MB/s, Size remaining: {:.2} MB, ETA: {:.2} seconds",
                                sample.speed_bytes_per_sec as f64 / MIB,
                                sample.remaining_bytes / MIB,
                                sample.eta_secs
                            );
                        }
                    }
                }
            }
        });

        Self { shutdown_tx, task }
    }

    /// Signals the task to stop. Safe to call more than once.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ProgressNotifier {
    fn drop(&mut self) {
        self.stop();
    }
}
