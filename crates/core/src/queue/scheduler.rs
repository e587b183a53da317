//! Single-worker FIFO scheduler.
//!
//! The queue holds pending jobs and at most one active job. When the active
//! job settles, its response is delivered and the next pending job starts.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::job::JobRunner;
use super::types::{
    ActiveJob, FileTally, JobError, JobOutcome, JobPhase, JobRecord, JobResponse, PendingJob,
    QueueCounters, QueueStatus, QueuedJob,
};
use crate::config::Config;
use crate::metrics::{JOBS_COMPLETED, JOB_DURATION, QUEUE_PENDING};
use crate::notify::Notifier;
use crate::torrent_client::TorrentEngine;

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedJob>,
    active: Option<ActiveJob>,
    /// Most recent first.
    history: VecDeque<JobRecord>,
    counters: QueueCounters,
}

/// FIFO download queue with a single active slot.
pub struct DownloadQueue {
    runner: JobRunner,
    history_limit: usize,
    state: Mutex<QueueState>,
}

impl DownloadQueue {
    pub fn new(runner: JobRunner, history_limit: usize) -> Arc<Self> {
        Arc::new(Self {
            runner,
            history_limit,
            state: Mutex::new(QueueState::default()),
        })
    }

    pub fn from_config(
        engine: Arc<dyn TorrentEngine>,
        notifier: Notifier,
        config: &Config,
    ) -> Arc<Self> {
        Self::new(
            JobRunner::from_config(engine, notifier, config),
            config.queue.history_limit,
        )
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    /// Appends a job and starts it if the queue is idle.
    ///
    /// Returns the number of jobs ahead of it, counting the active one.
    pub fn enqueue(self: &Arc<Self>, job: QueuedJob) -> usize {
        let position = {
            let mut state = self.lock();
            let position = state.pending.len() + usize::from(state.active.is_some());
            debug!(job_id = %job.id, descriptor = %job.descriptor.display(), position, "Job enqueued");
            state.pending.push_back(job);
            state.counters.enqueued += 1;
            QUEUE_PENDING.set(state.pending.len() as i64);
            position
        };

        self.try_advance();
        position
    }

    /// Starts the head of the queue if nothing is active.
    ///
    /// Returns true when a job was started.
    pub fn try_advance(self: &Arc<Self>) -> bool {
        let (job, responder) = {
            let mut state = self.lock();
            if state.active.is_some() {
                return false;
            }
            let Some(next) = state.pending.pop_front() else {
                return false;
            };

            let (job, responder) = next.into_parts();
            state.active = Some(ActiveJob {
                id: job.id.clone(),
                descriptor: job.descriptor.clone(),
                queued_at: job.queued_at,
                started_at: Utc::now(),
                phase: JobPhase::Resolving,
            });
            QUEUE_PENDING.set(state.pending.len() as i64);
            (job, responder)
        };

        info!(job_id = %job.id, descriptor = %job.descriptor.display(), "Job started");

        let queue = Arc::clone(self);
        tokio::spawn(async move {
            queue.execute(job, responder).await;
        });
        true
    }

    /// Runs the job in its own task so a panic still finishes the slot.
    async fn execute(self: Arc<Self>, job: PendingJob, responder: oneshot::Sender<JobResponse>) {
        let started = Instant::now();

        let runner = self.runner.clone();
        let queue = Arc::clone(&self);
        let task_job = job.clone();
        let outcome = tokio::spawn(async move {
            let job_id = task_job.id.clone();
            runner
                .run(&task_job, move |phase| queue.set_phase(&job_id, phase))
                .await
        })
        .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(join_error) => {
                let err = JobError::Panicked(join_error.to_string());
                error!(job_id = %job.id, error = %err, "Job task failed");
                self.runner
                    .notifier()
                    .notify(format!("Error processing torrent: {}", err));
                JobOutcome {
                    response: JobResponse::failed(&job.id),
                    info_hash: None,
                    name: None,
                    files: FileTally::default(),
                }
            }
        };

        self.finish(job, responder, outcome, started);
        self.try_advance();
    }

    fn set_phase(&self, job_id: &str, phase: JobPhase) {
        let mut state = self.lock();
        if let Some(active) = state.active.as_mut().filter(|a| a.id == job_id) {
            active.phase = phase;
        }
    }

    /// Clears the active slot, records history and delivers the response.
    fn finish(
        &self,
        job: PendingJob,
        responder: oneshot::Sender<JobResponse>,
        outcome: JobOutcome,
        started: Instant,
    ) {
        let status = outcome.response.status;
        let record = JobRecord {
            id: job.id.clone(),
            descriptor: job.descriptor,
            info_hash: outcome.info_hash,
            name: outcome.name,
            status,
            message: outcome.response.message.clone(),
            files: outcome.files,
            queued_at: job.queued_at,
            finished_at: Utc::now(),
        };

        {
            let mut state = self.lock();
            state.active = None;
            state.counters.record(status);
            state.history.push_front(record);
            state.history.truncate(self.history_limit);
        }

        JOBS_COMPLETED.with_label_values(&[status.as_str()]).inc();
        JOB_DURATION
            .with_label_values(&[status.as_str()])
            .observe(started.elapsed().as_secs_f64());

        info!(job_id = %job.id, status = status.as_str(), "Job finished");

        if responder.send(outcome.response).is_err() {
            debug!(job_id = %job.id, "Job response receiver dropped");
        }
    }

    /// Snapshot of the active job, pending jobs and recent history.
    pub fn status(&self) -> QueueStatus {
        let state = self.lock();
        QueueStatus {
            active: state.active.clone(),
            pending: state.pending.iter().map(QueuedJob::summary).collect(),
            history: state.history.iter().cloned().collect(),
            counters: state.counters,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placer::LibraryLayout;
    use crate::queue::types::JobStatus;
    use crate::testing::{MockTorrentEngine, RecordingSink};
    use std::time::Duration;
    use tempfile::TempDir;

    fn queue_with(engine: Arc<MockTorrentEngine>, temp: &TempDir, history_limit: usize) -> Arc<DownloadQueue> {
        let layout = LibraryLayout::new(temp.path().join("movies"), temp.path().join("shows"));
        let runner = JobRunner::new(engine, Notifier::new(Arc::new(RecordingSink::new())), layout);
        DownloadQueue::new(runner, history_limit)
    }

    async fn wait_for_resolves(engine: &MockTorrentEngine, count: usize) {
        for _ in 0..200 {
            if engine.resolve_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("engine never saw {} resolves", count);
    }

    #[tokio::test]
    async fn test_enqueue_while_idle_starts_exactly_one() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(MockTorrentEngine::gated());
        for name in ["a", "b", "c"] {
            engine.add_torrent(
                format!("{}.torrent", name),
                name,
                vec![(format!("{}.mkv", name), b"x".to_vec())],
            );
        }
        let queue = queue_with(engine.clone(), &temp, 10);

        let (a, rx_a) = QueuedJob::new("a.torrent");
        let (b, rx_b) = QueuedJob::new("b.torrent");
        let (c, rx_c) = QueuedJob::new("c.torrent");
        let ids = [a.id.clone(), b.id.clone(), c.id.clone()];

        assert_eq!(queue.enqueue(a), 0);
        assert_eq!(queue.enqueue(b), 1);
        assert_eq!(queue.enqueue(c), 2);

        let status = queue.status();
        assert_eq!(status.active.as_ref().map(|a| a.id.as_str()), Some(ids[0].as_str()));
        let pending: Vec<_> = status.pending.iter().map(|p| p.id.clone()).collect();
        assert_eq!(pending, vec![ids[1].clone(), ids[2].clone()]);
        assert!(!queue.try_advance());

        engine.release(3);
        for rx in [rx_a, rx_b, rx_c] {
            assert_eq!(rx.await.unwrap().status, JobStatus::Succeeded);
        }

        assert_eq!(engine.resolved(), vec!["a.torrent", "b.torrent", "c.torrent"]);
        let status = queue.status();
        assert!(status.is_idle());
        assert_eq!(status.counters.enqueued, 3);
        assert_eq!(status.counters.succeeded, 3);
    }

    #[tokio::test]
    async fn test_only_one_job_resolves_at_a_time() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(MockTorrentEngine::gated());
        engine.add_torrent("a.torrent", "a", vec![("a.mkv", b"a".to_vec())]);
        engine.add_torrent("b.torrent", "b", vec![("b.mkv", b"b".to_vec())]);
        let queue = queue_with(engine.clone(), &temp, 10);

        let (a, rx_a) = QueuedJob::new("a.torrent");
        let (b, rx_b) = QueuedJob::new("b.torrent");
        queue.enqueue(a);
        queue.enqueue(b);

        wait_for_resolves(&engine, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(engine.resolve_count(), 1);

        engine.release(1);
        rx_a.await.unwrap();
        wait_for_resolves(&engine, 2).await;

        engine.release(1);
        rx_b.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_job_does_not_block_queue() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(MockTorrentEngine::new());
        engine.add_torrent("good.torrent", "good", vec![("Good.mkv", b"g".to_vec())]);
        let queue = queue_with(engine.clone(), &temp, 10);

        let (bad, rx_bad) = QueuedJob::new("bad.torrent");
        let (good, rx_good) = QueuedJob::new("good.torrent");
        queue.enqueue(bad);
        queue.enqueue(good);

        let bad = rx_bad.await.unwrap();
        assert_eq!(bad.status, JobStatus::Rejected);
        let good = rx_good.await.unwrap();
        assert_eq!(good.status, JobStatus::Succeeded);
        assert!(temp.path().join("movies/Good.mkv").is_file());
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_most_recent_first() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(MockTorrentEngine::new());
        let queue = queue_with(engine, &temp, 2);

        let mut receivers = Vec::new();
        let mut ids = Vec::new();
        for i in 0..3 {
            let (job, rx) = QueuedJob::new(format!("missing-{}.torrent", i));
            ids.push(job.id.clone());
            queue.enqueue(job);
            receivers.push(rx);
        }
        for rx in receivers {
            rx.await.unwrap();
        }

        let status = queue.status();
        let history: Vec<_> = status.history.iter().map(|r| r.id.clone()).collect();
        assert_eq!(history, vec![ids[2].clone(), ids[1].clone()]);
        assert_eq!(status.counters.rejected, 3);
    }

    #[tokio::test]
    async fn test_dropped_receiver_still_advances() {
        let temp = TempDir::new().unwrap();
        let engine = Arc::new(MockTorrentEngine::new());
        engine.add_torrent("b.torrent", "b", vec![("B.mkv", b"b".to_vec())]);
        let queue = queue_with(engine, &temp, 10);

        let (a, rx_a) = QueuedJob::new("a.torrent");
        drop(rx_a);
        let (b, rx_b) = QueuedJob::new("b.torrent");
        queue.enqueue(a);
        queue.enqueue(b);

        assert_eq!(rx_b.await.unwrap().status, JobStatus::Succeeded);
    }
}
