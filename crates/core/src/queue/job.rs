//! Execution of a single torrent job.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::config::{ProgressConfig, QueueConfig};
use super::progress::ProgressNotifier;
use super::types::{FileTally, JobError, JobOutcome, JobPhase, JobResponse, PendingJob};
use crate::classifier::{classify_file, is_show, should_skip};
use crate::config::Config;
use crate::metrics::{BYTES_PLACED, FILES_PROCESSED};
use crate::notify::Notifier;
use crate::placer::{resolve_destination, transfer, LibraryLayout, PlacerConfig, PlacerError};
use crate::torrent_client::{ContainedFile, ResolvedTorrent, TorrentClientError, TorrentEngine};

/// How a retained file ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilePlacement {
    Placed { bytes: u64 },
    /// Show file whose name gave no show/season.
    Unmatched,
}

/// Runs jobs against a torrent engine and the library layout.
#[derive(Clone)]
pub struct JobRunner {
    engine: Arc<dyn TorrentEngine>,
    notifier: Notifier,
    layout: LibraryLayout,
    queue_config: QueueConfig,
    progress_config: ProgressConfig,
    placer_config: PlacerConfig,
}

impl JobRunner {
    pub fn new(engine: Arc<dyn TorrentEngine>, notifier: Notifier, layout: LibraryLayout) -> Self {
        Self {
            engine,
            notifier,
            layout,
            queue_config: QueueConfig::default(),
            progress_config: ProgressConfig::default(),
            placer_config: PlacerConfig::default(),
        }
    }

    pub fn from_config(engine: Arc<dyn TorrentEngine>, notifier: Notifier, config: &Config) -> Self {
        Self::new(engine, notifier, LibraryLayout::from(&config.library))
            .with_queue_config(config.queue.clone())
            .with_progress_config(config.progress.clone())
            .with_placer_config(config.placer.clone())
    }

    pub fn with_queue_config(mut self, config: QueueConfig) -> Self {
        self.queue_config = config;
        self
    }

    pub fn with_progress_config(mut self, config: ProgressConfig) -> Self {
        self.progress_config = config;
        self
    }

    pub fn with_placer_config(mut self, config: PlacerConfig) -> Self {
        self.placer_config = config;
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Runs one job to completion, reporting phase changes through `on_phase`.
    pub async fn run<F>(&self, job: &PendingJob, on_phase: F) -> JobOutcome
    where
        F: Fn(JobPhase) + Send + Sync,
    {
        self.notifier.notify(format!(
            "Resolving torrent: {}",
            job.descriptor.display()
        ));

        let torrent = match self.resolve(&job.descriptor).await {
            Ok(torrent) => torrent,
            Err(err) => {
                warn!(job_id = %job.id, error = %err, "Descriptor rejected");
                self.notifier.notify(format!("Error adding torrent: {}", err));
                return JobOutcome {
                    response: JobResponse::rejected(&job.id),
                    info_hash: None,
                    name: None,
                    files: FileTally::default(),
                };
            }
        };

        self.notifier.notify(format!(
            "Started processing torrent: {}",
            torrent.info_hash
        ));

        let torrent_is_show = is_show(torrent.file_names());
        let progress = ProgressNotifier::start(
            &torrent.info_hash,
            torrent.handle.clone(),
            torrent.total_size_bytes,
            &self.progress_config,
        );

        let mut tally = FileTally::default();
        let mut retained = Vec::new();
        for file in &torrent.files {
            if should_skip(&file.name) {
                self.notifier.notify(format!("Skipping file: {}", file.name));
                FILES_PROCESSED.with_label_values(&["skipped"]).inc();
                tally.skipped += 1;
            } else {
                retained.push(file);
            }
        }

        let files_total = retained.len();
        let settled = AtomicUsize::new(0);
        let transferring = |files_settled: usize| JobPhase::Transferring {
            info_hash: torrent.info_hash.clone(),
            name: torrent.name.clone(),
            is_show: torrent_is_show,
            files_total,
            files_settled,
        };

        info!(
            job_id = %job.id,
            info_hash = %torrent.info_hash,
            is_show = torrent_is_show,
            files = files_total,
            skipped = tally.skipped,
            "Placing torrent files"
        );
        on_phase(transferring(0));

        let torrent = &torrent;
        let settled = &settled;
        let on_phase = &on_phase;
        let transferring = &transferring;
        let results = join_all(retained.iter().map(|file| async move {
            let result = self.place_file(torrent, file, torrent_is_show).await;
            let files_settled = settled.fetch_add(1, Ordering::SeqCst) + 1;
            on_phase(transferring(files_settled));
            result
        }))
        .await;

        progress.stop();

        let mut first_error = None;
        for result in results {
            match result {
                Ok(FilePlacement::Placed { bytes }) => {
                    tally.placed += 1;
                    tally.bytes_placed += bytes;
                }
                Ok(FilePlacement::Unmatched) => tally.unmatched += 1,
                Err(err) => {
                    tally.failed += 1;
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        let response = match first_error {
            Some(err) => {
                self.notifier
                    .notify(format!("Error processing torrent: {}", err));
                JobResponse::failed(&job.id)
            }
            None => {
                let message = format!("Finished processing torrent: {}", torrent.info_hash);
                self.notifier.notify(&message);
                JobResponse::succeeded(&job.id, message)
            }
        };

        JobOutcome {
            response,
            info_hash: Some(torrent.info_hash.clone()),
            name: Some(torrent.name.clone()),
            files: tally,
        }
    }

    async fn resolve(&self, descriptor: &Path) -> Result<ResolvedTorrent, JobError> {
        let resolution = self.engine.resolve(descriptor);

        let result = match self.queue_config.resolve_timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), resolution)
                .await
                .unwrap_or(Err(TorrentClientError::Timeout)),
            None => resolution.await,
        };

        result.map_err(JobError::DescriptorInvalid)
    }

    /// Places one retained file, notifying and counting the outcome.
    async fn place_file(
        &self,
        torrent: &ResolvedTorrent,
        file: &ContainedFile,
        torrent_is_show: bool,
    ) -> Result<FilePlacement, JobError> {
        let result = self.try_place_file(torrent, file, torrent_is_show).await;

        match &result {
            Ok(FilePlacement::Placed { bytes }) => {
                FILES_PROCESSED.with_label_values(&["placed"]).inc();
                BYTES_PLACED.inc_by(*bytes);
            }
            Ok(FilePlacement::Unmatched) => {
                FILES_PROCESSED.with_label_values(&["unmatched"]).inc();
            }
            Err(err) => {
                warn!(info_hash = %torrent.info_hash, file = %file.name, error = %err, "File placement failed");
                self.notifier.notify(format!("Error saving file: {}", err));
                FILES_PROCESSED.with_label_values(&["failed"]).inc();
            }
        }

        result
    }

    async fn try_place_file(
        &self,
        torrent: &ResolvedTorrent,
        file: &ContainedFile,
        torrent_is_show: bool,
    ) -> Result<FilePlacement, JobError> {
        let classification = classify_file(&file.name, torrent_is_show);

        let Some(destination) =
            resolve_destination(&self.layout, &file.name, &classification).await?
        else {
            self.notifier.notify(format!(
                "Could not parse show and season from: {}",
                file.name
            ));
            return Ok(FilePlacement::Unmatched);
        };

        let kind = if destination.is_show() { "show" } else { "movie" };
        self.notifier.notify(format!(
            "Saving as {} to: {}",
            kind,
            destination.path.display()
        ));

        let reader = torrent
            .handle
            .open_file(file.index)
            .map_err(|source| JobError::StreamUnavailable {
                name: file.name.clone(),
                source,
            })?;

        let buffer_size = self.placer_config.buffer_size;
        let copy = transfer(reader, &destination.path, buffer_size);
        let bytes = match self.queue_config.transfer_timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), copy)
                .await
                .map_err(|_| PlacerError::TimedOut {
                    path: destination.path.clone(),
                    after_secs: secs,
                })??,
            None => copy.await?,
        };

        debug!(file = %file.name, bytes, "Transfer complete");
        self.notifier.notify(format!(
            "File saved to: {}",
            destination.path.display()
        ));

        Ok(FilePlacement::Placed { bytes })
    }
}
