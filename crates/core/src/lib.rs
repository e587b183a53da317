pub mod classifier;
pub mod config;
pub mod metrics;
pub mod notify;
pub mod placer;
pub mod queue;
pub mod testing;
pub mod torrent_client;

pub use classifier::{classify_file, is_episode_like, is_show, parse_show_and_season, should_skip};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LibraryConfig,
    LibrqbitConfig, ServerConfig, UploadConfig,
};
pub use notify::{NotificationSink, Notifier, NullSink};
pub use placer::{LibraryLayout, PlacerConfig, PlacerError};
pub use queue::{
    DownloadQueue, JobError, JobResponse, JobRunner, JobStatus, ProgressConfig, QueueConfig,
    QueueStatus, QueuedJob,
};
pub use torrent_client::{
    LibrqbitEngine, ResolvedTorrent, TorrentClientError, TorrentEngine, TorrentHandle,
};
