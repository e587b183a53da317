//! librqbit embedded torrent engine implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use librqbit::{
    AddTorrent as RqbitAddTorrent, AddTorrentResponse, ManagedTorrent, Session, SessionOptions,
    SessionPersistenceConfig,
};
use tracing::{debug, info, warn};

use super::{
    ContainedFile, FileReader, ResolvedTorrent, TorrentClientError, TorrentEngine, TorrentHandle,
};
use crate::config::LibrqbitConfig;

/// Embedded librqbit torrent engine.
pub struct LibrqbitEngine {
    session: Arc<Session>,
}

impl LibrqbitEngine {
    /// Create a new librqbit engine from configuration.
    pub async fn new(config: &LibrqbitConfig) -> Result<Self, TorrentClientError> {
        let download_path = PathBuf::from(&config.download_path);

        if !download_path.exists() {
            std::fs::create_dir_all(&download_path).map_err(|e| {
                TorrentClientError::ConnectionFailed(format!(
                    "Failed to create download directory: {}",
                    e
                ))
            })?;
        }

        let mut opts = SessionOptions::default();

        if !config.enable_dht {
            opts.disable_dht = true;
        }

        // Range, not RangeInclusive
        if let Some(port) = config.listen_port {
            opts.listen_port_range = Some(port..(port + 1));
        }

        if let Some(ref persistence_path) = config.persistence_path {
            let persistence_dir = PathBuf::from(persistence_path);
            if !persistence_dir.exists() {
                std::fs::create_dir_all(&persistence_dir).map_err(|e| {
                    TorrentClientError::ConnectionFailed(format!(
                        "Failed to create persistence directory: {}",
                        e
                    ))
                })?;
            }
            opts.persistence = Some(SessionPersistenceConfig::Json {
                folder: Some(persistence_dir),
            });
        }

        info!(
            download_path = %download_path.display(),
            dht_enabled = !opts.disable_dht,
            "Initializing librqbit session"
        );

        let session = Session::new_with_opts(download_path, opts)
            .await
            .map_err(|e| {
                TorrentClientError::ConnectionFailed(format!(
                    "Failed to initialize librqbit session: {}",
                    e
                ))
            })?;

        if let Some(port) = session.tcp_listen_port() {
            info!(port = port, "librqbit listening on TCP port");
        }

        Ok(Self { session })
    }

    /// Format info hash as lowercase hex string.
    fn format_hash(hash: &librqbit_core::Id20) -> String {
        hash.as_string()
    }

    /// Lists the contained files from the torrent metadata.
    fn contained_files(torrent: &ManagedTorrent) -> Result<Vec<ContainedFile>, TorrentClientError> {
        torrent
            .with_metadata(|meta| {
                meta.file_infos
                    .iter()
                    .enumerate()
                    .map(|(index, fi)| ContainedFile::new(index, &fi.relative_filename, fi.len))
                    .collect::<Vec<_>>()
            })
            .map_err(|e| TorrentClientError::InvalidTorrent(format!("Missing metadata: {}", e)))
    }
}

/// Handle to a torrent managed by the librqbit session.
struct LibrqbitHandle {
    info_hash: String,
    torrent: Arc<ManagedTorrent>,
}

impl TorrentHandle for LibrqbitHandle {
    fn info_hash(&self) -> &str {
        &self.info_hash
    }

    fn download_speed(&self) -> u64 {
        // librqbit stores MiB/s in the field named "mbps"
        self.torrent
            .stats()
            .live
            .as_ref()
            .map(|live| (live.download_speed.mbps * 1024.0 * 1024.0) as u64)
            .unwrap_or(0)
    }

    fn open_file(&self, index: usize) -> Result<FileReader, TorrentClientError> {
        let stream = self.torrent.clone().stream(index).map_err(|e| {
            warn!(info_hash = %self.info_hash, index, error = %e, "Failed to open file stream");
            TorrentClientError::FileNotFound {
                info_hash: self.info_hash.clone(),
                index,
            }
        })?;
        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl TorrentEngine for LibrqbitEngine {
    fn name(&self) -> &str {
        "librqbit"
    }

    async fn resolve(&self, descriptor: &Path) -> Result<ResolvedTorrent, TorrentClientError> {
        let data = tokio::fs::read(descriptor).await.map_err(|e| {
            TorrentClientError::InvalidTorrent(format!(
                "Failed to read {}: {}",
                descriptor.display(),
                e
            ))
        })?;

        let response = self
            .session
            .add_torrent(RqbitAddTorrent::from_bytes(data), None)
            .await
            .map_err(|e| TorrentClientError::InvalidTorrent(format!("Failed to add torrent: {}", e)))?;

        let torrent = match response {
            AddTorrentResponse::Added(_, handle) => handle,
            AddTorrentResponse::AlreadyManaged(_, handle) => {
                warn!(hash = %Self::format_hash(&handle.info_hash()), "Torrent already exists, reusing it");
                handle
            }
            AddTorrentResponse::ListOnly(_) => {
                return Err(TorrentClientError::ApiError(
                    "Torrent was added in list-only mode".to_string(),
                ))
            }
        };

        torrent
            .wait_until_initialized()
            .await
            .map_err(|e| TorrentClientError::ApiError(format!("Initialization failed: {}", e)))?;

        let info_hash = Self::format_hash(&torrent.info_hash());
        let files = Self::contained_files(&torrent)?;
        let total_size_bytes = files.iter().map(|f| f.size_bytes).sum();
        let name = torrent
            .name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("torrent-{}", &info_hash[..8]));

        debug!(hash = %info_hash, name = %name, files = files.len(), "Torrent resolved");

        Ok(ResolvedTorrent {
            info_hash: info_hash.clone(),
            name,
            total_size_bytes,
            files,
            handle: Arc::new(LibrqbitHandle { info_hash, torrent }),
        })
    }
}
