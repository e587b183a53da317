//! Types for torrent engine operations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncRead;

/// Errors that can occur during torrent engine operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid torrent data: {0}")]
    InvalidTorrent(String),

    #[error("File {index} not found in torrent {info_hash}")]
    FileNotFound { info_hash: String, index: usize },

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Readable byte stream for one file of a torrent.
pub type FileReader = Pin<Box<dyn AsyncRead + Send>>;

/// A file contained in a resolved torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainedFile {
    /// Position of the file within the torrent, used to open its stream.
    pub index: usize,
    /// Base file name.
    pub name: String,
    /// Path relative to the torrent root.
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl ContainedFile {
    pub fn new(index: usize, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            index,
            name,
            path,
            size_bytes,
        }
    }
}

/// Live handle to a torrent that is being downloaded.
pub trait TorrentHandle: Send + Sync {
    /// Info hash (lowercase hex).
    fn info_hash(&self) -> &str;

    /// Current download speed in bytes/second.
    fn download_speed(&self) -> u64;

    /// Opens a readable stream over the file at `index`.
    ///
    /// Reads block until the requested pieces have been downloaded.
    fn open_file(&self, index: usize) -> Result<FileReader, TorrentClientError>;
}

/// A descriptor resolved into torrent metadata plus a live handle.
#[derive(Clone)]
pub struct ResolvedTorrent {
    pub info_hash: String,
    pub name: String,
    pub total_size_bytes: u64,
    pub files: Vec<ContainedFile>,
    pub handle: Arc<dyn TorrentHandle>,
}

impl ResolvedTorrent {
    /// Names of all contained files, for torrent-level classification.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }
}

impl fmt::Debug for ResolvedTorrent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTorrent")
            .field("info_hash", &self.info_hash)
            .field("name", &self.name)
            .field("total_size_bytes", &self.total_size_bytes)
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

/// Trait for torrent engine backends.
#[async_trait]
pub trait TorrentEngine: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Adds the torrent described by the descriptor file and waits until its
    /// metadata is available.
    async fn resolve(&self, descriptor: &Path) -> Result<ResolvedTorrent, TorrentClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contained_file_uses_base_name() {
        let file = ContainedFile::new(2, "Show.Name.S01/Show.Name.S01E03.mkv", 42);
        assert_eq!(file.index, 2);
        assert_eq!(file.name, "Show.Name.S01E03.mkv");
        assert_eq!(file.path, PathBuf::from("Show.Name.S01/Show.Name.S01E03.mkv"));
        assert_eq!(file.size_bytes, 42);
    }

    #[test]
    fn test_contained_file_serialization() {
        let file = ContainedFile::new(0, "Movie.mkv", 1024);
        let json = serde_json::to_string(&file).unwrap();
        let parsed: ContainedFile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn test_error_display() {
        let err = TorrentClientError::FileNotFound {
            info_hash: "abc".to_string(),
            index: 3,
        };
        assert_eq!(err.to_string(), "File 3 not found in torrent abc");
        assert_eq!(
            TorrentClientError::InvalidTorrent("bad bencode".to_string()).to_string(),
            "Invalid torrent data: bad bencode"
        );
    }
}
