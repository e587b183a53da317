//! Mock torrent engine for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::torrent_client::{
    ContainedFile, FileReader, ResolvedTorrent, TorrentClientError, TorrentEngine, TorrentHandle,
};

/// An in-memory torrent served by the mock.
#[derive(Debug, Clone)]
struct MockTorrent {
    info_hash: String,
    name: String,
    files: Vec<(String, Vec<u8>)>,
}

/// Handle over in-memory file contents.
struct MockHandle {
    info_hash: String,
    files: Vec<Vec<u8>>,
    broken: HashSet<usize>,
    speed: u64,
}

impl TorrentHandle for MockHandle {
    fn info_hash(&self) -> &str {
        &self.info_hash
    }

    fn download_speed(&self) -> u64 {
        self.speed
    }

    fn open_file(&self, index: usize) -> Result<FileReader, TorrentClientError> {
        if self.broken.contains(&index) {
            return Err(TorrentClientError::FileNotFound {
                info_hash: self.info_hash.clone(),
                index,
            });
        }
        let bytes = self
            .files
            .get(index)
            .cloned()
            .ok_or_else(|| TorrentClientError::FileNotFound {
                info_hash: self.info_hash.clone(),
                index,
            })?;
        Ok(Box::pin(Cursor::new(bytes)))
    }
}

/// Mock implementation of the TorrentEngine trait.
///
/// Provides controllable behavior for testing:
/// - Serve registered descriptors from memory; anything else is invalid
/// - Hold resolutions until released (gated mode)
/// - Record the order descriptors were resolved in
/// - Make individual file streams fail to open
///
/// # Example
///
/// ```rust,ignore
/// let engine = MockTorrentEngine::gated();
/// engine.add_torrent("a.torrent", "Movie", vec![("Movie.mkv", b"data".to_vec())]);
///
/// // ... enqueue a job for "a.torrent" ...
///
/// engine.release(1);
/// assert_eq!(engine.resolved(), vec!["a.torrent"]);
/// ```
#[derive(Debug)]
pub struct MockTorrentEngine {
    torrents: Arc<Mutex<HashMap<PathBuf, MockTorrent>>>,
    broken_streams: Arc<Mutex<HashMap<PathBuf, HashSet<String>>>>,
    resolved: Arc<Mutex<Vec<String>>>,
    gate: Arc<Semaphore>,
    hash_counter: Arc<Mutex<u32>>,
    download_speed: u64,
}

impl Default for MockTorrentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTorrentEngine {
    /// Create an engine that resolves immediately.
    pub fn new() -> Self {
        Self::with_permits(Semaphore::MAX_PERMITS)
    }

    /// Create an engine whose resolutions wait for [`release`](Self::release).
    pub fn gated() -> Self {
        Self::with_permits(0)
    }

    fn with_permits(permits: usize) -> Self {
        Self {
            torrents: Arc::new(Mutex::new(HashMap::new())),
            broken_streams: Arc::new(Mutex::new(HashMap::new())),
            resolved: Arc::new(Mutex::new(Vec::new())),
            gate: Arc::new(Semaphore::new(permits)),
            hash_counter: Arc::new(Mutex::new(0)),
            download_speed: 0,
        }
    }

    /// Sets the speed every handle reports.
    pub fn with_download_speed(mut self, bytes_per_sec: u64) -> Self {
        self.download_speed = bytes_per_sec;
        self
    }

    /// Registers a torrent served for `descriptor`.
    pub fn add_torrent<P, N, F>(&self, descriptor: P, name: N, files: Vec<(F, Vec<u8>)>)
    where
        P: Into<PathBuf>,
        N: Into<String>,
        F: Into<String>,
    {
        let info_hash = {
            let mut counter = self.hash_counter.lock().unwrap();
            *counter += 1;
            format!("{:040x}", *counter)
        };
        let torrent = MockTorrent {
            info_hash,
            name: name.into(),
            files: files.into_iter().map(|(n, b)| (n.into(), b)).collect(),
        };
        self.torrents
            .lock()
            .unwrap()
            .insert(descriptor.into(), torrent);
    }

    /// Makes opening `file_name` in `descriptor`'s torrent fail.
    pub fn break_stream(&self, descriptor: impl Into<PathBuf>, file_name: impl Into<String>) {
        self.broken_streams
            .lock()
            .unwrap()
            .entry(descriptor.into())
            .or_default()
            .insert(file_name.into());
    }

    /// Lets `count` waiting or future resolutions proceed.
    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    /// Descriptors passed to `resolve`, in call order.
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }

    pub fn resolve_count(&self) -> usize {
        self.resolved.lock().unwrap().len()
    }

    /// Info hash assigned to a registered descriptor.
    pub fn info_hash_of(&self, descriptor: impl AsRef<Path>) -> Option<String> {
        self.torrents
            .lock()
            .unwrap()
            .get(descriptor.as_ref())
            .map(|t| t.info_hash.clone())
    }
}

#[async_trait]
impl TorrentEngine for MockTorrentEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn resolve(&self, descriptor: &Path) -> Result<ResolvedTorrent, TorrentClientError> {
        self.resolved
            .lock()
            .unwrap()
            .push(descriptor.display().to_string());

        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| TorrentClientError::Internal(e.to_string()))?;
        permit.forget();

        let torrent = self
            .torrents
            .lock()
            .unwrap()
            .get(descriptor)
            .cloned()
            .ok_or_else(|| {
                TorrentClientError::InvalidTorrent(format!(
                    "not a torrent: {}",
                    descriptor.display()
                ))
            })?;

        let broken_names = self
            .broken_streams
            .lock()
            .unwrap()
            .get(descriptor)
            .cloned()
            .unwrap_or_default();

        let files: Vec<ContainedFile> = torrent
            .files
            .iter()
            .enumerate()
            .map(|(index, (name, bytes))| ContainedFile::new(index, name, bytes.len() as u64))
            .collect();
        let broken = files
            .iter()
            .filter(|f| broken_names.contains(&f.name))
            .map(|f| f.index)
            .collect();

        let handle = MockHandle {
            info_hash: torrent.info_hash.clone(),
            files: torrent.files.into_iter().map(|(_, b)| b).collect(),
            broken,
            speed: self.download_speed,
        };

        Ok(ResolvedTorrent {
            info_hash: torrent.info_hash,
            name: torrent.name,
            total_size_bytes: files.iter().map(|f| f.size_bytes).sum(),
            files,
            handle: Arc::new(handle),
        })
    }
}
