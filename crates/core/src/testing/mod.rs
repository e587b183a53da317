//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use sortarr_core::testing::{MockTorrentEngine, RecordingSink};
//!
//! let engine = MockTorrentEngine::new();
//! engine.add_torrent("a.torrent", "Movie", vec![("Movie.2020.mkv", b"data".to_vec())]);
//!
//! let sink = Arc::new(RecordingSink::new());
//! // Build a JobRunner / DownloadQueue with them...
//! ```

mod mock_torrent_engine;
mod recording_sink;

pub use mock_torrent_engine::MockTorrentEngine;
pub use recording_sink::RecordingSink;
