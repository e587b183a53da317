//! Torrent engine abstraction.
//!
//! This module provides a `TorrentEngine` trait that turns a descriptor file
//! into a `ResolvedTorrent`: metadata, per-file byte streams and live speed.

mod librqbit;
mod types;

pub use librqbit::LibrqbitEngine;
pub use types::*;
