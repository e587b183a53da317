//! Types for the placer module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::LibraryConfig;

/// Library roots that placed files land under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryLayout {
    pub movies_root: PathBuf,
    pub shows_root: PathBuf,
}

impl LibraryLayout {
    pub fn new(movies_root: impl Into<PathBuf>, shows_root: impl Into<PathBuf>) -> Self {
        Self {
            movies_root: movies_root.into(),
            shows_root: shows_root.into(),
        }
    }
}

impl From<&LibraryConfig> for LibraryLayout {
    fn from(config: &LibraryConfig) -> Self {
        Self::new(&config.movies_root, &config.shows_root)
    }
}

/// Which part of the library a file was sorted into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementKind {
    Movie,
    Show { show_name: String, season: u32 },
}

/// Where a single file will be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub kind: PlacementKind,
    /// Directory the file is written into.
    pub directory: PathBuf,
    /// Full destination path, `directory` joined with the base file name.
    pub path: PathBuf,
}

impl Destination {
    pub fn is_show(&self) -> bool {
        matches!(self.kind, PlacementKind::Show { .. })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// A file written into the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedFile {
    pub file_name: String,
    pub destination: PathBuf,
    pub size_bytes: u64,
}
