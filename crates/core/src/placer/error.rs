//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while placing a file.
#[derive(Debug, Error)]
pub enum PlacerError {
    /// Failed to create destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create, write or flush the destination file.
    #[error("Failed to write {path}: {error}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The source stream failed mid-transfer.
    #[error("Failed to read source for {path}: {error}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The transfer did not finish within the configured deadline.
    #[error("Transfer to {path} timed out after {after_secs}s")]
    TimedOut { path: PathBuf, after_secs: u64 },
}

impl PlacerError {
    /// Creates a write failed error.
    pub fn write_failed(path: PathBuf, error: std::io::Error) -> Self {
        Self::WriteFailed { path, error }
    }

    /// Creates a read failed error.
    pub fn read_failed(path: PathBuf, error: std::io::Error) -> Self {
        Self::ReadFailed { path, error }
    }

    /// Destination path the error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::DirectoryCreationFailed { path, .. }
            | Self::WriteFailed { path, .. }
            | Self::ReadFailed { path, .. }
            | Self::TimedOut { path, .. } => path,
        }
    }
}
