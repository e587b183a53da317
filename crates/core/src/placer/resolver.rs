//! Destination resolution.

use std::path::{Path, PathBuf};

use tokio::fs;

use super::error::PlacerError;
use super::types::{Destination, LibraryLayout, PlacementKind};
use crate::classifier::ClassificationResult;

/// Base name of a torrent-relative file name.
fn base_name(file_name: &str) -> PathBuf {
    Path::new(file_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// Computes the destination for a classified file without touching disk.
///
/// Returns `None` for skipped files and for show files without a parsed
/// show name and season.
pub fn plan_destination(
    layout: &LibraryLayout,
    file_name: &str,
    classification: &ClassificationResult,
) -> Option<Destination> {
    if classification.skip {
        return None;
    }

    let (kind, directory) = if classification.is_show {
        let show_name = classification.show_name.clone()?;
        let season = classification.season?;
        let directory = layout
            .shows_root
            .join(&show_name)
            .join(format!("Season {}", season));
        (PlacementKind::Show { show_name, season }, directory)
    } else {
        (PlacementKind::Movie, layout.movies_root.clone())
    };

    let path = directory.join(base_name(file_name));
    Some(Destination {
        kind,
        directory,
        path,
    })
}

/// Creates a directory and any missing parents. Existing directories are fine.
pub async fn ensure_directory(directory: &Path) -> Result<(), PlacerError> {
    fs::create_dir_all(directory)
        .await
        .map_err(|source| PlacerError::DirectoryCreationFailed {
            path: directory.to_path_buf(),
            source,
        })
}

/// Plans the destination and makes sure its directory exists.
pub async fn resolve_destination(
    layout: &LibraryLayout,
    file_name: &str,
    classification: &ClassificationResult,
) -> Result<Option<Destination>, PlacerError> {
    let Some(destination) = plan_destination(layout, file_name, classification) else {
        return Ok(None);
    };

    ensure_directory(&destination.directory).await?;
    Ok(Some(destination))
}
