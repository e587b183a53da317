//! Placement of downloaded media into the library.
//!
//! Two steps per file:
//!
//! - **Resolve**: turn a classification into a destination directory under
//!   the movies or shows root, creating it on demand.
//! - **Transfer**: stream the file's bytes from the torrent engine into the
//!   destination path.
//!
//! Destinations keep the original base file name. An existing file with the
//! same name is overwritten and a failed transfer leaves whatever was
//! written in place.
//!
//! # Example
//!
//! ```ignore
//! use sortarr_core::classifier::classify_file;
//! use sortarr_core::placer::{resolve_destination, transfer, LibraryLayout};
//!
//! let layout = LibraryLayout::new("/media/movies", "/media/shows");
//! let classification = classify_file("Show.Name.S01E01.mkv", true);
//!
//! if let Some(dest) = resolve_destination(&layout, "Show.Name.S01E01.mkv", &classification).await? {
//!     let bytes = transfer(reader, &dest.path, 1024 * 1024).await?;
//!     println!("wrote {} bytes to {}", bytes, dest.path.display());
//! }
//! ```

mod config;
mod error;
mod resolver;
mod transfer;
mod types;

pub use config::PlacerConfig;
pub use error::PlacerError;
pub use resolver::{ensure_directory, plan_destination, resolve_destination};
pub use transfer::transfer;
pub use types::{Destination, LibraryLayout, PlacedFile, PlacementKind};
