//! Filename heuristics deciding how a torrent's files are laid out.
//!
//! A torrent is a show if any of its file names looks like an episode.
//! Each show file must then parse into a show name and season on its own;
//! a file that does not is left unplaced. Everything else is a movie.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Video extensions eligible for placement (lowercase, without the dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm"];

/// Season/episode token in any of the accepted spellings.
///
/// The `S01E02` family matches anywhere, even glued to a preceding word.
/// Spelled-out and episode-only tokens must start the name or follow a
/// non-alphanumeric character, so `WALL-E` or `Se7en` stay movies.
static EPISODE_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:",
        r"s\d+[\s._-]*e?\d+",
        r"|(?:^|[^a-z0-9])season[\s._-]*\d+[\s._-]*(?:episode|ep|e)[\s._-]*\d+",
        r"|(?:^|[^a-z0-9])(?:episode|ep|e)[\s._-]*\d{1,3}(?:$|[^a-z0-9])",
        r")",
    ))
    .unwrap()
});

/// Show name prefix followed by a season+episode token.
static SHOW_AND_SEASON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(.+?)[\s._-]+",
        r"(?:s(\d+)[\s._-]*e?\d+",
        r"|season[\s._-]*(\d+)[\s._-]*(?:episode|ep|e)[\s._-]*\d+)",
    ))
    .unwrap()
});

/// Show name and season extracted from an episode file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSeason {
    pub show_name: String,
    pub season: u32,
}

/// Per-file classification outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// File is a sample or not a video and must not be placed.
    pub skip: bool,
    /// Torrent-level show flag this file was classified under.
    pub is_show: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
}

impl ClassificationResult {
    /// A show file whose name yielded no show/season.
    pub fn is_unmatched_show(&self) -> bool {
        !self.skip && self.is_show && self.season.is_none()
    }
}

/// Returns true when the name carries a season/episode token.
pub fn is_episode_like(name: &str) -> bool {
    EPISODE_LIKE.is_match(name)
}

/// Torrent-level show detection: any episode-like name makes the torrent a show.
pub fn is_show<I, S>(names: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().any(|name| is_episode_like(name.as_ref()))
}

/// Extracts the show name and season from an episode file name.
pub fn parse_show_and_season(name: &str) -> Option<ShowSeason> {
    let caps = SHOW_AND_SEASON.captures(name)?;

    let show_name = caps
        .get(1)?
        .as_str()
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '_' | '-'))
        .trim();
    if show_name.is_empty() {
        return None;
    }

    let season = caps
        .get(2)
        .or_else(|| caps.get(3))
        .and_then(|m| m.as_str().parse::<u32>().ok())?;

    Some(ShowSeason {
        show_name: show_name.to_string(),
        season,
    })
}

/// Samples and non-video files are never placed.
pub fn should_skip(name: &str) -> bool {
    if name.to_lowercase().contains("sample") {
        return true;
    }

    let extension = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    match extension {
        Some(ext) => !ALLOWED_EXTENSIONS.contains(&ext.as_str()),
        None => true,
    }
}

/// Classifies one file under the torrent-level show decision.
pub fn classify_file(name: &str, torrent_is_show: bool) -> ClassificationResult {
    if should_skip(name) {
        return ClassificationResult {
            skip: true,
            is_show: torrent_is_show,
            show_name: None,
            season: None,
        };
    }

    let parsed = if torrent_is_show {
        parse_show_and_season(name)
    } else {
        None
    };

    ClassificationResult {
        skip: false,
        is_show: torrent_is_show,
        show_name: parsed.as_ref().map(|p| p.show_name.clone()),
        season: parsed.map(|p| p.season),
    }
}
