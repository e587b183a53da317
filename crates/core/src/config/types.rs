use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::placer::PlacerConfig;
use crate::queue::{ProgressConfig, QueueConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub engine: LibrqbitConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub placer: PlacerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

/// Destination roots for placed media.
///
/// Movies land flat in `movies_root`; episodes land in
/// `shows_root/<show>/Season <N>/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    pub movies_root: PathBuf,
    pub shows_root: PathBuf,
}

/// Staging area for uploaded torrent descriptors.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    /// Maximum accepted request body for `/upload`, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

/// Embedded librqbit session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrqbitConfig {
    /// Where the engine keeps piece data while downloading.
    #[serde(default = "default_download_path")]
    pub download_path: String,
    #[serde(default = "default_true")]
    pub enable_dht: bool,
    #[serde(default)]
    pub listen_port: Option<u16>,
    /// Session persistence folder; unset disables persistence.
    #[serde(default)]
    pub persistence_path: Option<String>,
}

impl Default for LibrqbitConfig {
    fn default() -> Self {
        Self {
            download_path: default_download_path(),
            enable_dht: true,
            listen_port: None,
            persistence_path: None,
        }
    }
}

fn default_download_path() -> String {
    "downloads".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[library]
movies_root = "/media/movies"
shows_root = "/media/shows"
"#;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.uploads.dir, PathBuf::from("uploads"));
        assert_eq!(config.engine.download_path, "downloads");
        assert!(config.engine.enable_dht);
        assert_eq!(config.queue.resolve_timeout_secs, None);
        assert_eq!(config.progress.interval_secs, 10);
        assert!((config.progress.smoothing_factor - 9.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_missing_library_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_engine_section() {
        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
[engine]
download_path = "/var/lib/sortarr/downloads"
enable_dht = false
listen_port = 4240
persistence_path = "/var/lib/sortarr/session"
"#
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.engine.download_path, "/var/lib/sortarr/downloads");
        assert!(!config.engine.enable_dht);
        assert_eq!(config.engine.listen_port, Some(4240));
        assert_eq!(
            config.engine.persistence_path.as_deref(),
            Some("/var/lib/sortarr/session")
        );
    }

    #[test]
    fn test_config_serializes_to_json() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["library"]["movies_root"], "/media/movies");
        assert_eq!(json["server"]["port"], 3000);
    }
}
