use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Library section exists (enforced by serde) with distinct, non-empty roots
/// - Server port is not 0
/// - Queue, progress and placer tunables are in range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let library = &config.library;
    if library.movies_root.as_os_str().is_empty() || library.shows_root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "library.movies_root and library.shows_root must be set".to_string(),
        ));
    }
    if library.movies_root == library.shows_root {
        return Err(ConfigError::ValidationError(
            "library.movies_root and library.shows_root must differ".to_string(),
        ));
    }

    if config.progress.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "progress.interval_secs cannot be 0".to_string(),
        ));
    }
    if !(config.progress.smoothing_factor >= 0.0) {
        return Err(ConfigError::ValidationError(
            "progress.smoothing_factor must be a non-negative number".to_string(),
        ));
    }

    if config.queue.resolve_timeout_secs == Some(0) || config.queue.transfer_timeout_secs == Some(0)
    {
        return Err(ConfigError::ValidationError(
            "queue timeouts must be greater than 0 when set".to_string(),
        ));
    }
    if config.queue.history_limit == 0 {
        return Err(ConfigError::ValidationError(
            "queue.history_limit cannot be 0".to_string(),
        ));
    }

    if config.placer.buffer_size == 0 {
        return Err(ConfigError::ValidationError(
            "placer.buffer_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}
