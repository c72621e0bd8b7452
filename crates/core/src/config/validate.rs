use super::{types::Config, ConfigError};
use crate::job::MAX_ATTEMPTS_LIMIT;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Download quality is not empty
/// - Download attempts are between 1 and the retry limit
/// - Percent updates are not throttled harder than status lines
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.downloads.quality.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloads.quality cannot be empty".to_string(),
        ));
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.retry.max_attempts > MAX_ATTEMPTS_LIMIT {
        return Err(ConfigError::ValidationError(format!(
            "retry.max_attempts ({}) cannot exceed {}",
            config.retry.max_attempts, MAX_ATTEMPTS_LIMIT
        )));
    }

    if config.progress.percent_interval_ms > config.progress.status_interval_ms {
        return Err(ConfigError::ValidationError(format!(
            "progress.percent_interval_ms ({}) cannot exceed progress.status_interval_ms ({})",
            config.progress.percent_interval_ms, config.progress.status_interval_ms
        )));
    }

    Ok(())
}
