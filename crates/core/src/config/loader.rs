use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides, e.g. `TONEGRAB_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "TONEGRAB_";

/// Load configuration from file with environment variable overrides.
///
/// Nested keys are separated by a double underscore so that field names
/// containing `_` stay addressable.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.downloads.format, "mp3");
        assert_eq!(config.manager.cancel_grace_ms, 3000);
    }

    #[test]
    fn test_load_config_from_str_partial_sections() {
        let toml = r#"
[downloads]
output_dir = "/srv/music"
format = "flac"

[retry]
max_attempts = 2

[ytdlp]
extra_args = ["--cookies", "/etc/tonegrab/cookies.txt"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.downloads.output_dir, PathBuf::from("/srv/music"));
        assert_eq!(config.downloads.format, "flac");
        assert_eq!(config.downloads.quality, "192");
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.delay_ms, 500);
        assert_eq!(config.ytdlp.extra_args.len(), 2);
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let result = load_config_from_str("[server]\nport = \"not a number\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[progress]
percent_interval_ms = 50

[logging]
json = true
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.progress.percent_interval_ms, 50);
        assert_eq!(config.progress.status_interval_ms, 500);
        assert!(config.logging.json);
    }
}
