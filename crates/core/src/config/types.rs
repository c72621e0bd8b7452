use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::batch::BatchConfig;
use crate::job::RetryConfig;
use crate::manager::ManagerConfig;
use crate::progress::ProgressConfig;
use crate::ytdlp::YtDlpConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default)]
    pub ytdlp: YtDlpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
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
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Defaults applied to jobs that do not specify their own.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    /// Base directory for all output files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Format name (mp3, flac, wav, m4a, opus).
    #[serde(default = "default_format")]
    pub format: String,
    /// Quality token; ignored by lossless formats.
    #[serde(default = "default_quality")]
    pub quality: String,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: default_format(),
            quality: default_quality(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_format() -> String {
    "mp3".to_string()
}

fn default_quality() -> String {
    "192".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

/// Sanitized config for API responses (yt-dlp arguments hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub downloads: DownloadsConfig,
    pub progress: ProgressConfig,
    pub retry: RetryConfig,
    pub batch: BatchConfig,
    pub manager: ManagerConfig,
    pub ytdlp: SanitizedYtDlpConfig,
}

/// Sanitized yt-dlp config (extra arguments may carry credentials)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedYtDlpConfig {
    pub binary: PathBuf,
    pub ffmpeg_location_configured: bool,
    pub socket_timeout_secs: u64,
    pub extra_args_count: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            downloads: config.downloads.clone(),
            progress: config.progress.clone(),
            retry: config.retry.clone(),
            batch: config.batch.clone(),
            manager: config.manager.clone(),
            ytdlp: SanitizedYtDlpConfig {
                binary: config.ytdlp.binary.clone(),
                ffmpeg_location_configured: config.ytdlp.ffmpeg_location.is_some(),
                socket_timeout_secs: config.ytdlp.socket_timeout_secs,
                extra_args_count: config.ytdlp.extra_args.len(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.downloads.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.downloads.quality, "192");
        assert!(!config.logging.json);
        assert_eq!(config.batch.watch_url_base, "https://www.youtube.com/watch?v=");
    }

    #[test]
    fn test_sanitized_config_hides_extra_args() {
        let mut config = Config::default();
        config.ytdlp.extra_args = vec!["--password".to_string(), "hunter2".to_string()];

        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
        assert_eq!(sanitized.ytdlp.extra_args_count, 2);
    }
}
