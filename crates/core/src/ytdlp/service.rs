//! yt-dlp subprocess driver.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, trace, warn};

use super::config::YtDlpConfig;
use super::parse::{error_message, parse_metadata, parse_output_line, OutputLine};
use crate::format::{AudioCodec, FormatSpec, LOSSLESS_QUALITY};
use crate::gateway::{
    ExtractionService, MediaMetadata, ProgressControl, ServiceError, ServiceProgressSink,
};
use crate::options::JobOptions;

const PROGRESS_TEMPLATE: &str = "download:[tonegrab] %(progress)j";
const FILE_TEMPLATE: &str = "after_move:[tonegrab-file] %(filepath)s";

pub struct YtDlpService {
    config: YtDlpConfig,
}

impl YtDlpService {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &YtDlpConfig {
        &self.config
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = vec!["--no-color".to_string()];
        if self.config.socket_timeout_secs > 0 {
            args.push("--socket-timeout".to_string());
            args.push(self.config.socket_timeout_secs.to_string());
        }
        args
    }

    pub(crate) fn info_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "-J".to_string(),
            "--flat-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.common_args());
        args.extend(self.config.extra_args.iter().cloned());
        args.push(url.to_string());
        args
    }

    pub(crate) fn download_args(&self, options: &JobOptions) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            audio_format_arg(&options.format).to_string(),
            "--audio-quality".to_string(),
            audio_quality_arg(&options.format),
            "-o".to_string(),
            options.output_template().to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
            "--force-overwrites".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--print".to_string(),
            FILE_TEMPLATE.to_string(),
        ];
        args.extend(self.common_args());

        let ffmpeg = options
            .binary_location()
            .map(|p| p.to_path_buf())
            .or_else(|| self.config.ffmpeg_location.clone());
        if let Some(location) = ffmpeg {
            args.push("--ffmpeg-location".to_string());
            args.push(location.to_string_lossy().into_owned());
        }

        args.extend(self.config.extra_args.iter().cloned());
        args.push(options.source_url.clone());
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> ServiceError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ServiceError::new(format!("yt-dlp not found at {}", self.config.binary.display()))
        } else {
            ServiceError::new(format!("failed to start yt-dlp: {}", e))
        }
    }
}

fn audio_format_arg(format: &FormatSpec) -> &'static str {
    format.codec().as_str()
}

/// Maps our quality notation onto `--audio-quality`.
///
/// `best` becomes VBR 0. Plain bitrates above the VBR range get a `K` suffix.
fn audio_quality_arg(format: &FormatSpec) -> String {
    let quality = format.quality();
    if quality == LOSSLESS_QUALITY || format.codec() == AudioCodec::Wav {
        return "0".to_string();
    }
    match quality.parse::<u32>() {
        Ok(n) if n > 10 => format!("{}K", n),
        _ => quality.to_string(),
    }
}

/// Reads the next line, replacing invalid UTF-8 instead of failing.
///
/// The line terminator is kept. Returns `None` at end of stream.
async fn read_line_lossy<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Reads every line of `reader` into a vector.
async fn collect_lines<R: AsyncRead + Unpin>(reader: R) -> Vec<String> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut collected = Vec::new();
    while let Ok(Some(line)) = read_line_lossy(&mut reader, &mut buf).await {
        let line = line.trim_end_matches(&['\r', '\n'][..]).to_string();
        trace!(line = %line, "yt-dlp stderr");
        collected.push(line);
    }
    collected
}

#[async_trait]
impl ExtractionService for YtDlpService {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn resolve_info(&self, url: &str) -> Result<MediaMetadata, ServiceError> {
        let output = Command::new(&self.config.binary)
            .args(self.info_args(url))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr: Vec<String> = String::from_utf8_lossy(&output.stderr)
                .lines()
                .map(str::to_string)
                .collect();
            let message = error_message(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with code {:?}", output.status.code()));
            return Err(ServiceError::new(message));
        }

        parse_metadata(&String::from_utf8_lossy(&output.stdout))
    }

    async fn execute(
        &self,
        options: &JobOptions,
        sink: ServiceProgressSink<'_>,
    ) -> Result<PathBuf, ServiceError> {
        let target_dir = options.target_dir();
        tokio::fs::create_dir_all(&target_dir).await.map_err(|e| {
            ServiceError::new(format!(
                "failed to create output directory {}: {}",
                target_dir.display(),
                e
            ))
        })?;

        let args = self.download_args(options);
        debug!(binary = %self.config.binary.display(), ?args, "spawning yt-dlp");

        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ServiceError::new("yt-dlp stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ServiceError::new("yt-dlp stderr was not captured"))?;
        let stderr_task = tokio::spawn(collect_lines(stderr));

        let mut stdout = BufReader::new(stdout);
        let mut buf = Vec::new();
        let mut file_path = None;
        loop {
            let line = match read_line_lossy(&mut stdout, &mut buf).await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to read yt-dlp output");
                    break;
                }
            };

            match parse_output_line(&line) {
                OutputLine::Progress(raw) => {
                    if sink(&raw) == ProgressControl::Abort {
                        debug!(url = %options.source_url, "aborting yt-dlp");
                        let _ = child.kill().await;
                        stderr_task.abort();
                        return Err(ServiceError::aborted());
                    }
                }
                OutputLine::File(path) => file_path = Some(path),
                OutputLine::Other => trace!(line = %line.trim_end(), "yt-dlp stdout"),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ServiceError::new(format!("failed to wait for yt-dlp: {}", e)))?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let message = error_message(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with code {:?}", status.code()));
            return Err(ServiceError::new(message));
        }

        file_path.ok_or_else(|| ServiceError::new("yt-dlp did not report an output file"))
    }
}
