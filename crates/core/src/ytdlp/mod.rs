//! Extraction service backed by the `yt-dlp` command-line tool.
//!
//! Metadata comes from `yt-dlp -J --flat-playlist`. Downloads run with a
//! machine-readable progress template on stdout, so every progress line is a
//! JSON object and the final file path is printed after post-processing.

mod config;
mod parse;
mod service;

pub use config::YtDlpConfig;
pub use parse::{parse_metadata, parse_output_line, OutputLine, FILE_PREFIX, PROGRESS_PREFIX};
pub use service::YtDlpService;
