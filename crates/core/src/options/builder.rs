use std::path::PathBuf;

use super::sanitize::sanitize_title;
use super::types::JobOptions;
use crate::format::FormatSpec;

/// Builder for [`JobOptions`].
///
/// Every setter is optional; `build` never fails.
#[derive(Debug, Clone)]
pub struct OptionsBuilder {
    source_url: String,
    output_dir: Option<PathBuf>,
    format: FormatSpec,
    playlist_title: Option<String>,
    playlist_index: Option<u32>,
    binary_location: Option<PathBuf>,
}

impl OptionsBuilder {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            output_dir: None,
            format: FormatSpec::default(),
            playlist_title: None,
            playlist_index: None,
            binary_location: None,
        }
    }

    /// Starts from existing options, keeping all of their fields.
    pub fn from_options(options: &JobOptions) -> Self {
        Self {
            source_url: options.source_url.clone(),
            output_dir: Some(options.output_dir.clone()),
            format: options.format.clone(),
            playlist_title: options.playlist_title.clone(),
            playlist_index: options.playlist_index,
            binary_location: options.binary_location.clone(),
        }
    }

    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn format(mut self, format: FormatSpec) -> Self {
        self.format = format;
        self
    }

    /// Sets the format from a user-facing name and quality token.
    pub fn format_named(mut self, name: &str, quality: &str) -> Self {
        self.format = FormatSpec::resolve(name, quality);
        self
    }

    /// Sets the playlist title. It is sanitized on `build`.
    pub fn playlist_title(mut self, title: impl Into<String>) -> Self {
        self.playlist_title = Some(title.into());
        self
    }

    pub fn playlist_index(mut self, index: u32) -> Self {
        self.playlist_index = Some(index);
        self
    }

    pub fn binary_location(mut self, location: Option<PathBuf>) -> Self {
        self.binary_location = location;
        self
    }

    pub fn build(self) -> JobOptions {
        let output_dir = self
            .output_dir
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        JobOptions {
            source_url: self.source_url,
            output_dir,
            format: self.format,
            playlist_title: self.playlist_title.as_deref().map(sanitize_title),
            playlist_index: self.playlist_index,
            binary_location: self.binary_location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::AudioCodec;

    #[test]
    fn test_defaults() {
        let options = OptionsBuilder::new("https://example.com/v").build();
        assert_eq!(options.source_url, "https://example.com/v");
        assert_eq!(options.format, FormatSpec::mp3("192"));
        assert_eq!(
            options.output_dir,
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        );
        assert!(options.playlist_title.is_none());
        assert!(options.playlist_index.is_none());
        assert!(options.binary_location.is_none());
    }

    #[test]
    fn test_full_build() {
        let options = OptionsBuilder::new("https://example.com/v")
            .output_dir("/out")
            .format_named("opus", "160")
            .playlist_title("Road: Trip?")
            .playlist_index(3)
            .binary_location(Some(PathBuf::from("/usr/bin/ffmpeg")))
            .build();

        assert_eq!(options.output_dir, PathBuf::from("/out"));
        assert_eq!(options.format.codec(), AudioCodec::Opus);
        assert_eq!(options.format.quality(), "160");
        assert_eq!(options.playlist_title.as_deref(), Some("Road Trip"));
        assert_eq!(options.playlist_index, Some(3));
        assert_eq!(
            options.binary_location(),
            Some(std::path::Path::new("/usr/bin/ffmpeg"))
        );
    }

    #[test]
    fn test_from_options_round_trip_and_override() {
        let base = OptionsBuilder::new("https://example.com/list")
            .output_dir("/out")
            .format(FormatSpec::flac())
            .build();

        let item = OptionsBuilder::from_options(&base)
            .source_url("https://example.com/item")
            .playlist_title("List")
            .playlist_index(1)
            .build();

        assert_eq!(item.output_dir, base.output_dir);
        assert_eq!(item.format, FormatSpec::flac());
        assert_eq!(item.source_url, "https://example.com/item");
        assert_eq!(item.playlist_index, Some(1));
    }
}
