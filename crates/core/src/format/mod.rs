//! Target audio formats for extraction.
//!
//! A [`FormatSpec`] is the codec/quality/extension triple handed to the
//! extraction service's audio post-processor. Specs are built through the
//! named factories; [`FormatSpec::resolve`] maps a user-supplied format name
//! onto one of them and never fails.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality token used by lossless formats.
pub const LOSSLESS_QUALITY: &str = "best";

/// Audio codec selectable for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
    Flac,
    Wav,
    Aac,
    Opus,
}

impl AudioCodec {
    /// Codec name as understood by the post-processor.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Aac => "aac",
            Self::Opus => "opus",
        }
    }

    /// File extension produced for this codec.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Aac => "m4a",
            Self::Opus => "opus",
        }
    }

    /// Default quality token for this codec.
    pub fn default_quality(&self) -> &'static str {
        match self {
            Self::Mp3 => "192",
            Self::Aac => "256",
            Self::Opus => "128",
            Self::Flac | Self::Wav => LOSSLESS_QUALITY,
        }
    }

    /// Whether the codec is lossless (quality is ignored).
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Flac | Self::Wav)
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of the requested output audio.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatSpec {
    codec: AudioCodec,
    quality: String,
}

impl FormatSpec {
    fn new(codec: AudioCodec, quality: impl Into<String>) -> Self {
        Self {
            codec,
            quality: quality.into(),
        }
    }

    /// MP3 at the given bitrate token.
    pub fn mp3(quality: impl Into<String>) -> Self {
        Self::new(AudioCodec::Mp3, quality)
    }

    /// FLAC (lossless).
    pub fn flac() -> Self {
        Self::new(AudioCodec::Flac, LOSSLESS_QUALITY)
    }

    /// WAV (lossless).
    pub fn wav() -> Self {
        Self::new(AudioCodec::Wav, LOSSLESS_QUALITY)
    }

    /// AAC in an M4A container.
    pub fn m4a(quality: impl Into<String>) -> Self {
        Self::new(AudioCodec::Aac, quality)
    }

    /// Opus at the given bitrate token.
    pub fn opus(quality: impl Into<String>) -> Self {
        Self::new(AudioCodec::Opus, quality)
    }

    /// Spec for `codec` at its default quality.
    pub fn default_for(codec: AudioCodec) -> Self {
        Self::new(codec, codec.default_quality())
    }

    /// Resolves a format name (case-insensitive) and quality token.
    ///
    /// Unknown names yield MP3 at `quality`. Lossless formats ignore `quality`.
    /// An empty quality falls back to the codec default.
    pub fn resolve(name: &str, quality: &str) -> Self {
        let quality = quality.trim();
        let codec = match name.trim().to_ascii_lowercase().as_str() {
            "mp3" => AudioCodec::Mp3,
            "flac" => AudioCodec::Flac,
            "wav" => AudioCodec::Wav,
            "m4a" | "aac" => AudioCodec::Aac,
            "opus" => AudioCodec::Opus,
            _ => AudioCodec::Mp3,
        };

        if codec.is_lossless() || quality.is_empty() {
            return Self::default_for(codec);
        }

        Self::new(codec, quality)
    }

    pub fn codec(&self) -> AudioCodec {
        self.codec
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn extension(&self) -> &'static str {
        self.codec.extension()
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self::default_for(AudioCodec::Mp3)
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.codec, self.quality)
    }
}
