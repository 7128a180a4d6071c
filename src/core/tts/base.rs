use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Errors raised by text-to-speech providers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TTSError {
    #[error("Invalid TTS configuration: {0}")]
    InvalidConfiguration(String),
    #[error("TTS connection failed: {0}")]
    ConnectionFailed(String),
    #[error("TTS network error: {0}")]
    NetworkError(String),
    #[error("TTS provider error: {0}")]
    ProviderError(String),
    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),
    #[error("Internal TTS error: {0}")]
    InternalError(String),
}

pub type TTSResult<T> = Result<T, TTSError>;

/// Provider-agnostic TTS configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TTSConfig {
    pub api_key: String,
    pub model: String,
    pub voice_id: Option<String>,
    /// 1.0 is normal speed
    pub speaking_rate: Option<f32>,
    /// Override for the provider's HTTP endpoint root
    pub base_url: Option<String>,
}

/// Encoded audio formats a provider can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioOutputFormat {
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
    /// Raw 16-bit little-endian PCM
    Pcm,
}

impl AudioOutputFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
        }
    }

    #[inline]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Opus => "audio/opus",
            Self::Aac => "audio/aac",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
            Self::Pcm => "audio/pcm",
        }
    }

    /// Strict parse used for configuration values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mp3" | "mpeg" => Some(Self::Mp3),
            "opus" => Some(Self::Opus),
            "aac" => Some(Self::Aac),
            "flac" => Some(Self::Flac),
            "wav" => Some(Self::Wav),
            "pcm" | "linear16" | "raw" => Some(Self::Pcm),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioOutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One-shot text-to-speech.
///
/// A single instance is shared by every session, so implementations must be
/// usable concurrently through `&self`.
#[async_trait]
pub trait BaseTTS: Send + Sync {
    /// Synthesize `text` and return the whole encoded clip.
    async fn synthesize(&self, text: &str, format: AudioOutputFormat) -> TTSResult<Bytes>;

    fn get_provider_info(&self) -> &'static str;
}
