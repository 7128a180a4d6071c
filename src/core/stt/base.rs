use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Errors raised by streaming speech-to-text providers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum STTError {
    #[error("STT configuration error: {0}")]
    ConfigurationError(String),
    #[error("STT authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("STT connection failed: {0}")]
    ConnectionFailed(String),
    #[error("STT network error: {0}")]
    NetworkError(String),
    #[error("STT provider error: {0}")]
    ProviderError(String),
    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),
}

/// Configuration shared by all streaming STT providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct STTConfig {
    pub api_key: String,
    pub model: String,
    pub language: String,
    /// Audio encoding of the frames that will be pushed (e.g. "linear16", "mulaw")
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub smart_format: bool,
    pub interim_results: bool,
}

impl Default for STTConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "nova-2".to_string(),
            language: "en-US".to_string(),
            encoding: "linear16".to_string(),
            sample_rate: 16000,
            channels: 1,
            smart_format: true,
            interim_results: false,
        }
    }
}

/// A recognized piece of speech
#[derive(Debug, Clone, PartialEq)]
pub struct STTResult {
    pub transcript: String,
    pub is_final: bool,
    pub is_speech_final: bool,
    pub confidence: f32,
}

impl STTResult {
    pub fn new(
        transcript: impl Into<String>,
        is_final: bool,
        is_speech_final: bool,
        confidence: f32,
    ) -> Self {
        Self {
            transcript: transcript.into(),
            is_final,
            is_speech_final,
            confidence,
        }
    }
}

/// Lifecycle notifications emitted by a streaming session, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum STTEvent {
    /// The provider is ready to receive audio
    Open,
    Transcript(STTResult),
    /// Non-fatal on its own; a fatal failure is followed by `Close`
    Error(STTError),
    /// Emitted exactly once when the provider connection is gone
    Close,
}

/// Connection state of a streaming session as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum STTConnectionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl STTConnectionState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl std::fmt::Display for STTConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// One streaming transcription session.
///
/// Implementations push [`STTEvent`]s into the sender given to
/// [`connect`](BaseSTT::connect). `Open` arrives once audio can be accepted,
/// and `Close` arrives exactly once when the provider connection ends.
#[async_trait]
pub trait BaseSTT: Send {
    /// Start the provider connection. Returns once the connection attempt is
    /// under way; readiness is reported through `STTEvent::Open`.
    async fn connect(&mut self, events: mpsc::Sender<STTEvent>) -> Result<(), STTError>;

    fn connection_state(&self) -> STTConnectionState;

    fn is_ready(&self) -> bool {
        self.connection_state() == STTConnectionState::Open
    }

    /// Push raw audio bytes, unmodified
    async fn send_audio(&mut self, audio_data: Bytes) -> Result<(), STTError>;

    /// Keep an idle connection from being closed by the provider
    async fn keep_alive(&mut self) -> Result<(), STTError>;

    /// Flush outstanding audio and release the provider connection
    async fn finish(&mut self) -> Result<(), STTError>;

    fn get_config(&self) -> &STTConfig;

    fn get_provider_info(&self) -> &'static str;
}

/// Creates one [`BaseSTT`] per connection.
///
/// Held by the application state so the vendor client can be swapped for a
/// fake in tests.
pub trait STTFactory: Send + Sync {
    fn create(&self, config: STTConfig) -> Result<Box<dyn BaseSTT>, STTError>;
}
