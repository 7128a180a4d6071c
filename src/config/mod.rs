//! Configuration module for the voice relay
//!
//! Configuration comes from environment variables (with `.env` loaded in
//! `main`) and an optional YAML file. Priority: YAML > ENV vars > .env values >
//! defaults.
//!
//! # Modules
//! - `env`: Environment variable loading
//! - `yaml`: YAML configuration file loading and overrides
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voice_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//! println!("Listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::dialogue::{DEFAULT_COMPLETION_NOTICE, DEFAULT_SCRIPT};
use crate::core::stt::deepgram::DEEPGRAM_STT_URL;
use crate::core::tts::AudioOutputFormat;
use crate::core::tts::openai::OPENAI_API_URL;

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Deepgram live transcription settings shared by both transports
#[derive(Debug, Clone, PartialEq)]
pub struct DeepgramSettings {
    pub model: String,
    pub language: String,
    pub smart_format: bool,
    pub base_url: String,
}

impl Default for DeepgramSettings {
    fn default() -> Self {
        Self {
            model: "nova-2".to_string(),
            language: "en-US".to_string(),
            smart_format: true,
            base_url: DEEPGRAM_STT_URL.to_string(),
        }
    }
}

/// OpenAI speech settings shared by both transports
#[derive(Debug, Clone, PartialEq)]
pub struct TtsSettings {
    pub model: String,
    pub voice: String,
    pub speed: f32,
    pub base_url: String,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "shimmer".to_string(),
            speed: 1.0,
            base_url: OPENAI_API_URL.to_string(),
        }
    }
}

/// How one transport is served.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSettings {
    /// WebSocket route
    pub path: String,
    /// Encoding of inbound audio as declared to Deepgram
    pub encoding: String,
    pub sample_rate: u32,
    pub tts_format: AudioOutputFormat,
    /// Transcripts whose trimmed length does not exceed this are noise
    pub noise_threshold: usize,
    pub greet_on_open: bool,
    pub echo_transcripts: bool,
    pub keepalive_interval: Option<Duration>,
}

impl TransportSettings {
    pub fn browser() -> Self {
        Self {
            path: "/ws".to_string(),
            encoding: "linear16".to_string(),
            sample_rate: 16000,
            tts_format: AudioOutputFormat::Mp3,
            noise_threshold: 2,
            greet_on_open: true,
            echo_transcripts: true,
            keepalive_interval: Some(Duration::from_secs(3)),
        }
    }

    pub fn telephony() -> Self {
        Self {
            path: "/stream".to_string(),
            encoding: "mulaw".to_string(),
            sample_rate: 8000,
            tts_format: AudioOutputFormat::Pcm,
            noise_threshold: 1,
            greet_on_open: true,
            echo_transcripts: false,
            keepalive_interval: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSettings {
    pub lines: Vec<String>,
    pub completion_notice: String,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            lines: DEFAULT_SCRIPT.iter().map(|line| line.to_string()).collect(),
            completion_notice: DEFAULT_COMPLETION_NOTICE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwimlSettings {
    /// Routes answering the TwiML handshake
    pub paths: Vec<String>,
    /// Spoken with `<Say>` before the stream connects
    pub greeting: Option<String>,
}

impl Default for TwimlSettings {
    fn default() -> Self {
        Self {
            paths: vec!["/".to_string(), "/voice".to_string()],
            greeting: None,
        }
    }
}

/// Server configuration
///
/// Contains everything needed to run the relay:
/// - Listener settings (host, port, public host for TwiML)
/// - Provider API keys (Deepgram, OpenAI)
/// - Provider settings
/// - Per-transport behaviour (browser, telephony)
/// - The script and TwiML handshake
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Host used in the TwiML stream URL, overriding the request's `Host`
    pub public_host: Option<String>,

    // Provider API keys
    pub deepgram_api_key: Option<String>,
    pub openai_api_key: Option<String>,

    pub deepgram: DeepgramSettings,
    pub tts: TtsSettings,
    pub browser: TransportSettings,
    pub telephony: TransportSettings,
    pub script: ScriptSettings,
    pub twiml: TwimlSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_host: None,
            deepgram_api_key: None,
            openai_api_key: None,
            deepgram: DeepgramSettings::default(),
            tts: TtsSettings::default(),
            browser: TransportSettings::browser(),
            telephony: TransportSettings::telephony(),
            script: ScriptSettings::default(),
            twiml: TwimlSettings::default(),
        }
    }
}

/// Implement Drop to zeroize all secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.deepgram_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and validate it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::load_from_env()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables, then apply the YAML
    /// file on top and validate the result.
    ///
    /// Note: `.env` is loaded in `main` at startup, so its values are seen
    /// here as ordinary environment variables.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        let mut config = env::load_from_env()?;
        yaml_config.apply(&mut config)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn deepgram_key(&self) -> Result<&str, ConfigError> {
        self.deepgram_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("DEEPGRAM_API_KEY"))
    }

    pub fn openai_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)
    }
}
