use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::{ConfigError, ServerConfig, TransportSettings};
use crate::core::tts::AudioOutputFormat;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration; anything set here
/// overrides the environment.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8080
///   public_host: "relay.example.com"
///
/// providers:
///   deepgram_api_key: "your-deepgram-key"
///   openai_api_key: "your-openai-key"
///
/// deepgram:
///   model: "nova-2"
///   language: "en-US"
///
/// tts:
///   voice: "shimmer"
///   speed: 1.0
///
/// browser:
///   path: "/ws"
///   keepalive_interval_secs: 3
///
/// telephony:
///   path: "/stream"
///   tts_format: "pcm"
///
/// script:
///   lines:
///     - "Hello! What business do you run?"
///   completion_notice: "Conversation complete!"
///
/// twiml:
///   paths: ["/", "/voice"]
///   greeting: "Please wait while we connect you"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub providers: Option<ProvidersYaml>,
    pub deepgram: Option<DeepgramYaml>,
    pub tts: Option<TtsYaml>,
    pub browser: Option<TransportYaml>,
    pub telephony: Option<TransportYaml>,
    pub script: Option<ScriptYaml>,
    pub twiml: Option<TwimlYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub public_host: Option<String>,
}

/// Provider API keys from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub deepgram_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DeepgramYaml {
    pub model: Option<String>,
    pub language: Option<String>,
    pub smart_format: Option<bool>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsYaml {
    pub model: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub base_url: Option<String>,
}

/// Per-transport overrides. A `keepalive_interval_secs` of 0 is rejected by
/// validation; omit the key to keep the default.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TransportYaml {
    pub path: Option<String>,
    pub encoding: Option<String>,
    pub sample_rate: Option<u32>,
    pub tts_format: Option<AudioOutputFormat>,
    pub noise_threshold: Option<usize>,
    pub greet_on_open: Option<bool>,
    pub echo_transcripts: Option<bool>,
    pub keepalive_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScriptYaml {
    pub lines: Option<Vec<String>>,
    pub completion_notice: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TwimlYaml {
    pub paths: Option<Vec<String>>,
    pub greeting: Option<String>,
}

impl TransportYaml {
    fn apply(self, settings: &mut TransportSettings) {
        if let Some(path) = self.path {
            settings.path = path;
        }
        if let Some(encoding) = self.encoding {
            settings.encoding = encoding;
        }
        if let Some(sample_rate) = self.sample_rate {
            settings.sample_rate = sample_rate;
        }
        if let Some(format) = self.tts_format {
            settings.tts_format = format;
        }
        if let Some(threshold) = self.noise_threshold {
            settings.noise_threshold = threshold;
        }
        if let Some(greet) = self.greet_on_open {
            settings.greet_on_open = greet;
        }
        if let Some(echo) = self.echo_transcripts {
            settings.echo_transcripts = echo;
        }
        if let Some(secs) = self.keepalive_interval_secs {
            settings.keepalive_interval = Some(Duration::from_secs(secs));
        }
    }
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Overlay every value present in the file onto `config`.
    pub fn apply(self, config: &mut ServerConfig) -> Result<(), ConfigError> {
        if let Some(server) = self.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
            if server.public_host.is_some() {
                config.public_host = server.public_host;
            }
        }

        if let Some(providers) = self.providers {
            if providers.deepgram_api_key.is_some() {
                config.deepgram_api_key = providers.deepgram_api_key;
            }
            if providers.openai_api_key.is_some() {
                config.openai_api_key = providers.openai_api_key;
            }
        }

        if let Some(deepgram) = self.deepgram {
            if let Some(model) = deepgram.model {
                config.deepgram.model = model;
            }
            if let Some(language) = deepgram.language {
                config.deepgram.language = language;
            }
            if let Some(smart_format) = deepgram.smart_format {
                config.deepgram.smart_format = smart_format;
            }
            if let Some(base_url) = deepgram.base_url {
                config.deepgram.base_url = base_url;
            }
        }

        if let Some(tts) = self.tts {
            if let Some(model) = tts.model {
                config.tts.model = model;
            }
            if let Some(voice) = tts.voice {
                config.tts.voice = voice;
            }
            if let Some(speed) = tts.speed {
                if !(0.25..=4.0).contains(&speed) {
                    return Err(ConfigError::InvalidValue {
                        name: "tts.speed".to_string(),
                        value: speed.to_string(),
                    });
                }
                config.tts.speed = speed;
            }
            if let Some(base_url) = tts.base_url {
                config.tts.base_url = base_url;
            }
        }

        if let Some(browser) = self.browser {
            browser.apply(&mut config.browser);
        }
        if let Some(telephony) = self.telephony {
            telephony.apply(&mut config.telephony);
        }

        if let Some(script) = self.script {
            if let Some(lines) = script.lines {
                config.script.lines = lines;
            }
            if let Some(notice) = script.completion_notice {
                config.script.completion_notice = notice;
            }
        }

        if let Some(twiml) = self.twiml {
            if let Some(paths) = twiml.paths {
                config.twiml.paths = paths;
            }
            if twiml.greeting.is_some() {
                config.twiml.greeting = twiml.greeting;
            }
        }

        Ok(())
    }
}
