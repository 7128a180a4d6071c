//! OpenAI TTS provider implementation.
//!
//! - Endpoint: `POST {base}/v1/audio/speech`
//! - Auth: `Authorization: Bearer <key>`
//! - Output: mp3, opus, aac, flac, wav, pcm (24kHz)
//! - Speed: 0.25 to 4.0

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use tracing::debug;

use super::config::{OpenAITTSModel, OpenAIVoice};
use crate::core::tts::base::{AudioOutputFormat, BaseTTS, TTSConfig, TTSError, TTSResult};

/// Default OpenAI API root
pub const OPENAI_API_URL: &str = "https://api.openai.com";

const SPEECH_PATH: &str = "/v1/audio/speech";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenAI speech synthesis over HTTPS. Cheap to share behind an `Arc`.
pub struct OpenAITTS {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: OpenAITTSModel,
    voice: OpenAIVoice,
    speed: f32,
}

impl OpenAITTS {
    pub fn new(config: TTSConfig) -> TTSResult<Self> {
        if config.api_key.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "API key is required for OpenAI TTS".to_string(),
            ));
        }

        let model = if config.model.trim().is_empty() {
            OpenAITTSModel::default()
        } else {
            OpenAITTSModel::parse(&config.model).ok_or_else(|| {
                TTSError::InvalidConfiguration(format!(
                    "Unknown OpenAI TTS model '{}'",
                    config.model
                ))
            })?
        };

        let voice = match config.voice_id.as_deref() {
            Some(name) => OpenAIVoice::parse(name).ok_or_else(|| {
                TTSError::InvalidConfiguration(format!("Unknown OpenAI voice '{name}'"))
            })?,
            None => OpenAIVoice::default(),
        };

        let speed = config.speaking_rate.unwrap_or(1.0).clamp(0.25, 4.0);

        let base = config.base_url.as_deref().unwrap_or(OPENAI_API_URL);
        let endpoint = format!("{}{SPEECH_PATH}", base.trim_end_matches('/'));
        reqwest::Url::parse(&endpoint).map_err(|e| {
            TTSError::InvalidConfiguration(format!("Invalid OpenAI URL '{base}': {e}"))
        })?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TTSError::InternalError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key,
            endpoint,
            model,
            voice,
            speed,
        })
    }

    pub fn model(&self) -> OpenAITTSModel {
        self.model
    }

    pub fn voice(&self) -> OpenAIVoice {
        self.voice
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, text: &str, format: AudioOutputFormat) -> serde_json::Value {
        let mut body = json!({
            "model": self.model.as_str(),
            "input": text,
            "voice": self.voice.as_str(),
            "response_format": format.as_str(),
        });

        // Add speed if not default (1.0)
        if (self.speed - 1.0).abs() > 0.001 {
            body["speed"] = json!(self.speed);
        }
        body
    }
}

#[async_trait]
impl BaseTTS for OpenAITTS {
    async fn synthesize(&self, text: &str, format: AudioOutputFormat) -> TTSResult<Bytes> {
        if text.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Cannot synthesize empty text".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text, format))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    TTSError::ConnectionFailed(e.to_string())
                } else {
                    TTSError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TTSError::ProviderError(format!(
                "OpenAI TTS returned {status}: {body}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TTSError::AudioGenerationFailed(format!("Failed to read audio: {e}")))?;

        debug!(
            bytes = audio.len(),
            format = %format,
            "OpenAI TTS synthesis complete"
        );
        Ok(audio)
    }

    fn get_provider_info(&self) -> &'static str {
        "OpenAI Audio Speech"
    }
}
