//! Configuration types for the Deepgram live transcription API.

use url::Url;

use super::super::base::{STTConfig, STTError};

/// Default Deepgram streaming endpoint host
pub const DEEPGRAM_STT_URL: &str = "wss://api.deepgram.com";

/// Path of the live listen endpoint
const LISTEN_PATH: &str = "/v1/listen";

/// Configuration specific to Deepgram live transcription.
///
/// Extends the base [`STTConfig`] with the endpoint to connect to, so tests
/// and self-hosted deployments can point the client elsewhere.
#[derive(Debug, Clone)]
pub struct DeepgramSTTConfig {
    pub base: STTConfig,
    /// WebSocket base URL without the `/v1/listen` path
    pub base_url: String,
}

impl Default for DeepgramSTTConfig {
    fn default() -> Self {
        Self {
            base: STTConfig::default(),
            base_url: DEEPGRAM_STT_URL.to_string(),
        }
    }
}

impl DeepgramSTTConfig {
    pub fn from_base(base: STTConfig) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the listen URL with all query parameters.
    pub fn build_websocket_url(&self) -> Result<Url, STTError> {
        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{LISTEN_PATH}")).map_err(|e| {
            STTError::ConfigurationError(format!("Invalid Deepgram URL '{base}': {e}"))
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(STTError::ConfigurationError(format!(
                "Deepgram URL must use ws:// or wss://, got '{}'",
                url.scheme()
            )));
        }

        url.query_pairs_mut()
            .append_pair("model", &self.base.model)
            .append_pair("language", &self.base.language)
            .append_pair("smart_format", bool_param(self.base.smart_format))
            .append_pair("interim_results", bool_param(self.base.interim_results))
            .append_pair("encoding", &self.base.encoding)
            .append_pair("sample_rate", &self.base.sample_rate.to_string())
            .append_pair("channels", &self.base.channels.to_string());

        Ok(url)
    }
}

#[inline]
fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
