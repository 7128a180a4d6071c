use std::sync::Arc;

use crate::config::{ServerConfig, TransportSettings};
use crate::core::dialogue::ScriptedDialogue;
use crate::core::stt::{DeepgramSTTFactory, STTConfig, STTFactory};
use crate::core::tts::{BaseTTS, OpenAITTS, TTSConfig};
use crate::errors::AppResult;
use crate::session::{SessionContext, SessionSettings, TransportKind};

/// Process-wide state shared by every route.
///
/// Providers sit behind traits so tests can swap in fakes through
/// [`AppState::with_providers`].
pub struct AppState {
    pub config: ServerConfig,
    pub dialogue: ScriptedDialogue,
    stt_factory: Arc<dyn STTFactory>,
    tts: Arc<dyn BaseTTS>,
}

impl AppState {
    /// Build state with the Deepgram and OpenAI clients.
    pub fn new(config: ServerConfig) -> AppResult<Arc<Self>> {
        config.validate()?;

        let tts = OpenAITTS::new(TTSConfig {
            api_key: config.openai_key()?.to_string(),
            model: config.tts.model.clone(),
            voice_id: Some(config.tts.voice.clone()),
            speaking_rate: Some(config.tts.speed),
            base_url: Some(config.tts.base_url.clone()),
        })?;
        let stt_factory = DeepgramSTTFactory::new(config.deepgram.base_url.clone());

        Ok(Self::with_providers(
            config,
            Arc::new(stt_factory),
            Arc::new(tts),
        ))
    }

    pub fn with_providers(
        config: ServerConfig,
        stt_factory: Arc<dyn STTFactory>,
        tts: Arc<dyn BaseTTS>,
    ) -> Arc<Self> {
        let dialogue = ScriptedDialogue::new(config.script.lines.iter().cloned());
        Arc::new(Self {
            config,
            dialogue,
            stt_factory,
            tts,
        })
    }

    pub fn transport_settings(&self, kind: TransportKind) -> &TransportSettings {
        match kind {
            TransportKind::Browser => &self.config.browser,
            TransportKind::Telephony => &self.config.telephony,
        }
    }

    /// Session behaviour for one transport, derived from configuration.
    pub fn session_settings(&self, kind: TransportKind) -> SessionSettings {
        let transport = self.transport_settings(kind);
        let deepgram = &self.config.deepgram;

        SessionSettings {
            kind,
            stt: STTConfig {
                api_key: self.config.deepgram_api_key.clone().unwrap_or_default(),
                model: deepgram.model.clone(),
                language: deepgram.language.clone(),
                encoding: transport.encoding.clone(),
                sample_rate: transport.sample_rate,
                channels: 1,
                smart_format: deepgram.smart_format,
                interim_results: false,
            },
            tts_format: transport.tts_format,
            noise_threshold: transport.noise_threshold,
            greet_on_open: transport.greet_on_open,
            echo_transcripts: transport.echo_transcripts,
            keepalive_interval: transport.keepalive_interval,
            completion_notice: self.config.script.completion_notice.clone(),
        }
    }

    pub fn session_context(&self, kind: TransportKind) -> SessionContext {
        SessionContext {
            dialogue: self.dialogue.clone(),
            stt_factory: self.stt_factory.clone(),
            tts: self.tts.clone(),
            settings: self.session_settings(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::AudioOutputFormat;

    fn keyed_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.deepgram_api_key = Some("dg".to_string());
        config.openai_api_key = Some("sk".to_string());
        config
    }

    #[test]
    fn test_new_requires_valid_config() {
        assert!(AppState::new(ServerConfig::default()).is_err());
        assert!(AppState::new(keyed_config()).is_ok());
    }

    #[test]
    fn test_browser_session_settings() {
        let state = AppState::new(keyed_config()).unwrap();
        let settings = state.session_settings(TransportKind::Browser);

        assert_eq!(settings.stt.api_key, "dg");
        assert_eq!(settings.stt.encoding, "linear16");
        assert_eq!(settings.stt.sample_rate, 16000);
        assert!(!settings.stt.interim_results);
        assert_eq!(settings.tts_format, AudioOutputFormat::Mp3);
        assert_eq!(settings.noise_threshold, 2);
        assert!(settings.echo_transcripts);
        assert!(settings.keepalive_interval.is_some());
    }

    #[test]
    fn test_telephony_session_settings() {
        let state = AppState::new(keyed_config()).unwrap();
        let settings = state.session_settings(TransportKind::Telephony);

        assert_eq!(settings.stt.encoding, "mulaw");
        assert_eq!(settings.stt.sample_rate, 8000);
        assert_eq!(settings.tts_format, AudioOutputFormat::Pcm);
        assert_eq!(settings.noise_threshold, 1);
        assert!(!settings.echo_transcripts);
        assert!(settings.keepalive_interval.is_none());
        assert_eq!(
            settings.completion_notice,
            "Conversation complete! Thanks for testing."
        );
    }

    #[test]
    fn test_dialogue_follows_configured_script() {
        let mut config = keyed_config();
        config.script.lines = vec!["only line".to_string()];
        let state = AppState::new(config).unwrap();
        assert_eq!(state.dialogue.len(), 1);
        assert_eq!(state.dialogue.line(0), Some("only line"));
    }
}
