use std::collections::HashSet;
use std::time::Duration;

use super::{ConfigError, ServerConfig, TransportSettings, TtsSettings};
use crate::core::tts::{OpenAITTSModel, OpenAIVoice};

/// Route owned by the health check
const HEALTH_PATH: &str = "/health";

pub(super) fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    config.deepgram_key()?;
    config.openai_key()?;

    validate_tts(&config.tts)?;
    validate_transport("browser", &config.browser)?;
    validate_transport("telephony", &config.telephony)?;
    validate_routes(config)?;

    if config.script.lines.is_empty() {
        return Err(ConfigError::Invalid(
            "script must contain at least one line".to_string(),
        ));
    }
    if config.script.lines.iter().any(|line| line.trim().is_empty()) {
        return Err(ConfigError::Invalid(
            "script lines must not be blank".to_string(),
        ));
    }

    Ok(())
}

fn validate_tts(tts: &TtsSettings) -> Result<(), ConfigError> {
    if OpenAITTSModel::parse(&tts.model).is_none() {
        return Err(ConfigError::InvalidValue {
            name: "tts.model".to_string(),
            value: tts.model.clone(),
        });
    }
    if OpenAIVoice::parse(&tts.voice).is_none() {
        return Err(ConfigError::InvalidValue {
            name: "tts.voice".to_string(),
            value: tts.voice.clone(),
        });
    }
    Ok(())
}

fn validate_transport(name: &str, settings: &TransportSettings) -> Result<(), ConfigError> {
    if !settings.path.starts_with('/') {
        return Err(ConfigError::Invalid(format!(
            "{name} path '{}' must start with '/'",
            settings.path
        )));
    }
    if settings.sample_rate == 0 {
        return Err(ConfigError::Invalid(format!(
            "{name} sample rate must be positive"
        )));
    }
    if settings.keepalive_interval == Some(Duration::ZERO) {
        return Err(ConfigError::Invalid(format!(
            "{name} keep-alive interval must be positive"
        )));
    }
    Ok(())
}

/// Every route must be absolute and owned by exactly one handler.
fn validate_routes(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.twiml.paths.is_empty() {
        return Err(ConfigError::Invalid(
            "at least one TwiML path is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let routes = [
        HEALTH_PATH,
        config.browser.path.as_str(),
        config.telephony.path.as_str(),
    ]
    .into_iter()
    .chain(config.twiml.paths.iter().map(String::as_str));

    for route in routes {
        if !route.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "route '{route}' must start with '/'"
            )));
        }
        if !seen.insert(route) {
            return Err(ConfigError::Invalid(format!(
                "route '{route}' is configured more than once"
            )));
        }
    }
    Ok(())
}
