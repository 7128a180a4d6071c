use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::{ConfigError, ServerConfig};
use crate::core::tts::AudioOutputFormat;

/// Non-empty value of an environment variable
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env_var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
        None => Ok(None),
    }
}

fn parse_format_env(name: &str) -> Result<Option<AudioOutputFormat>, ConfigError> {
    match env_var(name) {
        Some(value) => AudioOutputFormat::parse(&value)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
        None => Ok(None),
    }
}

/// Build a configuration from defaults overlaid with environment variables.
pub(super) fn load_from_env() -> Result<ServerConfig, ConfigError> {
    let mut config = ServerConfig::default();

    if let Some(host) = env_var("HOST") {
        config.host = host;
    }
    if let Some(port) = parse_env::<u16>("PORT")? {
        config.port = port;
    }
    config.public_host = env_var("PUBLIC_HOST");

    config.deepgram_api_key = env_var("DEEPGRAM_API_KEY");
    config.openai_api_key = env_var("OPENAI_API_KEY");

    if let Some(model) = env_var("DEEPGRAM_MODEL") {
        config.deepgram.model = model;
    }
    if let Some(language) = env_var("DEEPGRAM_LANGUAGE") {
        config.deepgram.language = language;
    }
    if let Some(base_url) = env_var("DEEPGRAM_BASE_URL") {
        config.deepgram.base_url = base_url;
    }

    if let Some(base_url) = env_var("OPENAI_BASE_URL") {
        config.tts.base_url = base_url;
    }
    if let Some(model) = env_var("OPENAI_TTS_MODEL") {
        config.tts.model = model;
    }
    if let Some(voice) = env_var("OPENAI_TTS_VOICE") {
        config.tts.voice = voice;
    }

    if let Some(format) = parse_format_env("BROWSER_TTS_FORMAT")? {
        config.browser.tts_format = format;
    }
    if let Some(format) = parse_format_env("TELEPHONY_TTS_FORMAT")? {
        config.telephony.tts_format = format;
    }
    if let Some(secs) = parse_env::<u64>("KEEPALIVE_INTERVAL_SECS")? {
        config.browser.keepalive_interval = Some(Duration::from_secs(secs));
    }

    config.twiml.greeting = env_var("TWIML_GREETING");

    Ok(config)
}
