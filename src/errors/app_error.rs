use crate::config::ConfigError;
use crate::core::stt::STTError;
use crate::core::tts::TTSError;

/// Top-level error for building and running the relay
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stt(#[from] STTError),
    #[error(transparent)]
    Tts(#[from] TTSError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
