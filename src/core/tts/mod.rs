mod base;
pub mod openai;

pub use base::{AudioOutputFormat, BaseTTS, TTSConfig, TTSError, TTSResult};
pub use openai::{OPENAI_API_URL, OpenAITTS, OpenAITTSModel, OpenAIVoice};
