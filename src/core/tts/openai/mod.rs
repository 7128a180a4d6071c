//! OpenAI text-to-speech via the Audio Speech API.
//!
//! Models: `tts-1`, `tts-1-hd`, `gpt-4o-mini-tts`.
//! Voices: alloy, coral, echo, fable, nova, onyx, sage, shimmer.

mod config;
mod provider;

pub use config::{OpenAITTSModel, OpenAIVoice};
pub use provider::{OPENAI_API_URL, OpenAITTS};
