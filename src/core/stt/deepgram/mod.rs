//! Deepgram live transcription integration.
//!
//! - [`config`]: endpoint and query parameter construction
//! - [`messages`]: server result types and client control messages
//! - [`client`]: the streaming [`DeepgramSTT`] client and its factory

mod client;
mod config;
mod messages;

pub use client::{DeepgramSTT, DeepgramSTTFactory, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
pub use config::{DEEPGRAM_STT_URL, DeepgramSTTConfig};
pub use messages::{ControlMessage, DeepgramMessage, ResultsMessage};
