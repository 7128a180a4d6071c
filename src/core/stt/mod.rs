mod base;
pub mod deepgram;

pub use base::{
    BaseSTT, STTConfig, STTConnectionState, STTError, STTEvent, STTFactory, STTResult,
};

pub use deepgram::{DeepgramSTT, DeepgramSTTConfig, DeepgramSTTFactory};
