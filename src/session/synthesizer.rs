use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::core::tts::{AudioOutputFormat, BaseTTS};

/// Turns script lines into audio for one transport.
///
/// Failures are logged and reported as `None`; a turn without audio does
/// not end the session.
#[derive(Clone)]
pub struct ResponseSynthesizer {
    tts: Arc<dyn BaseTTS>,
    format: AudioOutputFormat,
}

impl ResponseSynthesizer {
    pub fn new(tts: Arc<dyn BaseTTS>, format: AudioOutputFormat) -> Self {
        Self { tts, format }
    }

    pub fn format(&self) -> AudioOutputFormat {
        self.format
    }

    /// Owned future so it can be queued while the session keeps running.
    pub fn synthesize(&self, text: String) -> BoxFuture<'static, Option<Bytes>> {
        let tts = self.tts.clone();
        let format = self.format;
        async move {
            match tts.synthesize(&text, format).await {
                Ok(audio) if audio.is_empty() => {
                    warn!(provider = tts.get_provider_info(), "TTS returned no audio");
                    None
                }
                Ok(audio) => {
                    debug!(bytes = audio.len(), %format, "Synthesized response");
                    Some(audio)
                }
                Err(e) => {
                    warn!(provider = tts.get_provider_info(), error = %e, "TTS synthesis failed");
                    None
                }
            }
        }
        .boxed()
    }
}
