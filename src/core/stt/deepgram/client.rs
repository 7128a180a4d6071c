//! Deepgram live transcription WebSocket client.
//!
//! Audio and control messages share one ordered queue drained by a single
//! connection task, so a `CloseStream` issued by [`finish`](BaseSTT::finish)
//! is always delivered after every audio frame pushed before it.
//!
//! ```text
//! send_audio() ─┐
//! keep_alive() ─┼─▶ outgoing (mpsc) ─▶ connection task ─▶ Deepgram
//! finish()     ─┘                            │
//!                                            ▼
//!                               events (mpsc) ─▶ session
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, warn};

use super::config::DeepgramSTTConfig;
use super::messages::{ControlMessage, DeepgramMessage};
use crate::core::stt::base::{
    BaseSTT, STTConfig, STTConnectionState, STTError, STTEvent, STTFactory, STTResult,
};

/// Minimum supported sample rate (8kHz for telephony)
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Maximum supported sample rate
pub const MAX_SAMPLE_RATE: u32 = 48000;

/// How long `finish` waits for Deepgram to flush final results and close.
const FINISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounded so a stalled connection applies backpressure to the session.
const OUTGOING_CAPACITY: usize = 64;

enum Outgoing {
    Audio(Bytes),
    Control(ControlMessage),
}

/// Deepgram streaming STT client. One instance per session.
pub struct DeepgramSTT {
    config: DeepgramSTTConfig,
    state: Arc<AtomicU8>,
    outgoing: Option<mpsc::Sender<Outgoing>>,
    connection_handle: Option<JoinHandle<()>>,
}

impl DeepgramSTT {
    pub fn new(config: DeepgramSTTConfig) -> Result<Self, STTError> {
        if config.base.api_key.is_empty() {
            return Err(STTError::AuthenticationFailed(
                "API key is required for Deepgram STT".to_string(),
            ));
        }

        let sample_rate = config.base.sample_rate;
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(STTError::ConfigurationError(format!(
                "Sample rate {sample_rate} Hz is outside supported range ({MIN_SAMPLE_RATE}-{MAX_SAMPLE_RATE} Hz)"
            )));
        }

        // Fail fast on a bad endpoint instead of inside the connection task
        config.build_websocket_url()?;

        Ok(Self {
            config,
            state: Arc::new(AtomicU8::new(STTConnectionState::Closed as u8)),
            outgoing: None,
            connection_handle: None,
        })
    }

    fn set_state(&self, state: STTConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn build_request(
        &self,
    ) -> Result<tungstenite::handshake::client::Request, STTError> {
        let url = self.config.build_websocket_url()?;
        let mut request = url.as_str().into_client_request().map_err(|e| {
            STTError::ConfigurationError(format!("Failed to create WebSocket request: {e}"))
        })?;

        let auth = HeaderValue::from_str(&format!("Token {}", self.config.base.api_key))
            .map_err(|_| {
                STTError::AuthenticationFailed("API key contains invalid characters".to_string())
            })?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        Ok(request)
    }

    async fn enqueue(&self, item: Outgoing) -> Result<(), STTError> {
        let sender = self.outgoing.as_ref().ok_or_else(|| {
            STTError::ConnectionFailed("Not connected to Deepgram".to_string())
        })?;
        sender
            .send(item)
            .await
            .map_err(|_| STTError::NetworkError("Deepgram connection task has ended".to_string()))
    }
}

/// Map a handshake failure to the matching STT error.
fn classify_connect_error(err: tungstenite::Error) -> STTError {
    match err {
        tungstenite::Error::Http(response) => match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => STTError::AuthenticationFailed(
                format!("Deepgram rejected credentials ({})", response.status()),
            ),
            status => {
                STTError::ConnectionFailed(format!("Deepgram handshake failed with {status}"))
            }
        },
        other => STTError::ConnectionFailed(format!("Failed to connect to Deepgram: {other}")),
    }
}

/// Handle one server frame. Returns `false` once the server closed the stream.
async fn handle_server_message(message: Message, events: &mpsc::Sender<STTEvent>) -> bool {
    match message {
        Message::Text(text) => match DeepgramMessage::parse(&text) {
            Ok(DeepgramMessage::Results(results)) => {
                let Some(alternative) = results.first_alternative() else {
                    debug!("Deepgram result without alternatives");
                    return true;
                };
                debug!(
                    transcript = %alternative.transcript,
                    is_final = results.is_final,
                    "Deepgram result"
                );
                let result = STTResult::new(
                    alternative.transcript.clone(),
                    results.is_final,
                    results.speech_final,
                    (alternative.confidence as f32).clamp(0.0, 1.0),
                );
                let _ = events.send(STTEvent::Transcript(result)).await;
            }
            Ok(DeepgramMessage::Metadata(metadata)) => {
                debug!(request_id = ?metadata.request_id, "Deepgram metadata");
            }
            Ok(DeepgramMessage::SpeechStarted) => debug!("Deepgram speech started"),
            Ok(DeepgramMessage::UtteranceEnd) => debug!("Deepgram utterance end"),
            Ok(DeepgramMessage::Error(err)) => {
                let text = err.text();
                error!("Deepgram error: {}", text);
                let _ = events.send(STTEvent::Error(STTError::ProviderError(text))).await;
            }
            Ok(DeepgramMessage::Unknown) => debug!("Unknown Deepgram message: {}", text.as_str()),
            Err(e) => warn!("Failed to parse Deepgram message: {}", e),
        },
        Message::Close(frame) => {
            info!("Deepgram closed the stream: {:?}", frame);
            return false;
        }
        Message::Binary(_) => debug!("Unexpected binary frame from Deepgram"),
        _ => {}
    }
    true
}

#[async_trait::async_trait]
impl BaseSTT for DeepgramSTT {
    async fn connect(&mut self, events: mpsc::Sender<STTEvent>) -> Result<(), STTError> {
        if self.connection_handle.is_some() {
            return Err(STTError::ConnectionFailed(
                "Deepgram session already started".to_string(),
            ));
        }

        let request = self.build_request()?;
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Outgoing>(OUTGOING_CAPACITY);
        let state = self.state.clone();

        self.set_state(STTConnectionState::Connecting);
        self.outgoing = Some(outgoing_tx);

        let handle = tokio::spawn(async move {
            let ws_stream = match connect_async(request).await {
                Ok((ws_stream, _response)) => ws_stream,
                Err(e) => {
                    let stt_error = classify_connect_error(e);
                    error!("{}", stt_error);
                    state.store(STTConnectionState::Closed as u8, Ordering::Release);
                    let _ = events.send(STTEvent::Error(stt_error)).await;
                    let _ = events.send(STTEvent::Close).await;
                    return;
                }
            };

            info!("Connected to Deepgram STT WebSocket");
            state.store(STTConnectionState::Open as u8, Ordering::Release);
            let _ = events.send(STTEvent::Open).await;

            let (mut ws_sink, mut ws_stream) = ws_stream.split();
            let mut outgoing_open = true;

            loop {
                tokio::select! {
                    item = outgoing_rx.recv(), if outgoing_open => {
                        let message = match item {
                            Some(Outgoing::Audio(audio)) => Message::Binary(audio),
                            Some(Outgoing::Control(control)) => {
                                if control == ControlMessage::CloseStream {
                                    state.store(STTConnectionState::Closing as u8, Ordering::Release);
                                }
                                match control.to_json() {
                                    Ok(json) => Message::Text(json.into()),
                                    Err(e) => {
                                        warn!("Failed to encode Deepgram control message: {}", e);
                                        continue;
                                    }
                                }
                            }
                            None => {
                                // Client dropped; keep reading until Deepgram closes
                                outgoing_open = false;
                                continue;
                            }
                        };
                        if let Err(e) = ws_sink.send(message).await {
                            let stt_error = STTError::NetworkError(format!(
                                "Failed to send to Deepgram: {e}"
                            ));
                            error!("{}", stt_error);
                            let _ = events.send(STTEvent::Error(stt_error)).await;
                            break;
                        }
                    }

                    message = ws_stream.next() => {
                        match message {
                            Some(Ok(msg)) => {
                                if !handle_server_message(msg, &events).await {
                                    break;
                                }
                            }
                            Some(Err(e)) => {
                                let stt_error = STTError::NetworkError(format!("WebSocket error: {e}"));
                                error!("{}", stt_error);
                                let _ = events.send(STTEvent::Error(stt_error)).await;
                                break;
                            }
                            None => {
                                info!("Deepgram WebSocket stream ended");
                                break;
                            }
                        }
                    }
                }
            }

            state.store(STTConnectionState::Closed as u8, Ordering::Release);
            let _ = events.send(STTEvent::Close).await;
            info!("Deepgram STT WebSocket connection closed");
        });

        self.connection_handle = Some(handle);
        Ok(())
    }

    fn connection_state(&self) -> STTConnectionState {
        STTConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    async fn send_audio(&mut self, audio_data: Bytes) -> Result<(), STTError> {
        if !self.is_ready() {
            return Err(STTError::ConnectionFailed(format!(
                "Deepgram connection is {}",
                self.connection_state()
            )));
        }
        self.enqueue(Outgoing::Audio(audio_data)).await
    }

    async fn keep_alive(&mut self) -> Result<(), STTError> {
        if !self.is_ready() {
            return Err(STTError::ConnectionFailed(format!(
                "Deepgram connection is {}",
                self.connection_state()
            )));
        }
        debug!("Sending Deepgram KeepAlive");
        self.enqueue(Outgoing::Control(ControlMessage::KeepAlive))
            .await
    }

    async fn finish(&mut self) -> Result<(), STTError> {
        let Some(mut handle) = self.connection_handle.take() else {
            self.outgoing = None;
            return Ok(());
        };

        if self.connection_state() == STTConnectionState::Connecting {
            debug!("Deepgram still connecting, aborting connection task");
            handle.abort();
            self.outgoing = None;
            self.set_state(STTConnectionState::Closed);
            return Ok(());
        }

        if let Some(sender) = self.outgoing.take() {
            // The task may already be gone if Deepgram closed first
            let _ = sender
                .send(Outgoing::Control(ControlMessage::CloseStream))
                .await;
        }

        match timeout(FINISH_TIMEOUT, &mut handle).await {
            Ok(_) => debug!("Deepgram connection task finished"),
            Err(_) => {
                warn!("Timed out waiting for Deepgram to close, aborting");
                handle.abort();
            }
        }
        self.set_state(STTConnectionState::Closed);
        Ok(())
    }

    fn get_config(&self) -> &STTConfig {
        &self.config.base
    }

    fn get_provider_info(&self) -> &'static str {
        "Deepgram Live Transcription"
    }
}

impl Drop for DeepgramSTT {
    fn drop(&mut self) {
        if let Some(handle) = self.connection_handle.take() {
            handle.abort();
        }
    }
}

/// Builds a [`DeepgramSTT`] for each session against a fixed endpoint.
#[derive(Debug, Clone)]
pub struct DeepgramSTTFactory {
    base_url: String,
}

impl DeepgramSTTFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for DeepgramSTTFactory {
    fn default() -> Self {
        Self::new(super::config::DEEPGRAM_STT_URL)
    }
}

impl STTFactory for DeepgramSTTFactory {
    fn create(&self, config: STTConfig) -> Result<Box<dyn BaseSTT>, STTError> {
        let config = DeepgramSTTConfig::from_base(config).with_base_url(self.base_url.clone());
        Ok(Box::new(DeepgramSTT::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> STTConfig {
        STTConfig {
            api_key: "dg-test-key".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = DeepgramSTT::new(DeepgramSTTConfig::default());
        assert!(matches!(result, Err(STTError::AuthenticationFailed(_))));
    }

    #[test]
    fn test_new_rejects_unsupported_sample_rate() {
        let config = DeepgramSTTConfig::from_base(STTConfig {
            sample_rate: 4000,
            ..config_with_key()
        });
        assert!(matches!(
            DeepgramSTT::new(config),
            Err(STTError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_new_client_is_not_ready() {
        let stt = DeepgramSTT::new(DeepgramSTTConfig::from_base(config_with_key())).unwrap();
        assert_eq!(stt.connection_state(), STTConnectionState::Closed);
        assert!(!stt.is_ready());
        assert_eq!(stt.get_provider_info(), "Deepgram Live Transcription");
        assert_eq!(stt.get_config().api_key, "dg-test-key");
    }

    #[test]
    fn test_request_carries_token_auth() {
        let stt = DeepgramSTT::new(DeepgramSTTConfig::from_base(config_with_key())).unwrap();
        let request = stt.build_request().unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Token dg-test-key"
        );
        assert_eq!(request.uri().path(), "/v1/listen");
    }

    #[tokio::test]
    async fn test_send_audio_before_connect_fails() {
        let mut stt = DeepgramSTT::new(DeepgramSTTConfig::from_base(config_with_key())).unwrap();
        let result = stt.send_audio(Bytes::from_static(&[0u8; 320])).await;
        assert!(matches!(result, Err(STTError::ConnectionFailed(_))));
        assert!(stt.keep_alive().await.is_err());
    }

    #[tokio::test]
    async fn test_finish_without_connect_is_noop() {
        let mut stt = DeepgramSTT::new(DeepgramSTTConfig::from_base(config_with_key())).unwrap();
        assert!(stt.finish().await.is_ok());
        assert!(stt.finish().await.is_ok());
    }

    #[test]
    fn test_factory_propagates_validation() {
        let factory = DeepgramSTTFactory::default();
        assert!(factory.create(STTConfig::default()).is_err());
        let stt = factory.create(config_with_key()).unwrap();
        assert_eq!(stt.connection_state(), STTConnectionState::Closed);
    }
}
