//! Fake providers shared by the integration tests.
//!
//! `FakeSttProbe` is the test's handle on every STT session the factory
//! creates: it records forwarded audio, keep-alives and `finish` calls, and
//! lets the test inject provider events.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::Message;
use bytes::Bytes;
use futures::StreamExt;
use futures::channel::mpsc as futures_mpsc;
use tokio::sync::mpsc;

use voice_relay::ServerConfig;
use voice_relay::core::stt::{
    BaseSTT, STTConfig, STTConnectionState, STTError, STTEvent, STTFactory, STTResult,
};
use voice_relay::core::tts::{AudioOutputFormat, BaseTTS, TTSError, TTSResult};

pub const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Default)]
pub struct FakeSttProbe {
    events: Mutex<Option<mpsc::Sender<STTEvent>>>,
    open: AtomicBool,
    connected: AtomicUsize,
    audio: Mutex<Vec<Bytes>>,
    keepalives: AtomicUsize,
    finishes: AtomicUsize,
    configs: Mutex<Vec<STTConfig>>,
}

impl FakeSttProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait until a session has called `connect`.
    pub async fn wait_connected(&self) {
        self.wait_for(|probe| probe.connected.load(Ordering::SeqCst) > 0)
            .await;
    }

    /// Mark the provider ready and emit `Open`.
    pub async fn open(&self) {
        self.wait_connected().await;
        self.open.store(true, Ordering::SeqCst);
        self.emit(STTEvent::Open).await;
    }

    pub async fn final_transcript(&self, text: &str) {
        self.emit(STTEvent::Transcript(STTResult::new(text, true, true, 0.95)))
            .await;
    }

    pub async fn interim_transcript(&self, text: &str) {
        self.emit(STTEvent::Transcript(STTResult::new(text, false, false, 0.5)))
            .await;
    }

    /// Simulate the provider hanging up.
    pub async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.emit(STTEvent::Close).await;
    }

    pub async fn emit(&self, event: STTEvent) {
        let sender = self.events.lock().unwrap().clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }

    pub fn audio(&self) -> Vec<Bytes> {
        self.audio.lock().unwrap().clone()
    }

    pub fn keepalives(&self) -> usize {
        self.keepalives.load(Ordering::SeqCst)
    }

    pub fn finishes(&self) -> usize {
        self.finishes.load(Ordering::SeqCst)
    }

    pub fn configs(&self) -> Vec<STTConfig> {
        self.configs.lock().unwrap().clone()
    }

    pub async fn wait_for(&self, condition: impl Fn(&Self) -> bool) {
        tokio::time::timeout(FRAME_TIMEOUT, async {
            while !condition(self) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }
}

pub struct FakeSttFactory {
    pub probe: Arc<FakeSttProbe>,
    pub fail_connect: bool,
}

impl FakeSttFactory {
    pub fn new(probe: Arc<FakeSttProbe>) -> Arc<Self> {
        Arc::new(Self {
            probe,
            fail_connect: false,
        })
    }

    pub fn failing(probe: Arc<FakeSttProbe>) -> Arc<Self> {
        Arc::new(Self {
            probe,
            fail_connect: true,
        })
    }
}

impl STTFactory for FakeSttFactory {
    fn create(&self, config: STTConfig) -> Result<Box<dyn BaseSTT>, STTError> {
        self.probe.configs.lock().unwrap().push(config.clone());
        Ok(Box::new(FakeStt {
            probe: self.probe.clone(),
            config,
            fail_connect: self.fail_connect,
        }))
    }
}

struct FakeStt {
    probe: Arc<FakeSttProbe>,
    config: STTConfig,
    fail_connect: bool,
}

#[async_trait]
impl BaseSTT for FakeStt {
    async fn connect(&mut self, events: mpsc::Sender<STTEvent>) -> Result<(), STTError> {
        if self.fail_connect {
            return Err(STTError::ConnectionFailed("refused".to_string()));
        }
        *self.probe.events.lock().unwrap() = Some(events);
        self.probe.connected.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn connection_state(&self) -> STTConnectionState {
        if self.probe.open.load(Ordering::SeqCst) {
            STTConnectionState::Open
        } else {
            STTConnectionState::Connecting
        }
    }

    async fn send_audio(&mut self, audio_data: Bytes) -> Result<(), STTError> {
        self.probe.audio.lock().unwrap().push(audio_data);
        Ok(())
    }

    async fn keep_alive(&mut self) -> Result<(), STTError> {
        self.probe.keepalives.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), STTError> {
        self.probe.open.store(false, Ordering::SeqCst);
        self.probe.finishes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get_config(&self) -> &STTConfig {
        &self.config
    }

    fn get_provider_info(&self) -> &'static str {
        "fake"
    }
}

/// TTS that answers `audio:<text>` and records each request.
#[derive(Default)]
pub struct EchoTTS {
    pub requests: Mutex<Vec<(String, AudioOutputFormat)>>,
    pub fail: bool,
}

impl EchoTTS {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn audio_for(text: &str) -> Bytes {
        Bytes::from(format!("audio:{text}"))
    }
}

#[async_trait]
impl BaseTTS for EchoTTS {
    async fn synthesize(&self, text: &str, format: AudioOutputFormat) -> TTSResult<Bytes> {
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), format));
        if self.fail {
            return Err(TTSError::ProviderError("synthesis down".to_string()));
        }
        Ok(Self::audio_for(text))
    }

    fn get_provider_info(&self) -> &'static str {
        "echo"
    }
}

pub fn keyed_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.deepgram_api_key = Some("test-deepgram-key".to_string());
    config.openai_api_key = Some("test-openai-key".to_string());
    config
}

/// Next frame the session wrote to the client, failing the test on timeout.
pub async fn next_frame(frames: &mut futures_mpsc::UnboundedReceiver<Message>) -> Message {
    tokio::time::timeout(FRAME_TIMEOUT, frames.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("session dropped the sink")
}

pub async fn next_text(frames: &mut futures_mpsc::UnboundedReceiver<Message>) -> String {
    match next_frame(frames).await {
        Message::Text(text) => text.as_str().to_string(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

pub async fn next_binary(frames: &mut futures_mpsc::UnboundedReceiver<Message>) -> Bytes {
    match next_frame(frames).await {
        Message::Binary(audio) => audio,
        other => panic!("expected binary frame, got {other:?}"),
    }
}

/// TTS that takes `delay` to answer, counting calls started and finished.
pub struct SlowTTS {
    pub delay: Duration,
    pub started: AtomicUsize,
    pub completed: AtomicUsize,
}

impl SlowTTS {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl BaseTTS for SlowTTS {
    async fn synthesize(&self, text: &str, _format: AudioOutputFormat) -> TTSResult<Bytes> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(EchoTTS::audio_for(text))
    }

    fn get_provider_info(&self) -> &'static str {
        "slow"
    }
}
