//! Per-connection session loop.
//!
//! One task owns everything a session touches: the socket halves, the STT
//! client, the script cursor, queued syntheses and the keep-alive timer.
//! Events from all of them are multiplexed with `select!`, so no state is
//! shared and nothing needs a lock.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::FuturesOrdered;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::keepalive::KeepAlive;
use super::state::SessionState;
use super::synthesizer::ResponseSynthesizer;
use super::transport::{Inbound, Outbound, TransportCodec, TransportKind};
use crate::core::dialogue::{ScriptCursor, ScriptedDialogue};
use crate::core::stt::{BaseSTT, STTConfig, STTConnectionState, STTEvent, STTFactory, STTResult};
use crate::core::tts::{AudioOutputFormat, BaseTTS};

/// Capacity of the STT event channel
const STT_EVENT_BUFFER: usize = 64;

/// Behaviour of a session on one transport.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub kind: TransportKind,
    /// Provider settings, including the transport's audio profile
    pub stt: STTConfig,
    pub tts_format: AudioOutputFormat,
    /// A final transcript counts as an utterance only when its trimmed
    /// character count is strictly greater than this.
    pub noise_threshold: usize,
    pub greet_on_open: bool,
    pub echo_transcripts: bool,
    pub keepalive_interval: Option<Duration>,
    pub completion_notice: String,
}

/// Shared collaborators handed to every new session.
#[derive(Clone)]
pub struct SessionContext {
    pub dialogue: ScriptedDialogue,
    pub stt_factory: Arc<dyn STTFactory>,
    pub tts: Arc<dyn BaseTTS>,
    pub settings: SessionSettings,
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    TransportClosed,
    VendorClosed,
}

enum LoopEvent<E> {
    Inbound(Option<Result<Message, E>>),
    Stt(Option<STTEvent>),
    Synthesized(Option<Bytes>),
    KeepAlive,
}

/// Run one relay session until either side goes away.
///
/// Opens the STT session first; if that fails the client socket is closed
/// and nothing else happens.
pub async fn run_session<C, S, R, E>(codec: C, sink: S, inbound: R, context: SessionContext)
where
    C: TransportCodec,
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: Display + Send,
{
    let id = Uuid::new_v4();
    let span = info_span!("session", %id, transport = %codec.kind());
    run_session_inner(id, codec, sink, inbound, context)
        .instrument(span)
        .await
}

async fn run_session_inner<C, S, R, E>(
    id: Uuid,
    codec: C,
    mut sink: S,
    inbound: R,
    context: SessionContext,
) where
    C: TransportCodec,
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: Display + Send,
{
    info!("Session started");
    let SessionContext {
        dialogue,
        stt_factory,
        tts,
        settings,
    } = context;

    let mut stt = match stt_factory.create(settings.stt.clone()) {
        Ok(stt) => stt,
        Err(e) => {
            error!(error = %e, "Failed to create STT session");
            close_sink(&mut sink).await;
            return;
        }
    };

    let (events_tx, events_rx) = mpsc::channel(STT_EVENT_BUFFER);
    if let Err(e) = stt.connect(events_tx).await {
        error!(error = %e, "Failed to open STT session");
        close_sink(&mut sink).await;
        return;
    }
    info!(provider = stt.get_provider_info(), "STT session connecting");

    let session = Session {
        id,
        state: SessionState::Connecting,
        synthesizer: ResponseSynthesizer::new(tts, settings.tts_format),
        cursor: dialogue.cursor(),
        dialogue,
        settings,
        codec,
        sink,
        transport_alive: true,
        stt,
        events: events_rx,
        events_closed: false,
        pending: FuturesOrdered::new(),
        keepalive: KeepAlive::default(),
    };
    session.run(inbound).await;
}

async fn close_sink<S>(sink: &mut S)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    if let Err(e) = sink.send(Message::Close(None)).await {
        debug!(error = %e, "Close frame not delivered");
    }
    let _ = sink.close().await;
}

struct Session<C, S> {
    id: Uuid,
    state: SessionState,
    settings: SessionSettings,
    dialogue: ScriptedDialogue,
    cursor: ScriptCursor,
    synthesizer: ResponseSynthesizer,
    codec: C,
    sink: S,
    /// Cleared after the first failed write
    transport_alive: bool,
    stt: Box<dyn BaseSTT>,
    events: mpsc::Receiver<STTEvent>,
    events_closed: bool,
    /// In-flight syntheses, yielded in the order they were queued
    pending: FuturesOrdered<BoxFuture<'static, Option<Bytes>>>,
    keepalive: KeepAlive,
}

impl<C, S> Session<C, S>
where
    C: TransportCodec,
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
{
    async fn run<R, E>(mut self, mut inbound: R)
    where
        R: Stream<Item = Result<Message, E>> + Unpin + Send,
        E: Display + Send,
    {
        let exit = loop {
            let event = tokio::select! {
                frame = inbound.next() => LoopEvent::Inbound(frame),
                event = self.events.recv(), if !self.events_closed => LoopEvent::Stt(event),
                Some(audio) = self.pending.next(), if !self.pending.is_empty() => {
                    LoopEvent::Synthesized(audio)
                }
                _ = self.keepalive.tick() => LoopEvent::KeepAlive,
            };

            let exit = match event {
                LoopEvent::Inbound(Some(Ok(message))) => self.on_frame(message).await,
                LoopEvent::Inbound(Some(Err(e))) => {
                    warn!(error = %e, "Transport error");
                    Some(Exit::TransportClosed)
                }
                LoopEvent::Inbound(None) => {
                    debug!("Transport stream ended");
                    Some(Exit::TransportClosed)
                }
                LoopEvent::Stt(Some(event)) => self.on_stt_event(event).await,
                LoopEvent::Stt(None) => {
                    self.events_closed = true;
                    self.on_vendor_closed().await
                }
                LoopEvent::Synthesized(Some(audio)) => {
                    self.send(Outbound::Audio(audio)).await;
                    None
                }
                LoopEvent::Synthesized(None) => None,
                LoopEvent::KeepAlive => {
                    self.on_keepalive().await;
                    None
                }
            };

            if let Some(exit) = exit {
                break exit;
            }
        };

        if exit == Exit::TransportClosed {
            self.state = self.state.on_transport_closed();
        }
        self.shutdown().await;
    }

    async fn on_frame(&mut self, message: Message) -> Option<Exit> {
        match self.codec.decode(message) {
            Inbound::Audio(audio) => {
                self.forward_audio(audio).await;
                None
            }
            Inbound::Ignored => None,
            Inbound::Closed => {
                info!("Client closed the stream");
                Some(Exit::TransportClosed)
            }
        }
    }

    async fn forward_audio(&mut self, audio: Bytes) {
        if !self.stt.is_ready() {
            warn!(
                bytes = audio.len(),
                stt_state = %self.stt.connection_state(),
                "STT not ready, dropping audio"
            );
            return;
        }
        if let Err(e) = self.stt.send_audio(audio).await {
            warn!(error = %e, "Failed to forward audio to STT");
        }
    }

    async fn on_stt_event(&mut self, event: STTEvent) -> Option<Exit> {
        match event {
            STTEvent::Open => {
                self.on_vendor_open().await;
                None
            }
            STTEvent::Transcript(result) => {
                self.on_transcript(result).await;
                None
            }
            STTEvent::Error(e) => {
                error!(error = %e, "STT error");
                None
            }
            STTEvent::Close => self.on_vendor_closed().await,
        }
    }

    async fn on_vendor_open(&mut self) {
        self.state = self.state.on_vendor_open();
        info!("STT session open");

        if self.settings.greet_on_open {
            self.speak_next().await;
        }
        if let Some(period) = self.settings.keepalive_interval {
            self.keepalive.start(period);
        }
    }

    async fn on_transcript(&mut self, result: STTResult) {
        if !result.is_final {
            debug!(transcript = %result.transcript, "Ignoring interim transcript");
            return;
        }

        let text = result.transcript.trim();
        if text.chars().count() <= self.settings.noise_threshold {
            debug!(transcript = %text, "Ignoring transcript below noise threshold");
            return;
        }

        info!(transcript = %text, confidence = result.confidence, "User said");
        if self.settings.echo_transcripts {
            self.send(Outbound::Transcript(text.to_string())).await;
        }

        if self.cursor.is_exhausted() {
            info!("Script exhausted, sending completion notice");
            let notice = self.settings.completion_notice.clone();
            self.send(Outbound::ConversationComplete(notice)).await;
        } else {
            self.speak_next().await;
        }
    }

    /// Send the line under the cursor and queue exactly one synthesis for it.
    async fn speak_next(&mut self) {
        let Some(index) = self.cursor.advance() else {
            return;
        };
        let Some(line) = self.dialogue.line(index).map(str::to_owned) else {
            return;
        };

        info!(index, line = %line, "Assistant line");
        self.send(Outbound::AssistantText(line.clone())).await;
        self.pending.push_back(self.synthesizer.synthesize(line));
    }

    async fn on_vendor_closed(&mut self) -> Option<Exit> {
        info!("STT session closed by provider");
        self.keepalive.cancel();
        self.state = self.state.on_vendor_closed();
        if self.transport_alive {
            close_sink(&mut self.sink).await;
            self.transport_alive = false;
        }
        Some(Exit::VendorClosed)
    }

    async fn on_keepalive(&mut self) {
        if self.stt.connection_state() != STTConnectionState::Open {
            debug!("Skipping keep-alive, STT not open");
            return;
        }
        if let Err(e) = self.stt.keep_alive().await {
            warn!(error = %e, "STT keep-alive failed");
        }
    }

    async fn send(&mut self, outbound: Outbound) {
        if !self.state.accepts_outbound() || !self.transport_alive {
            debug!(state = %self.state, "Discarding outbound frame");
            return;
        }
        let Some(message) = self.codec.encode(outbound) else {
            return;
        };
        if let Err(e) = self.sink.send(message).await {
            warn!(error = %e, "Failed to write to client");
            self.transport_alive = false;
        }
    }

    /// Release everything the session holds. Consumes the session so the
    /// provider is finished exactly once.
    async fn shutdown(mut self) {
        self.keepalive.cancel();
        let dropped = self.pending.len();
        self.pending = FuturesOrdered::new();
        if dropped > 0 {
            debug!(dropped, "Dropped pending syntheses");
        }

        // Unblocks the provider task if it is waiting on a full channel
        self.events.close();

        if let Err(e) = self.stt.finish().await {
            warn!(error = %e, "Failed to finish STT session");
        }
        self.state = self.state.on_teardown_complete();

        info!(
            session_id = %self.id,
            state = %self.state,
            lines_played = self.cursor.position(),
            "Session closed"
        );
    }
}
