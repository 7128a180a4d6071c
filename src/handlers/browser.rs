//! Browser WebSocket transport.
//!
//! # Protocol
//!
//! Client to server:
//! - Binary frames: microphone audio in the configured encoding
//! - Text frames: ignored
//!
//! Server to client:
//! - `AI:<line>` text frame for each assistant line and the completion notice
//! - `TRANSCRIPT:<text>` text frame echoing what was heard
//! - Binary frames: synthesized audio for the preceding line

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::StreamExt;
use tracing::{debug, info};

use crate::session::{Inbound, Outbound, TransportCodec, TransportKind, run_session};
use crate::state::AppState;

/// Prefix of assistant text frames
pub const ASSISTANT_PREFIX: &str = "AI:";

/// Prefix of transcript echo frames
pub const TRANSCRIPT_PREFIX: &str = "TRANSCRIPT:";

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Debug, Default)]
pub struct BrowserCodec;

impl TransportCodec for BrowserCodec {
    fn kind(&self) -> TransportKind {
        TransportKind::Browser
    }

    fn decode(&mut self, message: Message) -> Inbound {
        match message {
            Message::Binary(audio) => Inbound::Audio(audio),
            Message::Text(text) => {
                debug!(len = text.len(), "Ignoring text frame from browser");
                Inbound::Ignored
            }
            Message::Close(_) => Inbound::Closed,
            Message::Ping(_) | Message::Pong(_) => Inbound::Ignored,
        }
    }

    fn encode(&self, outbound: Outbound) -> Option<Message> {
        let message = match outbound {
            Outbound::AssistantText(line) | Outbound::ConversationComplete(line) => {
                Message::Text(format!("{ASSISTANT_PREFIX}{line}").into())
            }
            Outbound::Transcript(text) => {
                Message::Text(format!("{TRANSCRIPT_PREFIX}{text}").into())
            }
            Outbound::Audio(audio) => Message::Binary(audio),
        };
        Some(message)
    }
}

/// Browser WebSocket handler
pub async fn browser_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Browser WebSocket connection upgrade requested");
    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_browser_socket(socket, state))
}

async fn handle_browser_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sink, stream) = socket.split();
    let context = state.session_context(TransportKind::Browser);
    run_session(BrowserCodec, sink, stream, context).await;
}
