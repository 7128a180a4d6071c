//! Twilio Media Streams transport.
//!
//! - [`twiml`]: the HTTP handshake that points a call at the stream socket
//! - [`messages`]: JSON envelopes exchanged on the stream
//! - [`codec`]: mapping between envelopes and session frames

pub mod codec;
pub mod messages;
pub mod twiml;

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::StreamExt;
use tracing::info;

use crate::session::{TransportKind, run_session};
use crate::state::AppState;

pub use codec::{COMPLETION_MARK, TwilioCodec};
pub use twiml::twiml_handler;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Twilio media stream WebSocket handler
pub async fn twilio_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Twilio media stream upgrade requested");
    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_twilio_socket(socket, state))
}

async fn handle_twilio_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sink, stream) = socket.split();
    let context = state.session_context(TransportKind::Telephony);
    run_session(TwilioCodec::default(), sink, stream, context).await;
}
