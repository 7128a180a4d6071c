//! Telephony route configuration

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::handlers::{twilio_stream_handler, twiml_handler};
use crate::state::AppState;

/// Create the telephony router
///
/// # Endpoints
///
/// - `GET|POST {twiml.paths}` (default `/` and `/voice`) - TwiML handshake
///   pointing the call at the media stream
/// - `GET {telephony.path}` (default `/stream`) - Twilio Media Streams
///   WebSocket upgrade
pub fn create_voice_router(config: &ServerConfig) -> Router<Arc<AppState>> {
    let router = config
        .twiml
        .paths
        .iter()
        .fold(Router::new(), |router, path| {
            router.route(path, get(twiml_handler).post(twiml_handler))
        });

    router.route(&config.telephony.path, get(twilio_stream_handler))
}
