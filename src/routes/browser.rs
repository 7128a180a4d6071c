//! Browser WebSocket route configuration

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::handlers::browser_ws_handler;
use crate::state::AppState;

/// Create the browser WebSocket router
///
/// # Endpoint
///
/// `GET {browser.path}` (default `/ws`) - WebSocket upgrade
///
/// # Protocol
///
/// Clients stream microphone audio as binary frames (16-bit PCM, 16kHz, mono
/// by default). The server answers with `AI:` and `TRANSCRIPT:` text frames
/// and binary MP3 audio.
pub fn create_browser_router(config: &ServerConfig) -> Router<Arc<AppState>> {
    Router::new().route(&config.browser.path, get(browser_ws_handler))
}
