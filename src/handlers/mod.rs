//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `browser` - Browser audio WebSocket
//! - `twilio` - TwiML handshake and Twilio media stream WebSocket

pub mod api;
pub mod browser;
pub mod twilio;

pub use browser::browser_ws_handler;
pub use twilio::{twilio_stream_handler, twiml_handler};
