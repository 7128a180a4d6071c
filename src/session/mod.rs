//! Relay sessions: one per accepted client socket.

mod controller;
mod keepalive;
mod state;
mod synthesizer;
mod transport;

pub use controller::{SessionContext, SessionSettings, run_session};
pub use keepalive::KeepAlive;
pub use state::SessionState;
pub use synthesizer::ResponseSynthesizer;
pub use transport::{Inbound, Outbound, TransportCodec, TransportKind};
