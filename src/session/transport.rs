//! Transport-neutral frames exchanged between a session and its socket.

use axum::extract::ws::Message;
use bytes::Bytes;

/// Which kind of client is on the other end of the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Browser,
    Telephony,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Telephony => "telephony",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Caller audio, forwarded to STT byte for byte
    Audio(Bytes),
    /// Nothing to act on (control chatter, malformed input, unsupported frame)
    Ignored,
    /// The client ended the stream
    Closed,
}

/// Something the session wants the client to receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    AssistantText(String),
    Transcript(String),
    Audio(Bytes),
    ConversationComplete(String),
}

/// Maps socket frames to and from session events for one transport.
pub trait TransportCodec: Send {
    fn kind(&self) -> TransportKind;

    /// Decoding may update codec state (e.g. a stream id learned from a
    /// start notification). It never fails; bad input becomes `Ignored`.
    fn decode(&mut self, message: Message) -> Inbound;

    /// `None` when the transport has no representation for the frame.
    fn encode(&self, outbound: Outbound) -> Option<Message>;
}
