use axum::extract::ws::Message;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use tracing::{debug, info, warn};

use super::messages::{MarkPayload, OutboundMedia, TwilioInbound, TwilioOutbound};
use crate::session::{Inbound, Outbound, TransportCodec, TransportKind};

/// Mark name sent once the script has run out
pub const COMPLETION_MARK: &str = "conversation-complete";

/// Media Streams codec for one call.
///
/// Remembers the `streamSid` announced by the `start` event so outbound
/// media can be addressed to it.
#[derive(Debug, Default)]
pub struct TwilioCodec {
    stream_sid: Option<String>,
    call_sid: Option<String>,
}

impl TwilioCodec {
    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn call_sid(&self) -> Option<&str> {
        self.call_sid.as_deref()
    }

    fn decode_text(&mut self, text: &str) -> Inbound {
        let event = match TwilioInbound::parse(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Malformed Twilio message ignored");
                return Inbound::Ignored;
            }
        };

        match event {
            TwilioInbound::Connected { protocol } => {
                debug!(?protocol, "Twilio stream connected");
                Inbound::Ignored
            }
            TwilioInbound::Start { stream_sid, start } => {
                self.stream_sid = stream_sid.or(start.stream_sid);
                self.call_sid = start.call_sid;
                info!(
                    stream_sid = ?self.stream_sid,
                    call_sid = ?self.call_sid,
                    media_format = ?start.media_format,
                    "Twilio stream started"
                );
                Inbound::Ignored
            }
            TwilioInbound::Media { media, .. } => match BASE64.decode(media.payload.as_bytes()) {
                Ok(audio) => Inbound::Audio(Bytes::from(audio)),
                Err(e) => {
                    warn!(error = %e, "Invalid base64 media payload ignored");
                    Inbound::Ignored
                }
            },
            TwilioInbound::Stop { .. } => {
                info!(stream_sid = ?self.stream_sid, "Twilio stream stopped");
                Inbound::Closed
            }
            TwilioInbound::Mark { mark } => {
                debug!(name = ?mark.map(|m| m.name), "Twilio mark acknowledged");
                Inbound::Ignored
            }
            TwilioInbound::Dtmf { dtmf } => {
                debug!(digit = ?dtmf.and_then(|d| d.digit), "Twilio DTMF ignored");
                Inbound::Ignored
            }
            TwilioInbound::Unknown => {
                debug!("Unknown Twilio event ignored");
                Inbound::Ignored
            }
        }
    }

    fn to_message(outbound: &TwilioOutbound) -> Option<Message> {
        match serde_json::to_string(outbound) {
            Ok(json) => Some(Message::Text(json.into())),
            Err(e) => {
                warn!(error = %e, "Failed to serialize Twilio message");
                None
            }
        }
    }
}

impl TransportCodec for TwilioCodec {
    fn kind(&self) -> TransportKind {
        TransportKind::Telephony
    }

    fn decode(&mut self, message: Message) -> Inbound {
        match message {
            Message::Text(text) => self.decode_text(text.as_str()),
            Message::Binary(data) => {
                warn!(bytes = data.len(), "Unexpected binary frame on Twilio stream");
                Inbound::Ignored
            }
            Message::Close(_) => Inbound::Closed,
            Message::Ping(_) | Message::Pong(_) => Inbound::Ignored,
        }
    }

    fn encode(&self, outbound: Outbound) -> Option<Message> {
        let event = match outbound {
            Outbound::Audio(audio) => TwilioOutbound::Media {
                stream_sid: self.stream_sid.clone(),
                media: OutboundMedia {
                    payload: BASE64.encode(&audio),
                },
            },
            Outbound::ConversationComplete(_) => TwilioOutbound::Mark {
                stream_sid: self.stream_sid.clone(),
                mark: MarkPayload {
                    name: COMPLETION_MARK.to_string(),
                },
            },
            // No text channel on a phone call
            Outbound::AssistantText(_) | Outbound::Transcript(_) => return None,
        };
        Self::to_message(&event)
    }
}
