//! TwiML handshake for inbound calls.
//!
//! Twilio requests this document when a call arrives and is told to open a
//! Media Stream back to this server.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::state::AppState;

/// Escape text for use in XML content and attribute values.
pub fn xml_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Build the `<Connect><Stream>` document, optionally preceded by `<Say>`.
pub fn build_twiml(host: &str, stream_path: &str, greeting: Option<&str>) -> String {
    let say = greeting
        .filter(|g| !g.trim().is_empty())
        .map(|g| format!("<Say>{}</Say>", xml_escape(g)))
        .unwrap_or_default();
    let url = xml_escape(&format!("wss://{host}{stream_path}"));

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Response>{say}<Connect><Stream url="{url}"/></Connect></Response>"#
    )
}

/// Host the media stream URL should point at: the configured public host,
/// else the request's `Host` header, else the bind address.
fn resolve_host(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(public_host) = state.config.public_host.as_deref() {
        return public_host.to_string();
    }
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.address())
}

/// TwiML handshake handler (GET or POST)
pub async fn twiml_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let host = resolve_host(&state, &headers);
    let body = build_twiml(
        &host,
        &state.config.telephony.path,
        state.config.twiml.greeting.as_deref(),
    );
    debug!(%host, "Serving TwiML");

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_twiml_without_greeting() {
        let xml = build_twiml("relay.example.com", "/stream", None);
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(
            r#"<Response><Connect><Stream url="wss://relay.example.com/stream"/></Connect></Response>"#
        ));
        assert!(!xml.contains("<Say>"));
    }

    #[test]
    fn test_build_twiml_with_escaped_greeting() {
        let xml = build_twiml("h", "/stream", Some("Hi <caller> & co"));
        assert!(xml.contains("<Say>Hi &lt;caller&gt; &amp; co</Say><Connect>"));
    }

    #[test]
    fn test_blank_greeting_is_omitted() {
        let xml = build_twiml("h", "/stream", Some("   "));
        assert!(!xml.contains("<Say>"));
    }

    #[test]
    fn test_host_is_escaped_in_attribute() {
        let xml = build_twiml(r#"evil"host"#, "/stream", None);
        assert!(xml.contains(r#"url="wss://evil&quot;host/stream""#));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a'b\"c"), "a&apos;b&quot;c");
        assert_eq!(xml_escape("plain"), "plain");
    }
}
