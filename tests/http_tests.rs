//! Router tests
//!
//! HTTP endpoints are exercised with `oneshot`; the WebSocket endpoints run
//! against a real listener with fake providers behind them.

mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tower::util::ServiceExt;

use common::{EchoTTS, FRAME_TIMEOUT, FakeSttFactory, FakeSttProbe, keyed_config};
use voice_relay::core::dialogue::DEFAULT_SCRIPT;
use voice_relay::{AppState, ServerConfig, routes};

fn app_with(config: ServerConfig, probe: &Arc<FakeSttProbe>) -> Router {
    let state = AppState::with_providers(config, FakeSttFactory::new(probe.clone()), EchoTTS::new());
    routes::create_app(state)
}

fn app() -> Router {
    app_with(keyed_config(), &FakeSttProbe::new())
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, json!({ "status": "OK" }));
}

#[tokio::test]
async fn test_unknown_path_is_empty_404() {
    let response = app()
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn test_twiml_uses_host_header() {
    for (method, path) in [("POST", "/"), ("GET", "/voice"), ("POST", "/voice")] {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, "abc123.ngrok.io")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{method} {path}");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/xml");
        let body = body_string(response).await;
        assert!(body.starts_with("<?xml"));
        assert!(
            body.contains(r#"<Connect><Stream url="wss://abc123.ngrok.io/stream"/></Connect>"#),
            "{body}"
        );
        assert!(!body.contains("<Say>"));
    }
}

#[tokio::test]
async fn test_twiml_prefers_public_host_and_greets() {
    let mut config = keyed_config();
    config.public_host = Some("relay.example.com".to_string());
    config.twiml.greeting = Some("Connecting you now".to_string());
    config.telephony.path = "/media".to_string();

    let request = Request::post("/voice")
        .header(header::HOST, "internal:8080")
        .body(Body::empty())
        .unwrap();
    let response = app_with(config, &FakeSttProbe::new())
        .oneshot(request)
        .await
        .unwrap();

    let body = body_string(response).await;
    assert!(body.contains(
        r#"<Response><Say>Connecting you now</Say><Connect><Stream url="wss://relay.example.com/media"/></Connect></Response>"#
    ));
}

#[tokio::test]
async fn test_ws_routes_require_upgrade() {
    for path in ["/ws", "/stream"] {
        let response = app()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert!(response.status().is_client_error(), "{path}");
    }
}

async fn serve(app: Router) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_browser_socket_end_to_end() {
    let probe = FakeSttProbe::new();
    let addr = serve(app_with(keyed_config(), &probe)).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    probe.open().await;

    let greeting = tokio::time::timeout(FRAME_TIMEOUT, socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(greeting.to_text().unwrap(), format!("AI:{}", DEFAULT_SCRIPT[0]));

    let audio = tokio::time::timeout(FRAME_TIMEOUT, socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(matches!(audio, WsMessage::Binary(ref data) if data.starts_with(b"audio:")));

    socket
        .send(WsMessage::Binary(vec![1u8, 2, 3, 4].into()))
        .await
        .unwrap();
    probe.wait_for(|p| !p.audio().is_empty()).await;
    assert_eq!(probe.audio()[0].as_ref(), &[1u8, 2, 3, 4]);

    socket.close(None).await.unwrap();
    probe.wait_for(|p| p.finishes() == 1).await;
}

#[tokio::test]
async fn test_twilio_socket_end_to_end() {
    let probe = FakeSttProbe::new();
    let addr = serve(app_with(keyed_config(), &probe)).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/stream")).await.unwrap();
    let start = json!({
        "event": "start",
        "streamSid": "MZabc",
        "start": { "streamSid": "MZabc", "callSid": "CAdef" }
    });
    socket
        .send(WsMessage::Text(start.to_string().into()))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    probe.open().await;

    let frame = tokio::time::timeout(FRAME_TIMEOUT, socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let media: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(media["event"], "media");
    assert_eq!(media["streamSid"], "MZabc");

    socket
        .send(WsMessage::Text(
            json!({ "event": "stop", "streamSid": "MZabc" }).to_string().into(),
        ))
        .await
        .unwrap();
    probe.wait_for(|p| p.finishes() == 1).await;

    let config = &probe.configs()[0];
    assert_eq!(config.sample_rate, 8000);
    assert_eq!(config.api_key, "test-deepgram-key");
}
