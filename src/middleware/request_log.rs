//! Logs the method and path of every incoming request, including upgrades
//! and requests that end in a 404.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::info;

pub async fn request_log_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        "HTTP request"
    );
    response
}
