pub mod api;
pub mod browser;
pub mod voice;

use std::sync::Arc;

use axum::{Router, http::StatusCode, middleware};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::request_log_middleware;
use crate::state::AppState;

/// Unmatched paths get an empty 404
async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Assemble the full application router.
pub fn create_app(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(browser::create_browser_router(&state.config))
        .merge(voice::create_voice_router(&state.config))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_log_middleware)),
        )
        .with_state(state)
}
