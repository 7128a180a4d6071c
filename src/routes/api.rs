use axum::{Router, routing::get};
use std::sync::Arc;

use crate::handlers::api::health_check;
use crate::state::AppState;

/// `GET /health`
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
