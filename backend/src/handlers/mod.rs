pub mod admin;
pub mod webhook;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::leaderboard_bot::LeaderboardBot;

pub use admin::{force_update, health_check, preview, status};
pub use webhook::vote_webhook;

pub fn create_router(bot: Arc<LeaderboardBot>, allowed_origins: Option<&str>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(health_check))
        // Manual triggers
        .route("/force-update", get(force_update))
        .route("/force", get(force_update))
        .route("/test", get(preview))
        // Vote notifications from the dApp
        .route("/vote-webhook", post(vote_webhook))
        .layer(create_cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(bot)
}

/// Comma-separated `allowed_origins`; permissive when unset or unparsable.
pub fn create_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if !trimmed.is_empty() {
                trimmed.parse().ok()
            } else {
                None
            }
        })
        .collect();

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}
