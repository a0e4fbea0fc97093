use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use tracing::info;

use crate::services::leaderboard_bot::{CycleOutcome, LeaderboardBot, SkipReason};

pub async fn status(State(bot): State<Arc<LeaderboardBot>>) -> String {
    let tracked = match bot.tracked_message_id().await {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    };
    format!(
        "{} bot is running. Tracked message: {}. Polling every {}s.",
        bot.style().title,
        tracked,
        bot.poll_interval().as_secs()
    )
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// Runs one leaderboard cycle right away. Serves both `/force-update` and
/// `/force`.
pub async fn force_update(State(bot): State<Arc<LeaderboardBot>>) -> (StatusCode, String) {
    info!("🔧 Manual leaderboard update requested");
    let outcome = bot.run_cycle("manual").await;
    let code = match &outcome {
        CycleOutcome::Published { .. } | CycleOutcome::Skipped(SkipReason::InFlight) => StatusCode::OK,
        CycleOutcome::Skipped(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, outcome.to_string())
}

/// Preview of the next leaderboard message. Nothing is published.
pub async fn preview(State(bot): State<Arc<LeaderboardBot>>) -> (StatusCode, String) {
    match bot.render_current().await {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Could not render leaderboard: {}", e),
        ),
    }
}
