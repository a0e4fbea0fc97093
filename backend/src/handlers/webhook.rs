use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::models::VoteEvent;
use crate::services::leaderboard_bot::LeaderboardBot;

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct WebhookError {
    pub error: String,
}

fn failed() -> (StatusCode, Json<WebhookError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(WebhookError {
            error: "failed".to_string(),
        }),
    )
}

/// Announces a vote to the broadcast chats and, when enabled, refreshes the
/// leaderboard in the background.
pub async fn vote_webhook(
    State(bot): State<Arc<LeaderboardBot>>,
    payload: Result<Json<VoteEvent>, JsonRejection>,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<WebhookError>)> {
    let Json(vote) = payload.map_err(|e| {
        warn!("Rejected vote webhook payload: {}", e.body_text());
        failed()
    })?;

    bot.announce_vote(&vote).await.map_err(|e| {
        warn!("Rejected vote webhook: {}", e);
        failed()
    })?;

    if bot.refresh_on_vote() {
        let bot = bot.clone();
        tokio::spawn(async move {
            bot.run_cycle("vote").await;
        });
    }

    Ok(Json(WebhookResponse { success: true }))
}
