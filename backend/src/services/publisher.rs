use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::services::telegram::{MessageId, Messenger, MessengerError};
use crate::utils::config::TelegramConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Edited(MessageId),
    Sent(MessageId),
}

#[derive(Debug, Error)]
#[error("could not publish leaderboard to {chat_id}: {source}")]
pub struct PublishError {
    pub chat_id: String,
    #[source]
    pub source: MessengerError,
}

/// Keeps a single leaderboard message per chat alive by editing it in place.
///
/// The tracked message id lives only in memory; after a restart the first
/// publish sends a fresh message.
pub struct LeaderboardPublisher {
    messenger: Arc<dyn Messenger>,
    leaderboard_chat_id: String,
    broadcast_chat_ids: Vec<String>,
    pin_new_messages: bool,
    tracked: Mutex<Option<MessageId>>,
}

impl LeaderboardPublisher {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        leaderboard_chat_id: impl Into<String>,
        broadcast_chat_ids: Vec<String>,
        pin_new_messages: bool,
    ) -> Self {
        Self {
            messenger,
            leaderboard_chat_id: leaderboard_chat_id.into(),
            broadcast_chat_ids,
            pin_new_messages,
            tracked: Mutex::new(None),
        }
    }

    pub fn from_config(messenger: Arc<dyn Messenger>, config: &TelegramConfig) -> Self {
        Self::new(
            messenger,
            config.leaderboard_chat_id.clone(),
            config.broadcast_chat_ids.clone(),
            config.pin_leaderboard,
        )
    }

    pub async fn tracked_message_id(&self) -> Option<MessageId> {
        *self.tracked.lock().await
    }

    /// Edits the tracked message, or sends (and pins) a new one when nothing
    /// is tracked or the edit is rejected.
    pub async fn publish(&self, text: &str) -> Result<PublishOutcome, PublishError> {
        let chat_id = &self.leaderboard_chat_id;
        let mut tracked = self.tracked.lock().await;

        if let Some(message_id) = *tracked {
            match self.messenger.edit_message_text(chat_id, message_id, text).await {
                Ok(()) => {
                    debug!("Leaderboard message {} updated", message_id);
                    return Ok(PublishOutcome::Edited(message_id));
                }
                Err(e) => {
                    warn!(
                        "Editing leaderboard message {} failed, sending a new one: {}",
                        message_id, e
                    );
                    *tracked = None;
                }
            }
        }

        let message_id = match self.messenger.send_message(chat_id, text).await {
            Ok(id) => id,
            Err(source) => {
                error!("Sending leaderboard to {} failed: {}", chat_id, source);
                return Err(PublishError {
                    chat_id: chat_id.clone(),
                    source,
                });
            }
        };
        *tracked = Some(message_id);
        info!("📌 Leaderboard sent to {} as message {}", chat_id, message_id);

        if self.pin_new_messages {
            if let Err(e) = self.messenger.pin_message(chat_id, message_id).await {
                warn!("Pinning leaderboard message {} failed: {}", message_id, e);
            }
        }

        Ok(PublishOutcome::Sent(message_id))
    }

    /// Sends `text` to every broadcast chat in turn. Returns how many
    /// deliveries succeeded.
    pub async fn broadcast_vote(&self, text: &str) -> usize {
        let mut delivered = 0;
        for chat_id in &self.broadcast_chat_ids {
            match self.messenger.send_message(chat_id, text).await {
                Ok(_) => delivered += 1,
                Err(e) => warn!("Vote broadcast to {} failed: {}", chat_id, e),
            }
        }
        delivered
    }
}
