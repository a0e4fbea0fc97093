use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::constants::{TELEGRAM_PARSE_MODE, TELEGRAM_REQUEST_TIMEOUT_SECS};
use crate::utils::config::TelegramConfig;

/// Telegram's per-chat message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("{method} rejected (code {code:?}): {description}")]
    Api {
        method: String,
        code: Option<i64>,
        description: String,
    },

    #[error("{method} request failed: {source}")]
    Http {
        method: String,
        #[source]
        source: reqwest::Error,
    },
}

impl MessengerError {
    /// Telegram refuses edits that would not change the message.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::Api { description, .. } if description.contains("message is not modified"))
    }
}

/// Outbound chat operations the publisher relies on.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageId, MessengerError>;

    async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), MessengerError>;

    async fn pin_message(&self, chat_id: &str, message_id: MessageId) -> Result<(), MessengerError>;
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Thin Bot API client: JSON in, `{ ok, result }` envelope out.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TELEGRAM_REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        Self::new(&config.bot_token, &config.api_base_url)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T, MessengerError> {
        let http_error = |e: reqwest::Error| MessengerError::Http {
            method: method.to_string(),
            // the url carries the bot token
            source: e.without_url(),
        };

        let response = self
            .client
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await
            .map_err(http_error)?;

        // Bot API errors come back as non-2xx with the same JSON envelope
        let envelope: TelegramResponse<T> = response.json().await.map_err(http_error)?;

        match envelope {
            TelegramResponse { ok: true, result: Some(result), .. } => Ok(result),
            TelegramResponse { description, error_code, .. } => Err(MessengerError::Api {
                method: method.to_string(),
                code: error_code,
                description: description.unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageId, MessengerError> {
        let sent: SentMessage = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "parse_mode": TELEGRAM_PARSE_MODE,
                    "link_preview_options": { "is_disabled": true },
                }),
            )
            .await?;
        Ok(MessageId(sent.message_id))
    }

    async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), MessengerError> {
        let result: Result<Value, _> = self
            .call(
                "editMessageText",
                json!({
                    "chat_id": chat_id,
                    "message_id": message_id.0,
                    "text": text,
                    "parse_mode": TELEGRAM_PARSE_MODE,
                    "link_preview_options": { "is_disabled": true },
                }),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_modified() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn pin_message(&self, chat_id: &str, message_id: MessageId) -> Result<(), MessengerError> {
        let _: Value = self
            .call(
                "pinChatMessage",
                json!({
                    "chat_id": chat_id,
                    "message_id": message_id.0,
                    "disable_notification": true,
                }),
            )
            .await?;
        Ok(())
    }
}
