//! In-memory fakes for the chain and chat seams.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::Project;
use crate::services::chain::{ChainError, ProjectSource};
use crate::services::leaderboard_bot::LeaderboardBot;
use crate::services::publisher::LeaderboardPublisher;
use crate::services::telegram::{MessageId, Messenger, MessengerError};
use crate::utils::config::LeaderboardConfig;
use crate::utils::formatting::LeaderboardStyle;
use crate::utils::token_conversion::whole_tokens;

#[derive(Debug, Clone, PartialEq)]
pub enum MessengerCall {
    Send { chat_id: String, text: String },
    Edit { chat_id: String, message_id: MessageId, text: String },
    Pin { chat_id: String, message_id: MessageId },
}

pub struct FakeMessenger {
    calls: Mutex<Vec<MessengerCall>>,
    next_id: AtomicI64,
    failing_chats: Mutex<HashSet<String>>,
    fail_next_edit: AtomicBool,
    fail_pins: AtomicBool,
}

impl Default for FakeMessenger {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
            failing_chats: Mutex::new(HashSet::new()),
            fail_next_edit: AtomicBool::new(false),
            fail_pins: AtomicBool::new(false),
        }
    }
}

fn rejected(method: &str, description: &str) -> MessengerError {
    MessengerError::Api {
        method: method.to_string(),
        code: Some(400),
        description: description.to_string(),
    }
}

impl FakeMessenger {
    pub fn calls(&self) -> Vec<MessengerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sends(&self) -> Vec<MessengerCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, MessengerCall::Send { .. }))
            .collect()
    }

    pub fn edits(&self) -> Vec<MessengerCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, MessengerCall::Edit { .. }))
            .collect()
    }

    pub fn pins(&self) -> Vec<MessengerCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, MessengerCall::Pin { .. }))
            .collect()
    }

    pub fn fail_sends_to(&self, chat_id: &str) {
        self.failing_chats.lock().unwrap().insert(chat_id.to_string());
    }

    pub fn allow_sends_to(&self, chat_id: &str) {
        self.failing_chats.lock().unwrap().remove(chat_id);
    }

    pub fn fail_next_edit(&self) {
        self.fail_next_edit.store(true, Ordering::SeqCst);
    }

    pub fn fail_pins(&self) {
        self.fail_pins.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: MessengerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageId, MessengerError> {
        self.record(MessengerCall::Send {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        });
        if self.failing_chats.lock().unwrap().contains(chat_id) {
            return Err(rejected("sendMessage", "Forbidden: bot was kicked"));
        }
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), MessengerError> {
        self.record(MessengerCall::Edit {
            chat_id: chat_id.to_string(),
            message_id,
            text: text.to_string(),
        });
        if self.fail_next_edit.swap(false, Ordering::SeqCst) {
            return Err(rejected("editMessageText", "Bad Request: message to edit not found"));
        }
        Ok(())
    }

    async fn pin_message(&self, chat_id: &str, message_id: MessageId) -> Result<(), MessengerError> {
        self.record(MessengerCall::Pin {
            chat_id: chat_id.to_string(),
            message_id,
        });
        if self.fail_pins.load(Ordering::SeqCst) {
            return Err(rejected("pinChatMessage", "Bad Request: not enough rights"));
        }
        Ok(())
    }
}

/// Serves a fixed project table, or no endpoint at all when unset.
pub struct FakeSource {
    projects: Mutex<Option<Vec<Project>>>,
    round: u64,
    delay: Duration,
    fetches: AtomicU32,
}

impl FakeSource {
    pub fn new(projects: Vec<Project>, round: u64) -> Self {
        Self {
            projects: Mutex::new(Some(projects)),
            round,
            delay: Duration::ZERO,
            fetches: AtomicU32::new(0),
        }
    }

    pub fn unavailable() -> Self {
        let source = Self::new(Vec::new(), 1);
        source.set_projects(None);
        source
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_projects(&self, projects: Option<Vec<Project>>) {
        *self.projects.lock().unwrap() = projects;
    }

    pub fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectSource for FakeSource {
    async fn fetch_projects(&self) -> Result<Vec<Project>, ChainError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        // the table is read when the call starts; the delay models response latency
        let projects = self.projects.lock().unwrap().clone();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        projects.ok_or(ChainError::NoEndpointAvailable { tried: 1 })
    }

    async fn fetch_round(&self) -> u64 {
        self.round
    }
}

pub fn project(slot: usize, name: &str, symbol: &str, tokens: u64) -> Project {
    Project {
        raw_votes: whole_tokens(tokens),
        ..Project::placeholder(slot, name, symbol)
    }
}

/// A bot publishing to `@board` and broadcasting votes to `@board` and `@chat`.
pub fn bot(source: FakeSource, refresh_on_vote: bool) -> (Arc<FakeMessenger>, Arc<LeaderboardBot>) {
    let config = LeaderboardConfig {
        poll_interval: Duration::from_secs(120),
        round_override: None,
        fallback_projects: Vec::new(),
        refresh_on_vote,
        style: LeaderboardStyle::default(),
    };
    bot_with_config(source, &config)
}

pub fn bot_with_config(source: FakeSource, config: &LeaderboardConfig) -> (Arc<FakeMessenger>, Arc<LeaderboardBot>) {
    let messenger = Arc::new(FakeMessenger::default());
    let publisher = LeaderboardPublisher::new(
        messenger.clone(),
        "@board",
        vec!["@board".to_string(), "@chat".to_string()],
        false,
    );
    let bot = LeaderboardBot::new(Arc::new(source), publisher, config);
    (messenger, Arc::new(bot))
}
