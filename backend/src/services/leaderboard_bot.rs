use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::models::{Leaderboard, Project, VoteEvent};
use crate::services::chain::{ChainError, ProjectSource};
use crate::services::publisher::{LeaderboardPublisher, PublishOutcome};
use crate::services::telegram::MessageId;
use crate::utils::config::LeaderboardConfig;
use crate::utils::formatting::{render_leaderboard, render_vote_notification, LeaderboardStyle, VoteError};

/// Where the round label comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundSource {
    Fixed(String),
    Chain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    ChainUnavailable(String),
    PublishFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Published {
        outcome: PublishOutcome,
        round: String,
        projects: usize,
        from_fallback: bool,
    },
    Skipped(SkipReason),
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published { outcome, round, projects, from_fallback } => {
                let (verb, id) = match outcome {
                    PublishOutcome::Edited(id) => ("edited", id),
                    PublishOutcome::Sent(id) => ("sent", id),
                };
                write!(
                    f,
                    "Leaderboard {} (message {}, round {}, {} projects{})",
                    verb,
                    id,
                    round,
                    projects,
                    if *from_fallback { ", fallback data" } else { "" }
                )
            }
            Self::Skipped(SkipReason::InFlight) => write!(f, "Update already in progress"),
            Self::Skipped(SkipReason::ChainUnavailable(e)) => write!(f, "Skipped: chain unavailable ({})", e),
            Self::Skipped(SkipReason::PublishFailed(e)) => write!(f, "Skipped: publish failed ({})", e),
        }
    }
}

/// The bot's single session object, shared by the poll loop and HTTP handlers.
pub struct LeaderboardBot {
    source: Arc<dyn ProjectSource>,
    publisher: LeaderboardPublisher,
    style: LeaderboardStyle,
    round: RoundSource,
    fallback_projects: Vec<Project>,
    refresh_on_vote: bool,
    poll_interval: Duration,
    cycle_lock: Mutex<()>,
    // set by triggers that arrive while a cycle holds the lock
    rerun_requested: AtomicBool,
}

impl LeaderboardBot {
    pub fn new(
        source: Arc<dyn ProjectSource>,
        publisher: LeaderboardPublisher,
        config: &LeaderboardConfig,
    ) -> Self {
        let round = match &config.round_override {
            Some(label) => RoundSource::Fixed(label.clone()),
            None => RoundSource::Chain,
        };

        Self {
            source,
            publisher,
            style: config.style.clone(),
            round,
            fallback_projects: config.fallback_projects.clone(),
            refresh_on_vote: config.refresh_on_vote,
            poll_interval: config.poll_interval,
            cycle_lock: Mutex::new(()),
            rerun_requested: AtomicBool::new(false),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn style(&self) -> &LeaderboardStyle {
        &self.style
    }

    pub fn refresh_on_vote(&self) -> bool {
        self.refresh_on_vote
    }

    pub async fn tracked_message_id(&self) -> Option<MessageId> {
        self.publisher.tracked_message_id().await
    }

    async fn round_label(&self) -> String {
        match &self.round {
            RoundSource::Fixed(label) => label.clone(),
            RoundSource::Chain => self.source.fetch_round().await.to_string(),
        }
    }

    /// Chain projects, or the configured fallback table when the chain is
    /// out of reach. The flag is true when fallback data was used.
    async fn load_projects(&self) -> Result<(Vec<Project>, bool), ChainError> {
        match self.source.fetch_projects().await {
            Ok(projects) => Ok((projects, false)),
            Err(e) if !self.fallback_projects.is_empty() => {
                warn!("Chain read failed, publishing fallback projects: {}", e);
                Ok((self.fallback_projects.clone(), true))
            }
            Err(e) => Err(e),
        }
    }

    /// Renders the leaderboard from current data without publishing it.
    pub async fn render_current(&self) -> Result<String, ChainError> {
        let (projects, _) = self.load_projects().await?;
        let round = self.round_label().await;
        let board = Leaderboard::from_projects(&projects);
        Ok(render_leaderboard(&board, &round, &self.style, Utc::now()))
    }

    /// One fetch → format → publish pass. Never overlaps with another pass
    /// and never returns an error; the outcome is logged and returned.
    ///
    /// A trigger that finds a pass in flight returns `Skipped(InFlight)` and
    /// asks the running pass to go once more before it lets go of the lock,
    /// so data that changed mid-pass still reaches the channel.
    pub async fn run_cycle(&self, trigger: &str) -> CycleOutcome {
        let mut last: Option<CycleOutcome> = None;
        loop {
            let Ok(guard) = self.cycle_lock.try_lock() else {
                if last.is_none() {
                    debug!("Deferring {} leaderboard update: another one is in flight", trigger);
                    self.rerun_requested.store(true, Ordering::SeqCst);
                }
                return last.unwrap_or(CycleOutcome::Skipped(SkipReason::InFlight));
            };
            self.rerun_requested.store(false, Ordering::SeqCst);

            let mut outcome = self.cycle_once(trigger).await;
            while self.rerun_requested.swap(false, Ordering::SeqCst) {
                debug!("Re-running leaderboard update requested during the last pass");
                outcome = self.cycle_once("rerun").await;
            }
            drop(guard);

            // a request that landed between the last check and the unlock
            if !self.rerun_requested.load(Ordering::SeqCst) {
                return outcome;
            }
            last = Some(outcome);
        }
    }

    async fn cycle_once(&self, trigger: &str) -> CycleOutcome {
        let (projects, from_fallback) = match self.load_projects().await {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("❌ Leaderboard update ({}) skipped: {}", trigger, e);
                return CycleOutcome::Skipped(SkipReason::ChainUnavailable(e.to_string()));
            }
        };

        // read after projects so a reconnect inside fetch_projects is visible
        let round = self.round_label().await;
        let board = Leaderboard::from_projects(&projects);
        let text = render_leaderboard(&board, &round, &self.style, Utc::now());

        match self.publisher.publish(&text).await {
            Ok(outcome) => {
                let result = CycleOutcome::Published {
                    outcome,
                    round,
                    projects: board.entries.len(),
                    from_fallback,
                };
                info!("✅ {} ({})", result, trigger);
                result
            }
            Err(e) => {
                error!("❌ Leaderboard update ({}) failed: {}", trigger, e);
                CycleOutcome::Skipped(SkipReason::PublishFailed(e.to_string()))
            }
        }
    }

    /// Broadcasts a vote notice to every configured chat. Returns the number
    /// of chats reached.
    pub async fn announce_vote(&self, vote: &VoteEvent) -> Result<usize, VoteError> {
        let text = render_vote_notification(vote, &self.style.token_symbol)?;
        let delivered = self.publisher.broadcast_vote(&text).await;
        info!(
            "🗳 Vote from {} for {} announced to {} chats",
            vote.wallet.trim(),
            vote.project_name.trim(),
            delivered
        );
        Ok(delivered)
    }
}

/// Runs leaderboard cycles forever on the bot's poll interval. The first
/// cycle fires immediately.
pub async fn run_poll_loop(bot: Arc<LeaderboardBot>) {
    let mut interval = time::interval(bot.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut iter_count: usize = 0;

    loop {
        interval.tick().await;
        iter_count += 1;
        debug!("📊 Poll iteration {}", iter_count);
        bot.run_cycle("interval").await;
    }
}
