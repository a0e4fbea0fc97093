use alloy::primitives::U256;
use serde::Serialize;

use crate::constants::{TOKEN_DECIMALS, VOTE_DISPLAY_PLACES};
use crate::models::project::Project;
use crate::utils::token_conversion::format_token_amount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub symbol: String,
    pub raw_votes: U256,
}

impl LeaderboardEntry {
    pub fn display_votes(&self) -> String {
        format_token_amount(self.raw_votes, TOKEN_DECIMALS, VOTE_DISPLAY_PLACES)
    }
}

/// Ranked view of the active project slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub total_raw: U256,
}

impl Leaderboard {
    /// Drops unused slots, totals the raw votes and ranks by votes descending.
    /// Equal totals keep slot order.
    pub fn from_projects(projects: &[Project]) -> Self {
        let mut entries: Vec<LeaderboardEntry> = projects
            .iter()
            .filter(|p| p.is_active())
            .map(|p| LeaderboardEntry {
                name: p.name.trim().to_string(),
                symbol: p.symbol.trim().to_string(),
                raw_votes: p.raw_votes,
            })
            .collect();

        let total_raw = entries
            .iter()
            .fold(U256::ZERO, |acc, e| acc.saturating_add(e.raw_votes));

        entries.sort_by(|a, b| b.raw_votes.cmp(&a.raw_votes));

        Self { entries, total_raw }
    }

    /// Nothing to rank yet: no active slots or no votes cast.
    pub fn is_fresh_round(&self) -> bool {
        self.entries.is_empty() || self.total_raw.is_zero()
    }
}
