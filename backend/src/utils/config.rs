use alloy::primitives::{Address, U256};
use anyhow::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::models::{parse_fallback_projects, Project};
use crate::utils::formatting::LeaderboardStyle;
use crate::utils::retry::RetryPolicy;
use crate::utils::token_conversion::parse_token_amount;

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Contract and RPC settings. Everything the endpoint checker needs.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_urls: Vec<String>,
    pub contract_address: Address,
    pub retry: RetryPolicy,
    pub default_round: u64,
    /// Leader name and minimum raw votes for the staleness heuristic
    pub stale_leader: Option<(String, U256)>,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub leaderboard_chat_id: String,
    pub broadcast_chat_ids: Vec<String>,
    pub api_base_url: String,
    pub pin_leaderboard: bool,
}

#[derive(Debug, Clone)]
pub struct LeaderboardConfig {
    pub poll_interval: Duration,
    pub round_override: Option<String>,
    pub fallback_projects: Vec<Project>,
    pub refresh_on_vote: bool,
    pub style: LeaderboardStyle,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub chain: ChainConfig,
    pub telegram: TelegramConfig,
    pub leaderboard: LeaderboardConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    pub fn from_lookup(lookup: Lookup) -> Result<Self> {
        Ok(Self {
            port: parsed_or(lookup, "PORT", DEFAULT_SERVER_PORT),
            telegram: TelegramConfig::from_lookup(lookup)?,
            chain: ChainConfig::from_lookup(lookup)?,
            leaderboard: LeaderboardConfig::from_lookup(lookup),
        })
    }
}

impl ChainConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    pub fn from_lookup(lookup: Lookup) -> Result<Self> {
        let rpc_urls = optional(lookup, "RPC_URLS")
            .or_else(|| optional(lookup, "RPC_URL"))
            .map(|raw| split_list(&raw))
            .unwrap_or_default();
        if rpc_urls.is_empty() {
            return Err(anyhow::anyhow!("RPC_URLS (or RPC_URL) must be set"));
        }

        let contract_address: Address = required(lookup, "CONTRACT_ADDRESS")?
            .parse()
            .map_err(|e| anyhow::anyhow!("CONTRACT_ADDRESS is not a valid address: {}", e))?;

        let retry = RetryPolicy::new(
            parsed_or(lookup, "RPC_RETRY_ATTEMPTS", DEFAULT_RPC_RETRY_ATTEMPTS),
            Duration::from_secs(parsed_or(lookup, "RPC_RETRY_DELAY_SECS", DEFAULT_RPC_RETRY_DELAY_SECS)),
        );

        let stale_leader = match optional(lookup, "STALE_LEADER_NAME") {
            Some(name) => {
                let min_votes = optional(lookup, "STALE_LEADER_MIN_VOTES")
                    .ok_or_else(|| anyhow::anyhow!("STALE_LEADER_MIN_VOTES must be set with STALE_LEADER_NAME"))?;
                Some((name, parse_token_amount(&min_votes)?))
            }
            None => None,
        };

        Ok(Self {
            rpc_urls,
            contract_address,
            retry,
            default_round: parsed_or(lookup, "DEFAULT_ROUND", DEFAULT_ROUND),
            stale_leader,
        })
    }
}

impl TelegramConfig {
    pub fn from_lookup(lookup: Lookup) -> Result<Self> {
        let bot_token = optional(lookup, "TELEGRAM_BOT_TOKEN")
            .or_else(|| optional(lookup, "BOT_TOKEN"))
            .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT_TOKEN (or BOT_TOKEN) must be set"))?;
        let leaderboard_chat_id = required(lookup, "CHANNEL_ID")?;

        let broadcast_chat_ids = optional(lookup, "BROADCAST_CHAT_IDS")
            .map(|raw| split_list(&raw))
            .filter(|ids| !ids.is_empty())
            .unwrap_or_else(|| vec![leaderboard_chat_id.clone()]);

        Ok(Self {
            bot_token,
            leaderboard_chat_id,
            broadcast_chat_ids,
            api_base_url: optional(lookup, "TELEGRAM_API_URL")
                .unwrap_or_else(|| TELEGRAM_API_BASE_URL.to_string()),
            pin_leaderboard: flag(lookup, "PIN_LEADERBOARD", true),
        })
    }
}

impl LeaderboardConfig {
    pub fn from_lookup(lookup: Lookup) -> Self {
        let style = LeaderboardStyle {
            title: optional(lookup, "LEADERBOARD_TITLE")
                .unwrap_or_else(|| DEFAULT_LEADERBOARD_TITLE.to_string()),
            token_symbol: optional(lookup, "TOKEN_SYMBOL")
                .unwrap_or_else(|| DEFAULT_TOKEN_SYMBOL.to_string()),
            footer_url: match lookup("FOOTER_URL") {
                // explicitly empty disables the footer
                Some(url) => Some(url.trim().to_string()).filter(|u| !u.is_empty()),
                None => Some(DEFAULT_FOOTER_URL.to_string()),
            },
        };

        Self {
            poll_interval: Duration::from_secs(
                parsed_or(lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS).max(1),
            ),
            round_override: optional(lookup, "ROUND_OVERRIDE"),
            fallback_projects: optional(lookup, "FALLBACK_PROJECTS")
                .map(|raw| parse_fallback_projects(&raw))
                .unwrap_or_default(),
            refresh_on_vote: flag(lookup, "REFRESH_ON_VOTE", true),
            style,
        }
    }
}

fn optional(lookup: Lookup, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(lookup: Lookup, key: &str) -> Result<String> {
    optional(lookup, key).ok_or_else(|| anyhow::anyhow!("{} must be set", key))
}

fn parsed_or<T: FromStr>(lookup: Lookup, key: &str, default: T) -> T {
    optional(lookup, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn flag(lookup: Lookup, key: &str, default: bool) -> bool {
    match optional(lookup, key).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
