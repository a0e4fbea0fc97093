pub mod models;
pub mod services;
pub mod handlers;
pub mod utils;
pub mod constants;

#[cfg(test)]
mod testing;

pub use utils::config::Config;
pub use services::{ChainReader, LeaderboardBot, LeaderboardPublisher, TelegramClient};

// Re-export common types
pub use anyhow::Result;
pub use alloy::primitives::{Address, U256};
