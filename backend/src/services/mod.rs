pub mod chain;
pub mod leaderboard_bot;
pub mod publisher;
pub mod telegram;

pub use chain::{ChainError, ChainReader, ProjectSource, RpcEndpoint, VotingEndpoint};
pub use leaderboard_bot::{run_poll_loop, CycleOutcome, LeaderboardBot, SkipReason};
pub use publisher::{LeaderboardPublisher, PublishError, PublishOutcome};
pub use telegram::{MessageId, Messenger, MessengerError, TelegramClient};
