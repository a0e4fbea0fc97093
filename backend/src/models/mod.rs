pub mod leaderboard;
pub mod project;
pub mod vote;

pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use project::{parse_fallback_projects, projects_from_slots, Project};
pub use vote::VoteEvent;
