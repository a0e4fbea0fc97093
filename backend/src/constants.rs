// =============================================================================
// Jade Leaderboard Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// CONTRACT LAYOUT
// =============================================================================

/// Number of project slots returned by `getProjects()`
pub const MAX_PROJECT_SLOTS: usize = 20;

/// Decimals of the vote token (ERC-20 style fixed point)
pub const TOKEN_DECIMALS: u8 = 18;

/// Decimal places shown for per-project vote totals
pub const VOTE_DISPLAY_PLACES: u8 = 4;

/// Decimal places shown for the leaderboard total
pub const TOTAL_DISPLAY_PLACES: u8 = 0;

// =============================================================================
// CHAIN READER CONFIGURATION
// =============================================================================

/// How many times a contract read is attempted before the cycle is skipped
pub const DEFAULT_RPC_RETRY_ATTEMPTS: u32 = 3;

/// Fixed delay between contract read attempts
pub const DEFAULT_RPC_RETRY_DELAY_SECS: u64 = 10;

/// Round shown when neither an override nor the chain counter is available
pub const DEFAULT_ROUND: u64 = 1;

// =============================================================================
// SCHEDULER CONFIGURATION
// =============================================================================

/// How often the leaderboard is refreshed
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;

// =============================================================================
// TELEGRAM CONFIGURATION
// =============================================================================

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

/// Parse mode used for every outgoing message
pub const TELEGRAM_PARSE_MODE: &str = "Markdown";

/// Request timeout for Bot API calls
pub const TELEGRAM_REQUEST_TIMEOUT_SECS: u64 = 15;

// =============================================================================
// LEADERBOARD PRESENTATION
// =============================================================================

pub const DEFAULT_LEADERBOARD_TITLE: &str = "Jade1 Live Leaderboard";

pub const DEFAULT_TOKEN_SYMBOL: &str = "JADE";

pub const DEFAULT_FOOTER_URL: &str = "https://jade1.io";

/// Shown in place of an empty project symbol
pub const MISSING_SYMBOL_PLACEHOLDER: &str = "???";

pub const ROUND_JUST_STARTED_NOTICE: &str = "_Round just started: no votes yet._";

// =============================================================================
// WALLET DISPLAY
// =============================================================================

/// Leading characters kept when shortening a wallet address
pub const WALLET_PREFIX_CHARS: usize = 6;

/// Trailing characters kept when shortening a wallet address
pub const WALLET_SUFFIX_CHARS: usize = 4;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

// =============================================================================
// HELPER FUNCTIONS FOR VALIDATION
// =============================================================================

/// A wallet is displayable when it is long enough to shorten without overlap
pub fn is_displayable_wallet(wallet: &str) -> bool {
    wallet.trim().chars().count() >= WALLET_PREFIX_CHARS + WALLET_SUFFIX_CHARS
}
