pub mod config;
pub mod formatting;
pub mod logging;
pub mod retry;
pub mod token_conversion;

pub use config::Config;
pub use logging::{init_logging, init_logging_with};
pub use retry::{retry_fixed, RetryPolicy};
