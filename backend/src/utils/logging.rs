use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used by the server when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str =
    "jade_leaderboard=info,tower_http=debug,server=debug,endpoint_checker=debug";

pub fn init_logging() {
    init_logging_with(DEFAULT_LOG_FILTER);
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over
/// `default_filter`; a second call is a no-op.
pub fn init_logging_with(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_logging();
        init_logging_with("endpoint_checker=info");
        tracing::info!("still logging");
    }
}
