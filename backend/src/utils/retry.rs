use std::fmt::Display;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::constants::{DEFAULT_RPC_RETRY_ATTEMPTS, DEFAULT_RPC_RETRY_DELAY_SECS};

/// Fixed attempt count with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn no_delay(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RPC_RETRY_ATTEMPTS,
            Duration::from_secs(DEFAULT_RPC_RETRY_DELAY_SECS),
        )
    }
}

/// Error from the last attempt, plus how many attempts were made.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Runs `op` until it succeeds or the policy's attempts are used up.
pub async fn retry_fixed<F, Fut, T, E>(
    operation_name: &str,
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                warn!(
                    "{}: attempt {}/{} failed, retrying in {:?}: {}",
                    operation_name, attempt, policy.max_attempts, policy.delay, e
                );
                if !policy.delay.is_zero() {
                    sleep(policy.delay).await;
                }
            }
            Err(e) => {
                warn!(
                    "{}: attempt {}/{} failed, giving up: {}",
                    operation_name, attempt, policy.max_attempts, e
                );
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
        }
    }
}
