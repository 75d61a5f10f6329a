//! Connect-with-retry and its back-off schedule.

use std::time::Duration;

use tokio::time;
use tracing::{error, info};

use super::{BrokerConnector, BrokerError};

/// How many attempts to make and how long to wait between them.
///
/// The delay after the k-th failed attempt is `initial_backoff * 2^(k-1)`:
/// 1 s, 2 s, 4 s, 8 s … with the defaults.  There is no cap, and no delay
/// follows the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Establishes a session on `queue`, retrying with exponential back-off.
///
/// Each failed attempt is logged at error level with the step that failed.
///
/// # Errors
///
/// Returns [`BrokerError::Exhausted`] carrying the last failure once
/// `policy.max_attempts` attempts have failed.
pub async fn connect_with_retry<C>(
    connector: &C,
    queue: &str,
    policy: &RetryPolicy,
) -> Result<C::Session, BrokerError>
where
    C: BrokerConnector + ?Sized,
{
    let mut last = None;

    for attempt in 1..=policy.max_attempts {
        match connector.establish(queue).await {
            Ok(session) => {
                info!("subscribed to '{queue}' (attempt {attempt})");
                return Ok(session);
            }
            Err(e) => {
                error!(
                    "broker attempt {attempt}/{} for '{queue}' failed: {e}",
                    policy.max_attempts
                );
                last = Some(Box::new(e));
                if attempt < policy.max_attempts {
                    time::sleep(policy.backoff_for(attempt)).await;
                }
            }
        }
    }

    error!(
        "could not connect to the broker after {} tries",
        policy.max_attempts
    );
    Err(BrokerError::Exhausted {
        attempts: policy.max_attempts,
        last,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
