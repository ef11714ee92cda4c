//! Bounded retries with exponential backoff
//!
//! After the n-th failed attempt (1-indexed) the updater sleeps
//! `base_delay * 2^(n-1)`, including after the last attempt, so a 3-attempt
//! budget waits `base, 2*base, 4*base` before reporting the final failure.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::traits::{AddressPair, UpdateClient, UpdateOutcome};

/// Attempt budget and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per hostname and cycle (at least 1)
    pub max_attempts: u32,
    /// Delay after the first failure
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy, clamping `max_attempts` to at least one
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Policy described by the engine configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.retry_delay_secs),
        )
    }

    /// Backoff after the given failed attempt (1-indexed)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Wraps an [`UpdateClient`] with the retry policy
pub struct RetryingUpdater<'a> {
    client: &'a dyn UpdateClient,
    policy: RetryPolicy,
}

impl<'a> RetryingUpdater<'a> {
    /// Create an updater borrowing `client`
    pub fn new(client: &'a dyn UpdateClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Publish until the first success or until the budget is spent
    ///
    /// # Returns
    ///
    /// - `Ok(attempts)`: Attempt number that succeeded
    /// - `Err(Error::DeliveryExhausted)`: Every attempt failed; carries the
    ///   last failure reason
    pub async fn publish_with_retry(
        &self,
        addresses: &AddressPair,
        hostname: &str,
        token: &str,
    ) -> Result<u32> {
        let max = self.policy.max_attempts;
        let mut last_reason = String::new();

        for attempt in 1..=max {
            match self.client.publish(addresses, hostname, token).await {
                UpdateOutcome::Success => {
                    info!("Updated {}: {} (attempt {}/{})", hostname, addresses, attempt, max);
                    return Ok(attempt);
                }
                UpdateOutcome::TransientFailure(reason) => {
                    warn!(
                        "Update attempt {}/{} for {} failed: {}",
                        attempt, max, hostname, reason
                    );
                    last_reason = reason;
                    tokio::time::sleep(self.policy.delay_after(attempt)).await;
                }
            }
        }

        Err(Error::DeliveryExhausted {
            hostname: hostname.to_string(),
            attempts: max,
            reason: last_reason,
        })
    }
}
