// # Update Client Trait
//
// Defines the interface for publishing addresses to the dynamic-DNS provider.
//
// ## Implementations
//
// - dynv6: `ddns-provider-dynv6` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::{AddressPair, UpdateClient, UpdateOutcome};
//
// let outcome = client.publish(&addresses, "a.dns.navy", &token).await;
// if outcome.is_success() {
//     tracker.record("a.dns.navy", addresses.ipv6);
// }
// ```

use async_trait::async_trait;

use super::AddressPair;

/// Result of one publish attempt
///
/// Every failure is treated as transient; the retry budget bounds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Provider confirmed the update
    Success,
    /// Provider rejected the update or the transport failed
    TransientFailure(String),
}

impl UpdateOutcome {
    /// Whether the attempt succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Success)
    }
}

/// Trait for update client implementations
///
/// # Responsibilities
///
/// A client performs exactly one remote call per `publish` and classifies
/// the response. It does not retry, sleep, or touch the change tracker;
/// those are owned by `RetryingUpdater` and `DdnsEngine`.
#[async_trait]
pub trait UpdateClient: Send + Sync {
    /// Publish the present addresses for one hostname
    ///
    /// Absent families are omitted from the request rather than sent empty.
    ///
    /// # Parameters
    ///
    /// - `addresses`: Addresses to publish (at least one present)
    /// - `hostname`: Hostname to update (e.g., "a.dns.navy")
    /// - `token`: Provider authentication token
    async fn publish(&self, addresses: &AddressPair, hostname: &str, token: &str) -> UpdateOutcome;

    /// Get the client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}
