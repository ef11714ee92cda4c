//! Per-hostname change detection
//!
//! Remembers the IPv6 value last published for each hostname. Deduplication
//! is keyed on IPv6 only, in every mode: IPv4-only mode never suppresses, and
//! dual mode ignores IPv4 changes while IPv6 stays put.

use std::collections::HashMap;
use std::net::Ipv6Addr;

use chrono::{DateTime, Utc};

use crate::config::IpVersion;

/// Last successful publish for one hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameRecord {
    /// IPv6 value that was published (absent if none was sent)
    pub ipv6: Option<Ipv6Addr>,
    /// When the publish succeeded
    pub published_at: DateTime<Utc>,
}

/// Map of hostname to last published IPv6
///
/// Owned by the engine task; entries are created on the first successful
/// publish and overwritten on each later one. Entries for hostnames removed
/// from the configuration are never read again.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    records: HashMap<String, HostnameRecord>,
}

impl ChangeTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `hostname` needs a delivery this cycle
    ///
    /// Under `ipv6` or `dual` mode the answer is `false` when `current_ipv6`
    /// equals the remembered value. A hostname never published compares as
    /// absent, so an absent IPv6 on a fresh hostname is suppressed too.
    pub fn should_publish(&self, hostname: &str, mode: IpVersion, current_ipv6: Option<Ipv6Addr>) -> bool {
        if !mode.wants_v6() {
            return true;
        }
        self.last_ipv6(hostname) != current_ipv6
    }

    /// Remember a successful publish
    pub fn record(&mut self, hostname: &str, ipv6: Option<Ipv6Addr>) {
        self.records.insert(
            hostname.to_string(),
            HostnameRecord {
                ipv6,
                published_at: Utc::now(),
            },
        );
    }

    /// Last published IPv6 for `hostname`
    pub fn last_ipv6(&self, hostname: &str) -> Option<Ipv6Addr> {
        self.records.get(hostname).and_then(|r| r.ipv6)
    }

    /// Full record for `hostname`
    pub fn get(&self, hostname: &str) -> Option<&HostnameRecord> {
        self.records.get(hostname)
    }

    /// Number of hostnames ever published
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been published yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
