//! Configuration types for the update agent
//!
//! [`DdnsConfig`] is the record accepted from the configuration store and the
//! control plane. It is re-read by the engine at the top of every cycle.
//! [`EngineConfig`] holds the engine's own tuning, fixed for the process lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Token value the wizard writes when the user skips the prompt
pub const PLACEHOLDER_TOKEN: &str = "your_token_here";

/// Main configuration record
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DdnsConfig {
    /// Polling interval, interface and address family
    pub global_settings: GlobalSettings,

    /// Hostnames to publish and the provider token
    pub domain_list: DomainList,

    /// Optional Telegram notification target
    #[serde(default)]
    pub notification_settings: NotificationSettings,
}

impl DdnsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.global_settings.update_interval_seconds == 0 {
            return Err(crate::Error::config(
                "update interval must be a positive number of seconds",
            ));
        }

        if self.domain_list.domains.is_empty() {
            return Err(crate::Error::config("no domains configured"));
        }

        if self.domain_list.domains.iter().any(|d| d.trim().is_empty()) {
            return Err(crate::Error::config("domain names cannot be empty"));
        }

        let token = self.domain_list.token.trim();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            return Err(crate::Error::config(
                "a valid dynv6 token is required (placeholder tokens are rejected)",
            ));
        }

        Ok(())
    }

    /// Copy of the record with surrounding whitespace stripped from every
    /// free-text field. Stored records are always normalized.
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();
        config.global_settings.network_interface =
            config.global_settings.network_interface.trim().to_string();
        config.domain_list.domains = config
            .domain_list
            .domains
            .iter()
            .map(|d| d.trim().to_string())
            .collect();
        config.domain_list.token = config.domain_list.token.trim().to_string();
        config.notification_settings.telegram_bot_token =
            config.notification_settings.telegram_bot_token.trim().to_string();
        config.notification_settings.telegram_chat_id =
            config.notification_settings.telegram_chat_id.trim().to_string();
        config
    }

    /// Polling interval as a [`Duration`]
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.global_settings.update_interval_seconds)
    }
}

// The token must never reach the logs.
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("global_settings", &self.global_settings)
            .field("domains", &self.domain_list.domains)
            .field("token", &"<REDACTED>")
            .field(
                "notifications",
                &self.notification_settings.is_enabled(),
            )
            .finish()
    }
}

/// Global polling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Seconds between two cycles
    pub update_interval_seconds: u64,

    /// Interface to inspect; empty selects the first up, non-loopback one
    #[serde(default)]
    pub network_interface: String,

    /// Address families to publish
    pub ip_type: IpVersion,
}

/// Hostnames and credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainList {
    /// Hostnames, published in listed order
    pub domains: Vec<String>,

    /// dynv6 HTTP token
    pub token: String,
}

impl fmt::Debug for DomainList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainList")
            .field("domains", &self.domains)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

/// Telegram notification target; both fields empty disables notifications
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Bot token
    #[serde(rename = "telegramBotToken", default)]
    pub telegram_bot_token: String,

    /// Chat or channel identifier
    #[serde(rename = "telegramChatID", default)]
    pub telegram_chat_id: String,
}

impl NotificationSettings {
    /// Whether both fields are set
    pub fn is_enabled(&self) -> bool {
        !self.telegram_bot_token.is_empty() && !self.telegram_chat_id.is_empty()
    }
}

impl fmt::Debug for NotificationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationSettings")
            .field("telegram_bot_token", &"<REDACTED>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

/// Address family mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    /// IPv4 only
    #[serde(rename = "ipv4")]
    V4,
    /// IPv6 only
    #[serde(rename = "ipv6")]
    V6,
    /// Both IPv4 and IPv6
    #[serde(rename = "dual")]
    Both,
}

impl IpVersion {
    /// Whether this mode asks for an IPv4 address
    pub fn wants_v4(self) -> bool {
        matches!(self, IpVersion::V4 | IpVersion::Both)
    }

    /// Whether this mode asks for an IPv6 address
    pub fn wants_v6(self) -> bool {
        matches!(self, IpVersion::V6 | IpVersion::Both)
    }

    /// Wire name of the mode
    pub fn as_str(self) -> &'static str {
        match self {
            IpVersion::V4 => "ipv4",
            IpVersion::V6 => "ipv6",
            IpVersion::Both => "dual",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipv4" => Ok(IpVersion::V4),
            "ipv6" => Ok(IpVersion::V6),
            "dual" => Ok(IpVersion::Both),
            other => Err(crate::Error::config(format!(
                "ip type must be ipv4, ipv6 or dual, got '{}'",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delivery attempts per hostname and cycle
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay between attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Delay before re-reading an unreadable or empty store (in seconds)
    #[serde(default = "default_storage_retry_delay_secs")]
    pub storage_retry_delay_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            storage_retry_delay_secs: default_storage_retry_delay_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    10
}

fn default_storage_retry_delay_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    100
}
