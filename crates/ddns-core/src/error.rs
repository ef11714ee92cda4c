//! Error types for the update agent
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the update agent
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration record failed validation
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// No interface is up apart from loopback
    #[error("No usable network interface available")]
    NoInterfaceAvailable,

    /// The named interface does not exist or cannot be queried
    #[error("Network interface not found: {name}")]
    InterfaceNotFound {
        /// Requested interface name
        name: String,
    },

    /// The interface exposes no address of the requested family
    #[error("No qualifying public address (interface: {interface}, ip type: {mode})")]
    NoQualifyingAddress {
        /// Interface that was inspected
        interface: String,
        /// Requested address family mode
        mode: crate::config::IpVersion,
    },

    /// Every delivery attempt for a hostname failed
    #[error("Update of {hostname} failed after {attempts} attempt(s): {reason}")]
    DeliveryExhausted {
        /// Hostname being published
        hostname: String,
        /// Number of attempts made
        attempts: u32,
        /// Reason reported by the last attempt
        reason: String,
    },

    /// Configuration storage errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Activation gate closed before it fired
    #[error("Activation error: {0}")]
    Activation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration validation error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(msg.into())
    }

    /// Create an interface lookup error
    pub fn interface_not_found(name: impl Into<String>) -> Self {
        Self::InterfaceNotFound { name: name.into() }
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create an activation error
    pub fn activation(msg: impl Into<String>) -> Self {
        Self::Activation(msg.into())
    }

    /// Whether the polling loop can carry on after this error.
    ///
    /// Only configuration errors are fatal, and only at startup or at the
    /// API boundary; everything else defers the cycle.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ConfigurationInvalid(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
