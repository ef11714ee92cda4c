// # ddns-core
//
// Core library for the dynv6 update agent.
//
// ## Architecture Overview
//
// - **InterfaceSource**: Trait for enumerating local interfaces and addresses
// - **UpdateClient**: Trait for publishing addresses to the dynv6 API
// - **ConfigStore**: Trait for the shared configuration record
// - **Notifier**: Trait for best-effort status messages
// - **DdnsEngine**: Polling loop tying resolution, change tracking and retries together
//
// Adapters live in their own crates (`ddns-ip-interface`,
// `ddns-provider-dynv6`, `ddns-notify-telegram`, `ddns-api`) and the daemon
// wires them up.

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod retry;
pub mod state;
pub mod tracker;
pub mod traits;

// Re-export core types for convenience
pub use config::{DdnsConfig, DomainList, EngineConfig, GlobalSettings, IpVersion, NotificationSettings};
pub use engine::{Activation, CycleResult, CycleStatus, DdnsEngine, EngineEvent, HostnameOutcome};
pub use error::{Error, Result};
pub use gate::{ActivationTrigger, ActivationWaiter, activation_gate};
pub use resolver::AddressResolver;
pub use retry::{RetryPolicy, RetryingUpdater};
pub use state::{FileConfigStore, MemoryConfigStore};
pub use tracker::ChangeTracker;
pub use traits::{AddressPair, ConfigStore, InterfaceAddressSet, InterfaceSource, Notifier, UpdateClient, UpdateOutcome};
