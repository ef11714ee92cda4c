// # Core Traits
//
// This module defines the extension points of the update agent.

pub mod address_source;
pub mod config_store;
pub mod notifier;
pub mod update_client;

pub use address_source::{AddressPair, InterfaceAddressSet, InterfaceSource};
pub use config_store::ConfigStore;
pub use notifier::{NoopNotifier, Notifier};
pub use update_client::{UpdateClient, UpdateOutcome};
