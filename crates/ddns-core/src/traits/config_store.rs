// # Config Store Trait
//
// Defines the interface for persistent configuration storage.
//
// ## Purpose
//
// The store is the only resource shared across tasks: the engine reads it at
// the top of every cycle while the control plane may write it at any time.
// Implementations must keep a single logical record intact under concurrent
// read and write. Last write wins.
//
// ## Implementations
//
// - File-based: `FileConfigStore` (JSON with atomic replace)
// - In-memory: `MemoryConfigStore`

use async_trait::async_trait;

use crate::config::DdnsConfig;

/// Trait for configuration store implementations
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the current record
    ///
    /// # Returns
    ///
    /// - `Ok(Some(DdnsConfig))`: The stored record
    /// - `Ok(None)`: Nothing stored yet
    /// - `Err(Error)`: Storage error
    async fn load(&self) -> Result<Option<DdnsConfig>, crate::Error>;

    /// Replace the stored record
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The record is durably stored
    /// - `Err(Error)`: Storage error
    async fn save(&self, config: &DdnsConfig) -> Result<(), crate::Error>;
}
