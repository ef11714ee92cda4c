// # Memory Config Store
//
// In-memory implementation of ConfigStore. Nothing survives a restart.
// Used by tests and by embedders that manage persistence themselves.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::DdnsConfig;
use crate::traits::ConfigStore;

/// In-memory configuration store
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<RwLock<Option<DdnsConfig>>>,
}

impl MemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `config`
    pub fn with_config(config: DdnsConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(config))),
        }
    }

    /// Drop the stored record
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Option<DdnsConfig>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, config: &DdnsConfig) -> Result<(), Error> {
        *self.inner.write().await = Some(config.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DomainList, GlobalSettings, IpVersion, NotificationSettings};

    fn config() -> DdnsConfig {
        DdnsConfig {
            global_settings: GlobalSettings {
                update_interval_seconds: 30,
                network_interface: String::new(),
                ip_type: IpVersion::V4,
            },
            domain_list: DomainList {
                domains: vec!["a.dns.navy".to_string()],
                token: "token".to_string(),
            },
            notification_settings: NotificationSettings::default(),
        }
    }

    #[tokio::test]
    async fn clones_share_the_record() {
        let store = MemoryConfigStore::new();
        let other = store.clone();
        assert!(store.load().await.unwrap().is_none());

        other.save(&config()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(config()));

        store.clear().await;
        assert!(other.load().await.unwrap().is_none());
    }
}
