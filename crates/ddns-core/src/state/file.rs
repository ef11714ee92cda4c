// # File Config Store
//
// JSON file implementation of ConfigStore.
//
// ## Durability
//
// - Writes go to `<name>.tmp` first and are renamed over the record, so a
//   reader sees either the old or the new record, never a partial one
// - The previous record is copied to `<name>.backup` before each replace,
//   unless it no longer parses
// - A record that fails to parse is recovered from the backup when possible
//
// ## File Format
//
// ```json
// {
//   "globalSettings": {
//     "updateIntervalSeconds": 300,
//     "networkInterface": "wlan0",
//     "ipType": "dual"
//   },
//   "domainList": { "domains": ["home.dns.navy"], "token": "..." },
//   "notificationSettings": { "telegramBotToken": "", "telegramChatID": "" }
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::DdnsConfig;
use crate::traits::ConfigStore;

/// File-backed configuration store
///
/// A missing or blank file reads as "nothing stored". Saves are serialized
/// through an internal lock; loads never block on a writer.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::state::FileConfigStore;
/// use ddns_core::traits::ConfigStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileConfigStore::new("/etc/dynv6/config.json").await?;
///
///     if let Some(config) = store.load().await? {
///         println!("{} hostname(s)", config.domain_list.domains.len());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    /// Open a store at `path`, creating parent directories if needed
    ///
    /// The file itself is not created until the first save.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::state_store(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse one file
    ///
    /// Parse failures come back as [`Error::Json`] so the caller can tell
    /// corruption apart from I/O problems.
    async fn read_record(path: &Path) -> Result<Option<DdnsConfig>, Error> {
        if !path.exists() {
            tracing::debug!("Config file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let config: DdnsConfig = serde_json::from_str(&content)?;
        Ok(Some(config))
    }

    async fn load_with_recovery(&self) -> Result<Option<DdnsConfig>, Error> {
        let parse_error = match Self::read_record(&self.path).await {
            Err(Error::Json(e)) => e,
            other => return other,
        };

        tracing::warn!(
            "Config file {} appears corrupted: {}. Attempting recovery from backup.",
            self.path.display(),
            parse_error
        );

        let backup_path = Self::backup_path(&self.path);
        match Self::read_record(&backup_path).await {
            Ok(Some(config)) => {
                tracing::info!("Recovered configuration from {}", backup_path.display());
                let _guard = self.write_lock.lock().await;
                if let Err(e) = fs::copy(&backup_path, &self.path).await {
                    tracing::error!("Failed to restore config file from backup: {}", e);
                }
                Ok(Some(config))
            }
            Ok(None) => Err(Error::state_store(format!(
                "Failed to parse config file {}: {} (no backup available)",
                self.path.display(),
                parse_error
            ))),
            Err(backup_err) => Err(Error::state_store(format!(
                "Failed to parse config file {}: {} (backup unusable: {})",
                self.path.display(),
                parse_error,
                backup_err
            ))),
        }
    }

    async fn write_record(&self, config: &DdnsConfig) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| Error::state_store(format!("Failed to serialize config: {}", e)))?;

        let _guard = self.write_lock.lock().await;

        let temp_path = Self::temp_path(&self.path);
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Only a record that still parses may replace the backup.
        match Self::read_record(&self.path).await {
            Ok(Some(_)) => {
                let backup_path = Self::backup_path(&self.path);
                if let Err(e) = fs::copy(&self.path, &backup_path).await {
                    tracing::warn!("Failed to create backup: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(
                "Keeping existing backup, current record is unreadable: {}",
                e
            ),
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Configuration written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut temp = path.to_path_buf();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Option<DdnsConfig>, Error> {
        self.load_with_recovery().await
    }

    async fn save(&self, config: &DdnsConfig) -> Result<(), Error> {
        self.write_record(config).await
    }
}
