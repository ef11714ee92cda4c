// Daemon settings, read once from the environment at startup.
//
// The configuration *record* (hostnames, token, interval, ...) lives in the
// config store; this only covers process-level plumbing.

use anyhow::{Context, Result};
use ddns_core::config::EngineConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Where the configuration record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Local JSON file, created by the wizard on first run
    File,
    /// Local JSON file written through the HTTP API
    Api,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub config_source: ConfigSource,
    pub config_path: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    pub api_listen: String,
    pub update_url: String,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_lookup(|key| std::env::var(key).ok(), &exe_dir)
    }

    /// Load configuration through `lookup`, resolving default paths against `exe_dir`
    pub fn from_lookup<F>(lookup: F, exe_dir: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_source = match lookup("DDNS_CONFIG_SOURCE").as_deref().map(str::trim) {
            None | Some("") | Some("file") => ConfigSource::File,
            Some("api") => ConfigSource::Api,
            Some(other) => anyhow::bail!(
                "DDNS_CONFIG_SOURCE '{}' is not supported. Supported sources: file, api",
                other
            ),
        };

        let max_retries = match lookup("DDNS_MAX_RETRIES") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DDNS_MAX_RETRIES must be an integer. Got: {}", raw))?,
            None => 3,
        };

        let retry_delay_secs = match lookup("DDNS_RETRY_DELAY_SECS") {
            Some(raw) => raw.trim().parse::<u64>().with_context(|| {
                format!("DDNS_RETRY_DELAY_SECS must be an integer. Got: {}", raw)
            })?,
            None => 10,
        };

        Ok(Self {
            config_source,
            config_path: lookup("DDNS_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| exe_dir.join("config.json")),
            log_file: lookup("DDNS_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| exe_dir.join("dynv6.log")),
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            api_listen: lookup("DDNS_API_LISTEN").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            update_url: lookup("DDNS_UPDATE_URL")
                .unwrap_or_else(|| ddns_provider_dynv6::DEFAULT_UPDATE_URL.to_string()),
            max_retries,
            retry_delay_secs,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("DDNS_CONFIG_PATH cannot be empty");
        }

        if self.log_file.as_os_str().is_empty() {
            anyhow::bail!("DDNS_LOG_FILE cannot be empty");
        }

        if !(1..=10).contains(&self.max_retries) {
            anyhow::bail!(
                "DDNS_MAX_RETRIES must be between 1 and 10. Got: {}",
                self.max_retries
            );
        }

        if !(1..=300).contains(&self.retry_delay_secs) {
            anyhow::bail!(
                "DDNS_RETRY_DELAY_SECS must be between 1 and 300 seconds. Got: {}",
                self.retry_delay_secs
            );
        }

        if !self.update_url.starts_with("http://") && !self.update_url.starts_with("https://") {
            anyhow::bail!(
                "DDNS_UPDATE_URL must use HTTP or HTTPS scheme. Got: {}",
                self.update_url
            );
        }

        if self.config_source == ConfigSource::Api {
            self.api_addr()?;
        }

        self.level()?;
        Ok(())
    }

    /// Parsed listen address for the HTTP API
    pub fn api_addr(&self) -> Result<SocketAddr> {
        self.api_listen.parse().with_context(|| {
            format!(
                "DDNS_API_LISTEN must be an address like 0.0.0.0:8080. Got: {}",
                self.api_listen
            )
        })
    }

    /// Parsed log level
    pub fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Engine tuning derived from the retry settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_attempts: self.max_retries,
            retry_delay_secs: self.retry_delay_secs,
            ..EngineConfig::default()
        }
    }
}
