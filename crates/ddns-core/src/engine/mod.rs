//! Core polling engine
//!
//! The DdnsEngine is responsible for:
//! - Re-reading the configuration record at the top of every cycle
//! - Resolving the interface's public addresses
//! - Checking the change tracker for each hostname
//! - Publishing via the retrying updater
//! - Recording successful publishes and notifying on every outcome
//!
//! ## Architecture
//!
//! ```text
//!  ┌─────────────┐        ┌───────────────────┐
//!  │ ConfigStore │──load──▶                   │
//!  └─────────────┘        │                   │──resolve──▶ AddressResolver
//!                         │    DdnsEngine     │
//!  ┌─────────────┐        │  (ChangeTracker)  │──publish──▶ RetryingUpdater ─▶ UpdateClient
//!  │ Activation  │──once──▶                   │
//!  └─────────────┘        └───────────────────┘──notify───▶ Notifier
//!                                   │
//!                                   ▼
//!                              EngineEvent
//! ```
//!
//! ## Lifecycle
//!
//! 1. Dormant: with [`Activation::Gated`] the engine waits for the first
//!    activation signal. [`Activation::Immediate`] skips this phase.
//! 2. Active: run a cycle, sleep for the returned delay, repeat.
//! 3. Shutdown is only observed while dormant or sleeping; a running cycle,
//!    retries included, always completes.

use std::net::Ipv6Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::{DdnsConfig, EngineConfig};
use crate::error::{Error, Result};
use crate::gate::ActivationWaiter;
use crate::resolver::AddressResolver;
use crate::retry::{RetryPolicy, RetryingUpdater};
use crate::tracker::ChangeTracker;
use crate::traits::{AddressPair, ConfigStore, InterfaceSource, Notifier, UpdateClient};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine task started
    Started,

    /// Engine left the dormant phase
    Activated,

    /// No usable configuration could be read this cycle
    ///
    /// `recoverable` is false when the stored record itself is invalid and
    /// will keep failing until it is replaced.
    StoreUnavailable {
        error: String,
        recoverable: bool,
    },

    /// Address resolution failed; the whole cycle is deferred
    ResolutionFailed {
        error: String,
    },

    /// Delivery suppressed because IPv6 did not change
    UpdateSkipped {
        hostname: String,
        ipv6: Option<Ipv6Addr>,
    },

    /// Delivery succeeded
    UpdateSucceeded {
        hostname: String,
        addresses: AddressPair,
        attempts: u32,
    },

    /// Every delivery attempt failed
    UpdateFailed {
        hostname: String,
        error: String,
        attempts: u32,
    },

    /// All hostnames of one cycle were processed
    CycleCompleted(CycleResult),

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// What happened to one hostname in one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostnameOutcome {
    /// Published on the given attempt
    Published { attempts: u32 },
    /// Skipped by the change tracker
    Suppressed,
    /// Retry budget exhausted
    Failed { attempts: u32, reason: String },
}

/// Per-cycle summary, used only for observability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleResult {
    /// Addresses resolved at the start of the cycle
    pub addresses: AddressPair,
    /// Outcome per hostname, in configured order
    pub hostnames: Vec<(String, HostnameOutcome)>,
}

impl CycleResult {
    /// Outcome for one hostname
    pub fn outcome(&self, hostname: &str) -> Option<&HostnameOutcome> {
        self.hostnames
            .iter()
            .find(|(name, _)| name == hostname)
            .map(|(_, outcome)| outcome)
    }
}

/// Result of [`DdnsEngine::run_cycle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleStatus {
    /// Every hostname was processed
    Completed {
        result: CycleResult,
        next_in: Duration,
    },
    /// The cycle stopped before any delivery
    Deferred { reason: String, next_in: Duration },
}

impl CycleStatus {
    /// Delay before the next cycle
    pub fn next_in(&self) -> Duration {
        match self {
            CycleStatus::Completed { next_in, .. } | CycleStatus::Deferred { next_in, .. } => {
                *next_in
            }
        }
    }
}

/// How the engine enters the active phase
#[derive(Debug)]
pub enum Activation {
    /// Configuration is available at startup; start polling right away
    Immediate,
    /// Stay dormant until the gate fires
    Gated(ActivationWaiter),
}

/// Core polling engine
///
/// The engine owns the [`ChangeTracker`] exclusively; nothing else mutates
/// it, so no locking is involved. The configuration store is the only state
/// shared with other tasks.
pub struct DdnsEngine {
    /// Configuration record, re-read every cycle
    store: Arc<dyn ConfigStore>,

    /// Public address discovery
    resolver: AddressResolver,

    /// Provider client
    client: Box<dyn UpdateClient>,

    /// Status messages
    notifier: Box<dyn Notifier>,

    /// Attempt budget and backoff
    retry: RetryPolicy,

    /// Delay when no usable record can be read
    storage_retry_delay: Duration,

    /// Last published IPv6 per hostname
    tracker: ChangeTracker,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        store: Arc<dyn ConfigStore>,
        source: Box<dyn InterfaceSource>,
        client: Box<dyn UpdateClient>,
        notifier: Box<dyn Notifier>,
        config: EngineConfig,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(config.event_channel_capacity.max(1));

        let engine = Self {
            store,
            resolver: AddressResolver::new(source),
            client,
            notifier,
            retry: RetryPolicy::from_config(&config),
            storage_retry_delay: Duration::from_secs(config.storage_retry_delay_secs),
            tracker: ChangeTracker::new(),
            event_tx: tx,
        };

        (engine, rx)
    }

    /// Change tracker state
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Run the engine until `shutdown_rx` resolves
    ///
    /// Dropping the sender counts as a shutdown request.
    pub async fn run_with_shutdown(
        mut self,
        activation: Activation,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<()> {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        tokio::pin!(shutdown);

        self.emit_event(EngineEvent::Started);

        if let Activation::Gated(waiter) = activation {
            info!("Waiting for a configuration before polling");
            tokio::select! {
                result = waiter.wait() => result?,
                _ = &mut shutdown => {
                    info!("Shutdown signal received while dormant");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    return Ok(());
                }
            }
        }

        info!("Starting dynv6 IP update loop");
        self.emit_event(EngineEvent::Activated);

        loop {
            let status = self.run_cycle().await;
            let delay = status.next_in();
            debug!("Next cycle in {:?}", delay);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        Ok(())
    }

    /// Run one full cycle
    ///
    /// Loads the record, resolves addresses and processes every hostname in
    /// listed order. Never fails: problems are logged, notified and turned
    /// into a [`CycleStatus::Deferred`].
    pub async fn run_cycle(&mut self) -> CycleStatus {
        let config = match self.load_config().await {
            Ok(config) => config,
            Err(e) => {
                let recoverable = e.is_recoverable();
                if recoverable {
                    warn!("No usable configuration: {}", e);
                } else {
                    error!("Stored configuration rejected, updates paused until it is replaced: {}", e);
                }
                self.emit_event(EngineEvent::StoreUnavailable {
                    error: e.to_string(),
                    recoverable,
                });
                return CycleStatus::Deferred {
                    reason: e.to_string(),
                    next_in: self.storage_retry_delay,
                };
            }
        };

        let interval = config.update_interval();
        let settings = &config.global_settings;

        let addresses = match self
            .resolver
            .resolve(&settings.network_interface, settings.ip_type)
        {
            Ok(addresses) => addresses,
            Err(e) => {
                let message = format!("Failed to resolve IP: {}", e);
                error!("{}", message);
                self.notifier
                    .notify(&config.notification_settings, &message)
                    .await;
                self.emit_event(EngineEvent::ResolutionFailed {
                    error: e.to_string(),
                });
                return CycleStatus::Deferred {
                    reason: message,
                    next_in: interval,
                };
            }
        };

        let mut result = CycleResult {
            addresses,
            hostnames: Vec::with_capacity(config.domain_list.domains.len()),
        };

        for hostname in &config.domain_list.domains {
            let outcome = self.process_hostname(&config, hostname, &addresses).await;
            result.hostnames.push((hostname.clone(), outcome));
        }

        self.emit_event(EngineEvent::CycleCompleted(result.clone()));

        CycleStatus::Completed {
            result,
            next_in: interval,
        }
    }

    async fn load_config(&self) -> Result<DdnsConfig> {
        let config = self
            .store
            .load()
            .await?
            .ok_or_else(|| Error::state_store("no configuration stored"))?
            .normalized();
        config.validate()?;
        Ok(config)
    }

    async fn process_hostname(
        &mut self,
        config: &DdnsConfig,
        hostname: &str,
        addresses: &AddressPair,
    ) -> HostnameOutcome {
        let mode = config.global_settings.ip_type;

        if !self.tracker.should_publish(hostname, mode, addresses.ipv6) {
            match self.tracker.get(hostname) {
                Some(last) => info!(
                    "IPv6 for {} unchanged ({:?}) since {}, skipping update",
                    hostname,
                    addresses.ipv6,
                    last.published_at.to_rfc3339()
                ),
                None => info!("No IPv6 to publish for {} yet, skipping update", hostname),
            }
            self.emit_event(EngineEvent::UpdateSkipped {
                hostname: hostname.to_string(),
                ipv6: addresses.ipv6,
            });
            return HostnameOutcome::Suppressed;
        }

        let updater = RetryingUpdater::new(self.client.as_ref(), self.retry);
        let published = updater
            .publish_with_retry(addresses, hostname, &config.domain_list.token)
            .await;

        match published {
            Ok(attempts) => {
                self.tracker.record(hostname, addresses.ipv6);
                let message = format!("Updated {}: {}", hostname, addresses);
                self.notifier
                    .notify(&config.notification_settings, &message)
                    .await;
                self.emit_event(EngineEvent::UpdateSucceeded {
                    hostname: hostname.to_string(),
                    addresses: *addresses,
                    attempts,
                });
                HostnameOutcome::Published { attempts }
            }
            Err(e) => {
                let (attempts, reason) = match &e {
                    Error::DeliveryExhausted {
                        attempts, reason, ..
                    } => (*attempts, reason.clone()),
                    other => (self.retry.max_attempts, other.to_string()),
                };
                let message = format!("Failed to update {}: {}", hostname, e);
                error!("{}", message);
                self.notifier
                    .notify(&config.notification_settings, &message)
                    .await;
                self.emit_event(EngineEvent::UpdateFailed {
                    hostname: hostname.to_string(),
                    error: e.to_string(),
                    attempts,
                });
                HostnameOutcome::Failed { attempts, reason }
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
