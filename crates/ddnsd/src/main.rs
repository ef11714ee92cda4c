// # ddnsd - dynv6 Update Daemon
//
// Thin integration layer: reads process settings from the environment,
// wires the concrete adapters into `DdnsEngine` and runs it until SIGTERM or
// SIGINT. Update logic lives in ddns-core.
//
// ## Configuration
//
// Process settings come from environment variables:
//
// - `DDNS_CONFIG_SOURCE`: `file` (default) or `api`
// - `DDNS_CONFIG_PATH`: configuration record (default: `config.json` beside the binary)
// - `DDNS_LOG_FILE`: log file (default: `dynv6.log` beside the binary)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `DDNS_API_LISTEN`: listen address for the `api` source (default: 0.0.0.0:8080)
// - `DDNS_UPDATE_URL`: dynv6 update endpoint
// - `DDNS_MAX_RETRIES`: attempts per hostname per cycle (default: 3)
// - `DDNS_RETRY_DELAY_SECS`: backoff base in seconds (default: 10)
//
// The record itself (hostnames, token, interval, interface, ip type,
// notifications) is JSON. With the `file` source a missing record is created
// by the interactive wizard; with the `api` source it arrives via
// `POST /api/config` and the engine stays dormant until then.
//
// ## Example
//
// ```bash
// export DDNS_CONFIG_SOURCE=api
// export DDNS_API_LISTEN=0.0.0.0:8080
// ddnsd
// ```

mod config;
mod logging;
mod wizard;

use anyhow::{Context, Result};
use config::{Config, ConfigSource};
use ddns_api::{ApiState, CONFIG_PATH};
use ddns_core::config::{DdnsConfig, PLACEHOLDER_TOKEN};
use ddns_core::traits::{ConfigStore, InterfaceSource};
use ddns_core::{Activation, DdnsEngine, EngineEvent, FileConfigStore, activation_gate};
use ddns_ip_interface::{PnetInterfaceSource, available_interfaces};
use ddns_notify_telegram::TelegramNotifier;
use ddns_provider_dynv6::Dynv6Client;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use wizard::Wizard;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let initialized = config
        .level()
        .and_then(|level| logging::init(level, &config.log_file));
    if let Err(e) = initialized {
        eprintln!("Failed to initialize logging: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!("Configuration record: {}", config.config_path.display());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let daemon = match Daemon::prepare(&config).await {
            Ok(daemon) => daemon,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DdnsExitCode::ConfigError;
            }
        };

        if let Err(e) = daemon.run().await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Everything built during startup; failures up to here exit with 1
struct Daemon {
    engine: DdnsEngine,
    events: mpsc::Receiver<EngineEvent>,
    activation: Activation,
    api: Option<(TcpListener, ApiState)>,
    signals: ShutdownSignals,
}

impl Daemon {
    async fn prepare(config: &Config) -> Result<Self> {
        let signals = ShutdownSignals::install()?;
        let store = Arc::new(FileConfigStore::new(&config.config_path).await?);
        let client = Dynv6Client::with_update_url(config.update_url.as_str())?;
        info!("Publishing updates to {}", client.update_url());
        let notifier = TelegramNotifier::new()?;

        let (activation, api) = match config.config_source {
            ConfigSource::File => {
                let record = load_or_create_record(&store).await?;
                info!(
                    "Managing {} hostname(s) on interface '{}' ({}), every {}s",
                    record.domain_list.domains.len(),
                    record.global_settings.network_interface,
                    record.global_settings.ip_type,
                    record.global_settings.update_interval_seconds
                );
                (Activation::Immediate, None)
            }
            ConfigSource::Api => {
                let (trigger, waiter) = activation_gate();
                let stored = store
                    .load()
                    .await
                    .with_context(|| format!("Failed to read {}", store.path().display()))?;

                let activation = match stored.map(|record| record.normalized()) {
                    Some(record) if record.validate().is_ok() => {
                        info!("Stored configuration found, starting updates");
                        trigger.fire();
                        Activation::Immediate
                    }
                    _ => {
                        info!("Waiting for a configuration on POST {}", CONFIG_PATH);
                        Activation::Gated(waiter)
                    }
                };

                let addr = config.api_addr()?;
                let listener = TcpListener::bind(addr)
                    .await
                    .with_context(|| format!("Failed to bind configuration API on {}", addr))?;
                (activation, Some((listener, ApiState::new(store.clone(), trigger))))
            }
        };

        let (engine, events) = DdnsEngine::new(
            store,
            Box::new(PnetInterfaceSource::new()),
            Box::new(client),
            Box::new(notifier),
            config.engine_config(),
        );

        Ok(Self {
            engine,
            events,
            activation,
            api,
            signals,
        })
    }

    async fn run(self) -> Result<()> {
        let Daemon {
            engine,
            events,
            activation,
            api,
            mut signals,
        } = self;

        tokio::spawn(log_events(events));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            let signal = signals.recv().await;
            info!("Received shutdown signal: {}", signal);
            let _ = shutdown_tx.send(());
        });

        match api {
            Some((listener, state)) => {
                tokio::select! {
                    result = engine.run_with_shutdown(activation, shutdown_rx) => result?,
                    result = ddns_api::serve_on(listener, state) => {
                        return result.context("configuration API stopped");
                    }
                }
            }
            None => engine.run_with_shutdown(activation, shutdown_rx).await?,
        }

        info!("Shutting down daemon");
        Ok(())
    }
}

/// Load the record for the `file` source, running the wizard when none exists
async fn load_or_create_record(store: &FileConfigStore) -> Result<DdnsConfig> {
    let path = store.path().display().to_string();

    let record = match store
        .load()
        .await
        .with_context(|| format!("Failed to read {}", path))?
    {
        Some(record) => record,
        None => {
            if !std::io::stdin().is_terminal() {
                anyhow::bail!(
                    "No configuration found at {}. \
                    Run ddnsd from a terminal once to create it, or write the file by hand.",
                    path
                );
            }

            let known: Vec<String> = PnetInterfaceSource::new()
                .interfaces()
                .map(|list| list.into_iter().map(|set| set.name).collect())
                .unwrap_or_default();
            let suggested = available_interfaces();

            let created = tokio::task::spawn_blocking(move || {
                Wizard::new(std::io::stdin().lock(), std::io::stdout().lock(), known, suggested)
                    .run()
            })
            .await
            .context("Setup wizard panicked")?
            .context("Setup wizard did not finish")?;

            store.save(&created).await?;
            info!("Configuration written to {}", path);

            store
                .load()
                .await?
                .with_context(|| format!("{} is empty right after being written", path))?
        }
    };

    let record = record.normalized();
    if let Err(e) = record.validate() {
        if record.domain_list.token == PLACEHOLDER_TOKEN {
            anyhow::bail!("{}. Edit {} and set your dynv6 token.", e, path);
        }
        return Err(anyhow::Error::new(e).context(format!("Invalid configuration in {}", path)));
    }

    Ok(record)
}

async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::CycleCompleted(result) => debug!(
                "Cycle completed for {} hostname(s) with {}",
                result.hostnames.len(),
                result.addresses
            ),
            other => debug!("Engine event: {:?}", other),
        }
    }
}

/// SIGTERM and SIGINT handlers, installed before the engine starts
#[cfg(unix)]
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Fallback for non-Unix platforms: CTRL-C only
#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "SIGINT"
    }
}
