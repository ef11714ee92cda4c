//! Test doubles and common utilities for engine contract tests
//!
//! Every double hands out shared counters so a test can keep a handle after
//! boxing the original into the engine.

#![allow(dead_code)]

use ddns_core::config::{
    DdnsConfig, DomainList, EngineConfig, GlobalSettings, IpVersion, NotificationSettings,
};
use ddns_core::engine::{CycleResult, DdnsEngine, EngineEvent};
use ddns_core::error::{Error, Result};
use ddns_core::state::MemoryConfigStore;
use ddns_core::traits::{
    AddressPair, ConfigStore, InterfaceAddressSet, InterfaceSource, Notifier, UpdateClient,
    UpdateOutcome,
};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const TOKEN: &str = "test-token";
pub const INTERFACE: &str = "wlan0";

/// An interface table the test can rewrite between cycles
#[derive(Clone)]
pub struct StaticInterfaces {
    table: Arc<Mutex<Vec<InterfaceAddressSet>>>,
}

impl StaticInterfaces {
    /// A single up interface named [`INTERFACE`] with the given addresses
    pub fn single(addresses: &[&str]) -> Self {
        Self {
            table: Arc::new(Mutex::new(vec![InterfaceAddressSet::new(
                INTERFACE,
                parse_all(addresses),
            )])),
        }
    }

    /// No interfaces at all
    pub fn empty() -> Self {
        Self {
            table: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the addresses of [`INTERFACE`]
    pub fn set_addresses(&self, addresses: &[&str]) {
        *self.table.lock().unwrap() = vec![InterfaceAddressSet::new(INTERFACE, parse_all(addresses))];
    }
}

impl InterfaceSource for StaticInterfaces {
    fn interfaces(&self) -> Result<Vec<InterfaceAddressSet>> {
        Ok(self.table.lock().unwrap().clone())
    }
}

fn parse_all(addresses: &[&str]) -> Vec<IpAddr> {
    addresses.iter().map(|a| a.parse().unwrap()).collect()
}

/// One recorded publish call
#[derive(Debug, Clone)]
pub struct PublishCall {
    pub hostname: String,
    pub token: String,
    pub addresses: AddressPair,
    pub at: Instant,
}

/// An update client that replays scripted outcomes
///
/// Once the script is exhausted every call succeeds.
pub struct ScriptedClient {
    script: Arc<Mutex<VecDeque<UpdateOutcome>>>,
    calls: Arc<Mutex<Vec<PublishCall>>>,
    always_fail: bool,
}

impl ScriptedClient {
    pub fn succeeding() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(outcomes: Vec<UpdateOutcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
            always_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::succeeding()
        }
    }

    /// Create a client that shares the script and call log with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            calls: Arc::clone(&other.calls),
            always_fail: other.always_fail,
        }
    }

    pub fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn hostnames(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.hostname).collect()
    }
}

#[async_trait::async_trait]
impl UpdateClient for ScriptedClient {
    async fn publish(&self, addresses: &AddressPair, hostname: &str, token: &str) -> UpdateOutcome {
        self.calls.lock().unwrap().push(PublishCall {
            hostname: hostname.to_string(),
            token: token.to_string(),
            addresses: *addresses,
            at: Instant::now(),
        });

        if self.always_fail {
            return UpdateOutcome::TransientFailure("response: bad token".to_string());
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(UpdateOutcome::Success)
    }

    fn client_name(&self) -> &'static str {
        "scripted"
    }
}

/// A notifier that records every message
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, _settings: &NotificationSettings, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// A store whose reads always fail
#[derive(Clone, Default)]
pub struct FailingStore {
    load_count: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ConfigStore for FailingStore {
    async fn load(&self) -> Result<Option<DdnsConfig>> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::state_store("disk unavailable"))
    }

    async fn save(&self, _config: &DdnsConfig) -> Result<()> {
        Err(Error::state_store("disk unavailable"))
    }
}

/// A valid record for [`INTERFACE`]
pub fn config(mode: IpVersion, domains: &[&str], interval_secs: u64) -> DdnsConfig {
    DdnsConfig {
        global_settings: GlobalSettings {
            update_interval_seconds: interval_secs,
            network_interface: INTERFACE.to_string(),
            ip_type: mode,
        },
        domain_list: DomainList {
            domains: domains.iter().map(|d| d.to_string()).collect(),
            token: TOKEN.to_string(),
        },
        notification_settings: NotificationSettings::default(),
    }
}

/// Handles kept by the test after the doubles move into the engine
pub struct Harness {
    pub store: MemoryConfigStore,
    pub interfaces: StaticInterfaces,
    pub client: ScriptedClient,
    pub notifier: RecordingNotifier,
}

/// Build an engine over shared doubles with default retry settings
pub fn engine_with(
    store: MemoryConfigStore,
    interfaces: StaticInterfaces,
    client: ScriptedClient,
) -> (DdnsEngine, mpsc::Receiver<EngineEvent>, Harness) {
    let notifier = RecordingNotifier::default();
    let (engine, events) = DdnsEngine::new(
        Arc::new(store.clone()),
        Box::new(interfaces.clone()),
        Box::new(ScriptedClient::sharing_counters_with(&client)),
        Box::new(notifier.clone()),
        EngineConfig::default(),
    );

    let harness = Harness {
        store,
        interfaces,
        client,
        notifier,
    };
    (engine, events, harness)
}

/// Wait for the next completed cycle
pub async fn next_cycle(events: &mut mpsc::Receiver<EngineEvent>) -> CycleResult {
    loop {
        match events.recv().await {
            Some(EngineEvent::CycleCompleted(result)) => return result,
            Some(_) => continue,
            None => panic!("event channel closed before a cycle completed"),
        }
    }
}

/// Wait for a specific event
pub async fn wait_for(events: &mut mpsc::Receiver<EngineEvent>, wanted: fn(&EngineEvent) -> bool) -> EngineEvent {
    loop {
        match events.recv().await {
            Some(event) if wanted(&event) => return event,
            Some(_) => continue,
            None => panic!("event channel closed before the expected event"),
        }
    }
}
