//! Contract Test: IPv6 Change Suppression
//!
//! Constraints verified:
//! - A hostname is re-published only when its IPv6 value changes
//! - The comparison is IPv6-only: IPv4 changes alone never trigger a publish
//!   under dual mode, and IPv4-only mode publishes every cycle
//! - Failed deliveries leave the remembered value untouched
//!
//! If this test fails, the change tracker is keyed on the wrong value or is
//! updated before delivery is confirmed.

mod common;

use common::*;
use ddns_core::config::IpVersion;
use ddns_core::engine::HostnameOutcome;
use ddns_core::state::MemoryConfigStore;
use ddns_core::traits::{ConfigStore, UpdateOutcome};

#[tokio::test(start_paused = true)]
async fn unchanged_ipv6_is_published_once() {
    let store = MemoryConfigStore::with_config(config(IpVersion::V6, &["a.dns.navy"], 60));
    let interfaces = StaticInterfaces::single(&["2001:db8::1"]);
    let (mut engine, _events, h) = engine_with(store, interfaces, ScriptedClient::succeeding());

    engine.run_cycle().await;
    engine.run_cycle().await;
    engine.run_cycle().await;

    assert_eq!(h.client.call_count(), 1, "same IPv6 must not be re-published");
    assert_eq!(
        engine.tracker().last_ipv6("a.dns.navy"),
        Some("2001:db8::1".parse().unwrap())
    );
}

#[tokio::test(start_paused = true)]
async fn changed_ipv6_is_republished() {
    let store = MemoryConfigStore::with_config(config(IpVersion::V6, &["a.dns.navy"], 60));
    let interfaces = StaticInterfaces::single(&["2001:db8::1"]);
    let (mut engine, _events, h) = engine_with(store, interfaces, ScriptedClient::succeeding());

    engine.run_cycle().await;
    h.interfaces.set_addresses(&["2001:db8::2"]);
    engine.run_cycle().await;

    let calls = h.client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].addresses.ipv6, Some("2001:db8::2".parse().unwrap()));
    assert_eq!(calls[1].token, TOKEN);
}

#[tokio::test(start_paused = true)]
async fn ipv4_only_mode_publishes_every_cycle() {
    let store = MemoryConfigStore::with_config(config(IpVersion::V4, &["a.dns.navy"], 60));
    let interfaces = StaticInterfaces::single(&["203.0.113.5"]);
    let (mut engine, _events, h) = engine_with(store, interfaces, ScriptedClient::succeeding());

    for _ in 0..3 {
        engine.run_cycle().await;
    }

    assert_eq!(h.client.call_count(), 3);
    assert!(h.client.calls().iter().all(|c| c.addresses.ipv6.is_none()));
}

#[tokio::test(start_paused = true)]
async fn dual_mode_ignores_ipv4_only_changes() {
    let store = MemoryConfigStore::with_config(config(IpVersion::Both, &["a.dns.navy"], 60));
    let interfaces = StaticInterfaces::single(&["203.0.113.5", "2001:db8::1"]);
    let (mut engine, _events, h) = engine_with(store, interfaces, ScriptedClient::succeeding());

    engine.run_cycle().await;
    h.interfaces.set_addresses(&["198.51.100.9", "2001:db8::1"]);
    let status = engine.run_cycle().await;

    assert_eq!(h.client.call_count(), 1);
    match status {
        ddns_core::CycleStatus::Completed { result, .. } => {
            assert_eq!(result.outcome("a.dns.navy"), Some(&HostnameOutcome::Suppressed));
            assert_eq!(result.addresses.ipv4, Some("198.51.100.9".parse().unwrap()));
        }
        other => panic!("unexpected status: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn dual_mode_without_ipv6_suppresses_fresh_hostnames() {
    let store = MemoryConfigStore::with_config(config(IpVersion::Both, &["a.dns.navy"], 60));
    let interfaces = StaticInterfaces::single(&["203.0.113.5", "fe80::1"]);
    let (mut engine, _events, h) = engine_with(store, interfaces, ScriptedClient::succeeding());

    engine.run_cycle().await;

    assert_eq!(h.client.call_count(), 0);
    assert!(engine.tracker().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_delivery_is_retried_next_cycle() {
    let store = MemoryConfigStore::with_config(config(IpVersion::V6, &["a.dns.navy"], 60));
    let interfaces = StaticInterfaces::single(&["2001:db8::1"]);
    let failures = vec![UpdateOutcome::TransientFailure("timeout".to_string()); 3];
    let (mut engine, _events, h) =
        engine_with(store, interfaces, ScriptedClient::with_script(failures));

    engine.run_cycle().await;
    assert_eq!(h.client.call_count(), 3);
    assert!(engine.tracker().get("a.dns.navy").is_none());

    engine.run_cycle().await;
    assert_eq!(h.client.call_count(), 4, "unrecorded hostname must be retried");
    assert!(engine.tracker().get("a.dns.navy").is_some());
}

#[tokio::test(start_paused = true)]
async fn hostnames_are_tracked_independently() {
    let store = MemoryConfigStore::with_config(config(IpVersion::V6, &["a.dns.navy"], 60));
    let interfaces = StaticInterfaces::single(&["2001:db8::1"]);
    let (mut engine, _events, h) = engine_with(store, interfaces, ScriptedClient::succeeding());

    engine.run_cycle().await;

    // A hostname added later is published even though the IPv6 is unchanged.
    h.store
        .save(&config(IpVersion::V6, &["a.dns.navy", "b.dns.navy"], 60))
        .await
        .unwrap();
    engine.run_cycle().await;

    assert_eq!(h.client.hostnames(), vec!["a.dns.navy", "b.dns.navy"]);
}
