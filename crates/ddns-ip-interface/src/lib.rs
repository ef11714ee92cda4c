// # Interface IP Source
//
// Reads the operating system's interface table through `pnet::datalink`.
//
// ## Behavior
//
// - Every call re-enumerates; nothing is cached between cycles
// - Addresses are reported in the order the platform lists them
// - Filtering (public vs. private, link-local) is left to `AddressResolver`
//
// ## Platform Support
//
// Linux, the BSDs, macOS and Android through pnet's platform backends.

use ddns_core::Result;
use ddns_core::traits::{InterfaceAddressSet, InterfaceSource};
use pnet::datalink::{self, NetworkInterface};

/// Interface source backed by the OS interface table
#[derive(Debug, Clone, Copy, Default)]
pub struct PnetInterfaceSource;

impl PnetInterfaceSource {
    /// Create a new source
    pub fn new() -> Self {
        Self
    }
}

impl InterfaceSource for PnetInterfaceSource {
    fn interfaces(&self) -> Result<Vec<InterfaceAddressSet>> {
        let found: Vec<InterfaceAddressSet> =
            datalink::interfaces().iter().map(to_address_set).collect();
        tracing::trace!("Enumerated {} interface(s)", found.len());
        Ok(found)
    }
}

/// Names of interfaces that are up and not loopback
///
/// Used by the setup wizard to suggest a value.
pub fn available_interfaces() -> Vec<String> {
    datalink::interfaces()
        .into_iter()
        .filter(|i| i.is_up() && !i.is_loopback())
        .map(|i| i.name)
        .collect()
}

fn to_address_set(iface: &NetworkInterface) -> InterfaceAddressSet {
    InterfaceAddressSet {
        name: iface.name.clone(),
        is_up: iface.is_up(),
        is_loopback: iface.is_loopback(),
        addresses: iface.ips.iter().map(|net| net.ip()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_succeeds() {
        let interfaces = PnetInterfaceSource::new().interfaces().unwrap();
        for iface in &interfaces {
            assert!(!iface.name.is_empty());
        }
    }

    #[test]
    fn available_interfaces_are_listed_by_the_source() {
        let all = PnetInterfaceSource::new().interfaces().unwrap();
        for name in available_interfaces() {
            let iface = all.iter().find(|i| i.name == name).unwrap();
            assert!(iface.is_up && !iface.is_loopback);
        }
    }

    #[test]
    fn unknown_interface_is_none() {
        let source = PnetInterfaceSource::new();
        assert!(source.interface("no-such-iface0").unwrap().is_none());
    }
}
