//! Public address discovery
//!
//! The resolver picks one interface from an [`InterfaceSource`] and extracts a
//! candidate public IPv4 and/or IPv6 address from it.
//!
//! ## Rules
//!
//! - Empty interface name: first interface that is up and not loopback.
//! - IPv4 candidates: not loopback, not RFC 1918 private.
//! - IPv6 candidates: not loopback, not link-local (`fe80::/10`).
//! - Several candidates of one family: the last one enumerated wins. The
//!   platform order is kept as is; nothing here sorts.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::debug;

use crate::config::IpVersion;
use crate::error::{Error, Result};
use crate::traits::{AddressPair, InterfaceAddressSet, InterfaceSource};

/// Resolves the public addresses of one interface
pub struct AddressResolver {
    source: Box<dyn InterfaceSource>,
}

impl AddressResolver {
    /// Create a resolver over an interface source
    pub fn new(source: Box<dyn InterfaceSource>) -> Self {
        Self { source }
    }

    /// Resolve the addresses required by `mode` on `interface`
    ///
    /// # Errors
    ///
    /// - [`Error::NoInterfaceAvailable`]: `interface` is empty and nothing is up
    /// - [`Error::InterfaceNotFound`]: the named interface does not exist or
    ///   the interface table cannot be read
    /// - [`Error::NoQualifyingAddress`]: a required family has no candidate
    ///   (dual mode only fails when both are missing)
    pub fn resolve(&self, interface: &str, mode: IpVersion) -> Result<AddressPair> {
        let selected = self.select_interface(interface)?;
        let addresses = select_addresses(&selected, mode);

        debug!(
            "Interface {} ({} address(es)): {}",
            selected.name,
            selected.addresses.len(),
            addresses
        );

        let missing = match mode {
            IpVersion::V4 => addresses.ipv4.is_none(),
            IpVersion::V6 => addresses.ipv6.is_none(),
            IpVersion::Both => addresses.is_empty(),
        };

        if missing {
            return Err(Error::NoQualifyingAddress {
                interface: selected.name,
                mode,
            });
        }

        Ok(addresses)
    }

    fn select_interface(&self, interface: &str) -> Result<InterfaceAddressSet> {
        if interface.is_empty() {
            return self
                .source
                .interfaces()?
                .into_iter()
                .find(|i| i.is_up && !i.is_loopback)
                .ok_or(Error::NoInterfaceAvailable);
        }

        match self.source.interface(interface) {
            Ok(Some(found)) => Ok(found),
            Ok(None) => Err(Error::interface_not_found(interface)),
            Err(e) => {
                debug!("Failed to query interface {}: {}", interface, e);
                Err(Error::interface_not_found(interface))
            }
        }
    }
}

/// Pick the public addresses of `iface` that `mode` asks for
pub fn select_addresses(iface: &InterfaceAddressSet, mode: IpVersion) -> AddressPair {
    let mut picked = AddressPair::default();

    for addr in &iface.addresses {
        match family_of(*addr) {
            Family::V4(ip) => {
                if mode.wants_v4() && is_public_v4(ip) {
                    picked.ipv4 = Some(ip);
                }
            }
            Family::V6(ip) => {
                if mode.wants_v6() && is_global_v6(ip) {
                    picked.ipv6 = Some(ip);
                }
            }
        }
    }

    picked
}

enum Family {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

// IPv4-mapped IPv6 addresses count as IPv4.
fn family_of(addr: IpAddr) -> Family {
    match addr {
        IpAddr::V4(ip) => Family::V4(ip),
        IpAddr::V6(ip) => match ip.to_ipv4_mapped() {
            Some(v4) => Family::V4(v4),
            None => Family::V6(ip),
        },
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    !ip.is_loopback() && !ip.is_private()
}

fn is_global_v6(ip: Ipv6Addr) -> bool {
    let link_local = (ip.segments()[0] & 0xffc0) == 0xfe80;
    !ip.is_loopback() && !link_local
}
