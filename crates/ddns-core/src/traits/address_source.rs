// # Interface Source Trait
//
// Defines the interface for enumerating local network interfaces and the
// addresses bound to them.
//
// ## Implementations
//
// - OS interface table: `ddns-ip-interface` crate
// - Test doubles: `tests/common/mod.rs`
//
// Selection rules (which interface, which addresses count as public) live in
// `AddressResolver`, not in the sources. A source only reports what it sees,
// in the order the platform lists it.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Addresses bound to one named interface at a point in time
///
/// Recomputed on every discovery call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddressSet {
    /// Interface name (e.g., "wlan0")
    pub name: String,
    /// Administratively up
    pub is_up: bool,
    /// Loopback interface
    pub is_loopback: bool,
    /// Bound addresses, in enumeration order
    pub addresses: Vec<IpAddr>,
}

impl InterfaceAddressSet {
    /// Create an up, non-loopback interface with the given addresses
    pub fn new(name: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        Self {
            name: name.into(),
            is_up: true,
            is_loopback: false,
            addresses,
        }
    }
}

/// Public addresses picked for one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressPair {
    /// Public IPv4 address, if one was found and requested
    pub ipv4: Option<Ipv4Addr>,
    /// Global IPv6 address, if one was found and requested
    pub ipv6: Option<Ipv6Addr>,
}

impl AddressPair {
    /// Whether neither family is present
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_none() && self.ipv6.is_none()
    }
}

impl fmt::Display for AddressPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v4 = self.ipv4.map(|ip| ip.to_string()).unwrap_or_default();
        let v6 = self.ipv6.map(|ip| ip.to_string()).unwrap_or_default();
        write!(f, "IPv4={}, IPv6={}", v4, v6)
    }
}

/// Trait for interface enumeration
///
/// Discovery is local and cheap, so this trait is synchronous.
pub trait InterfaceSource: Send + Sync {
    /// List every interface known to the system
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<InterfaceAddressSet>)`: Interfaces in platform order
    /// - `Err(Error)`: If the interface table cannot be read
    fn interfaces(&self) -> Result<Vec<InterfaceAddressSet>, crate::Error>;

    /// Look up one interface by name
    ///
    /// Returns `Ok(None)` when no interface has that name.
    fn interface(&self, name: &str) -> Result<Option<InterfaceAddressSet>, crate::Error> {
        Ok(self.interfaces()?.into_iter().find(|i| i.name == name))
    }
}
