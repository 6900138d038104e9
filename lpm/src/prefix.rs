// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Type to represent IP-version neutral network prefixes.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
pub use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrefixError {
    #[error("Invalid Prefix: {0}")]
    Invalid(String),
    #[error("Mask length {0} is invalid")]
    InvalidLength(u8),
}

/// An IPv4 or IPv6 prefix. Host bits are always cleared: building a prefix
/// from an address with host bits set truncates it to its network.
#[derive(Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Prefix {
    V4(Ipv4Net),
    V6(Ipv6Net),
}

impl Prefix {
    pub const MAX_LEN_IPV4: u8 = 32;
    pub const MAX_LEN_IPV6: u8 = 128;

    /// Build a prefix from an address and a mask length.
    ///
    /// # Errors
    ///
    /// Fails if the length exceeds the maximum for the address family.
    pub fn new(addr: IpAddr, len: u8) -> Result<Self, PrefixError> {
        match addr {
            IpAddr::V4(a) => Ipv4Net::new(a, len)
                .map(|net| Prefix::V4(net.trunc()))
                .map_err(|_| PrefixError::InvalidLength(len)),
            IpAddr::V6(a) => Ipv6Net::new(a, len)
                .map(|net| Prefix::V6(net.trunc()))
                .map_err(|_| PrefixError::InvalidLength(len)),
        }
    }
    /// The host prefix (/32 or /128) of an address
    #[must_use]
    pub fn host(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(a) => Prefix::V4(Ipv4Net::from(a)),
            IpAddr::V6(a) => Prefix::V6(Ipv6Net::from(a)),
        }
    }
    /// Build 0.0.0.0/0. "Default" is a very overloaded term. Calling this `root_v4`.
    #[must_use]
    pub fn root_v4() -> Prefix {
        Prefix::V4(Ipv4Net::default())
    }
    /// Build `::/0`.
    #[must_use]
    pub fn root_v6() -> Prefix {
        Prefix::V6(Ipv6Net::default())
    }
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.length() == 0
    }
    #[must_use]
    pub fn is_ipv4(&self) -> bool {
        matches!(self, Prefix::V4(_))
    }
    #[must_use]
    pub fn is_ipv6(&self) -> bool {
        matches!(self, Prefix::V6(_))
    }
    /// The network address of the prefix
    #[must_use]
    pub fn as_address(&self) -> IpAddr {
        match self {
            Prefix::V4(p) => IpAddr::V4(p.network()),
            Prefix::V6(p) => IpAddr::V6(p.network()),
        }
    }
    #[must_use]
    pub fn length(&self) -> u8 {
        match self {
            Prefix::V4(p) => p.prefix_len(),
            Prefix::V6(p) => p.prefix_len(),
        }
    }
    /// Check whether the prefix covers a given address
    #[must_use]
    pub fn covers_addr(&self, addr: &IpAddr) -> bool {
        match (self, addr) {
            (Prefix::V4(p), IpAddr::V4(a)) => p.contains(a),
            (Prefix::V6(p), IpAddr::V6(a)) => p.contains(a),
            _ => false,
        }
    }
    /// Check whether the prefix covers another prefix
    #[must_use]
    pub fn covers(&self, other: &Prefix) -> bool {
        match (self, other) {
            (Prefix::V4(p1), Prefix::V4(p2)) => p1.contains(p2),
            (Prefix::V6(p1), Prefix::V6(p2)) => p1.contains(p2),
            _ => false,
        }
    }
}

impl From<IpNet> for Prefix {
    fn from(net: IpNet) -> Self {
        match net {
            IpNet::V4(n) => Prefix::V4(n.trunc()),
            IpNet::V6(n) => Prefix::V6(n.trunc()),
        }
    }
}
impl From<Prefix> for IpNet {
    fn from(prefix: Prefix) -> Self {
        match prefix {
            Prefix::V4(n) => IpNet::V4(n),
            Prefix::V6(n) => IpNet::V6(n),
        }
    }
}
impl From<IpAddr> for Prefix {
    fn from(addr: IpAddr) -> Self {
        Prefix::host(addr)
    }
}

impl FromStr for Prefix {
    type Err = PrefixError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(net) = IpNet::from_str(s) {
            return Ok(Prefix::from(net));
        }
        // a bare address is a host prefix
        IpAddr::from_str(s)
            .map(Prefix::host)
            .map_err(|_| PrefixError::Invalid(s.to_owned()))
    }
}
impl TryFrom<&str> for Prefix {
    type Error = PrefixError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Prefix::from_str(value)
    }
}
impl TryFrom<String> for Prefix {
    type Error = PrefixError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Prefix::from_str(&value)
    }
}
impl TryFrom<(&str, u8)> for Prefix {
    type Error = PrefixError;
    fn try_from((addr, len): (&str, u8)) -> Result<Self, Self::Error> {
        let addr = IpAddr::from_str(addr).map_err(|_| PrefixError::Invalid(addr.to_owned()))?;
        Prefix::new(addr, len)
    }
}
impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.to_string()
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prefix::V4(p) => write!(f, "{p}"),
            Prefix::V6(p) => write!(f, "{p}"),
        }
    }
}
impl Debug for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prefix_is_truncated() {
        let p = Prefix::try_from("10.1.2.3/16").unwrap();
        assert_eq!(p.to_string(), "10.1.0.0/16");
        assert_eq!(p, Prefix::try_from(("10.1.255.255", 16)).unwrap());
        let p = Prefix::try_from("2001:db8::1/32").unwrap();
        assert_eq!(p.to_string(), "2001:db8::/32");
    }

    #[test]
    fn bare_address_is_host_prefix() {
        let p = Prefix::try_from("192.168.1.1").unwrap();
        assert_eq!(p.length(), Prefix::MAX_LEN_IPV4);
        let p = Prefix::try_from("::1").unwrap();
        assert_eq!(p.length(), Prefix::MAX_LEN_IPV6);
    }

    #[test]
    fn bad_prefixes() {
        assert!(matches!(
            Prefix::try_from("10.0.0.0/33"),
            Err(PrefixError::Invalid(_))
        ));
        assert_eq!(
            Prefix::try_from(("10.0.0.0", 40)),
            Err(PrefixError::InvalidLength(40))
        );
        assert!(Prefix::try_from("not-a-prefix").is_err());
    }

    #[test]
    fn covering() {
        let p16 = Prefix::try_from("10.1.0.0/16").unwrap();
        let p24 = Prefix::try_from("10.1.2.0/24").unwrap();
        assert!(p16.covers(&p24));
        assert!(!p24.covers(&p16));
        assert!(p16.covers_addr(&"10.1.9.9".parse().unwrap()));
        assert!(!p16.covers_addr(&"10.2.0.1".parse().unwrap()));
        assert!(!p16.covers_addr(&"::1".parse().unwrap()));
        assert!(Prefix::root_v4().covers(&p16));
        assert!(!Prefix::root_v6().covers(&p16));
        assert!(Prefix::root_v6().is_root());
    }

    #[test]
    fn prefix_serde() {
        let yaml = "- 10.0.0.0/8\n- 2001:db8::/64\n";
        let prefixes: Vec<Prefix> = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(prefixes[0], Prefix::try_from("10.0.0.0/8").unwrap());
        assert!(prefixes[1].is_ipv6());
        let back = serde_yaml_ng::to_string(&prefixes).unwrap();
        assert_eq!(back, yaml);
    }
}
