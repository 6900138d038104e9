// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IP version independent header

use crate::ipv4::Ipv4;
use crate::ipv6::Ipv6;
use std::fmt::Display;
use std::net::IpAddr;

/// IP protocol number (IPv4) or next header (IPv6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NextHeader(pub u8);

impl NextHeader {
    pub const ICMP: NextHeader = NextHeader(1);
    /// IPv4 encapsulation (IP-in-IP)
    pub const IPIP: NextHeader = NextHeader(4);
    pub const TCP: NextHeader = NextHeader(6);
    pub const UDP: NextHeader = NextHeader(17);
    /// IPv6 encapsulation
    pub const IPV6: NextHeader = NextHeader(41);
    pub const ICMP6: NextHeader = NextHeader(58);
}

impl Display for NextHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An IPv4 or IPv6 header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpHeader {
    V4(Ipv4),
    V6(Ipv6),
}

impl IpHeader {
    /// Build a header for the given addresses. Both addresses must be of the same family.
    /// Returns `None` otherwise.
    #[must_use]
    pub fn new(source: IpAddr, destination: IpAddr, next_header: NextHeader, ttl: u8) -> Option<Self> {
        match (source, destination) {
            (IpAddr::V4(s), IpAddr::V4(d)) => Some(IpHeader::V4(Ipv4::new(s, d, next_header, ttl))),
            (IpAddr::V6(s), IpAddr::V6(d)) => Some(IpHeader::V6(Ipv6::new(s, d, next_header, ttl))),
            _ => None,
        }
    }
    #[must_use]
    pub fn source(&self) -> IpAddr {
        match self {
            IpHeader::V4(h) => IpAddr::V4(h.source),
            IpHeader::V6(h) => IpAddr::V6(h.source),
        }
    }
    #[must_use]
    pub fn destination(&self) -> IpAddr {
        match self {
            IpHeader::V4(h) => IpAddr::V4(h.destination),
            IpHeader::V6(h) => IpAddr::V6(h.destination),
        }
    }
    /// TTL (IPv4) or hop limit (IPv6)
    #[must_use]
    pub fn ttl(&self) -> u8 {
        match self {
            IpHeader::V4(h) => h.ttl,
            IpHeader::V6(h) => h.hop_limit,
        }
    }
    pub fn set_ttl(&mut self, ttl: u8) {
        match self {
            IpHeader::V4(h) => h.ttl = ttl,
            IpHeader::V6(h) => h.hop_limit = ttl,
        }
    }
    #[must_use]
    pub fn next_header(&self) -> NextHeader {
        match self {
            IpHeader::V4(h) => h.protocol,
            IpHeader::V6(h) => h.next_header,
        }
    }
    /// The version field as found in the header
    #[must_use]
    pub fn version(&self) -> u8 {
        match self {
            IpHeader::V4(h) => h.version,
            IpHeader::V6(h) => h.version,
        }
    }
    /// The version implied by the header type
    #[must_use]
    pub fn expected_version(&self) -> u8 {
        match self {
            IpHeader::V4(_) => 4,
            IpHeader::V6(_) => 6,
        }
    }
    #[must_use]
    pub fn header_len(&self) -> u16 {
        match self {
            IpHeader::V4(h) => h.header_len(),
            IpHeader::V6(_) => Ipv6::HEADER_LEN,
        }
    }
    #[must_use]
    pub fn is_ipv4(&self) -> bool {
        matches!(self, IpHeader::V4(_))
    }
}

impl Display for IpHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IPv{} {} -> {} ttl {} proto {}",
            self.expected_version(),
            self.source(),
            self.destination(),
            self.ttl(),
            self.next_header()
        )
    }
}
