// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv4 header

use crate::ip::NextHeader;
use std::net::Ipv4Addr;

/// A parsed IPv4 header. Fields keep whatever values were found on the wire,
/// so a header may be invalid (e.g. a bad version or IHL); see [`Ipv4::is_valid_ihl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4 {
    pub version: u8,
    /// Header length in 32-bit words
    pub ihl: u8,
    pub tos: u8,
    pub identification: u16,
    pub ttl: u8,
    pub protocol: NextHeader,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl Ipv4 {
    /// Length of a header without options
    pub const MIN_LEN: u16 = 20;
    pub const MIN_IHL: u8 = 5;

    #[must_use]
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, protocol: NextHeader, ttl: u8) -> Self {
        Self {
            version: 4,
            ihl: Self::MIN_IHL,
            tos: 0,
            identification: 1,
            ttl,
            protocol,
            source,
            destination,
        }
    }

    /// The header length in bytes, per the IHL field
    #[must_use]
    pub fn header_len(&self) -> u16 {
        u16::from(self.ihl) * 4
    }

    #[must_use]
    pub fn is_valid_ihl(&self) -> bool {
        self.ihl >= Self::MIN_IHL
    }
}
