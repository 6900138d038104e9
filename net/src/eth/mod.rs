// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ethernet types

pub mod mac;

use crate::vlan::Vid;
use mac::Mac;
use std::fmt::Display;

/// An Ethernet type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthType(pub u16);

impl EthType {
    pub const IPV4: EthType = EthType(0x0800);
    pub const ARP: EthType = EthType(0x0806);
    pub const VLAN: EthType = EthType(0x8100);
    pub const IPV6: EthType = EthType(0x86DD);
}

impl Display for EthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// An Ethernet header, with an optional 802.1Q tag.
/// The ethertype is implied by the payload of the [`Frame`](crate::frame::Frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eth {
    pub destination: Mac,
    pub source: Mac,
    pub vlan: Option<Vid>,
}

impl Eth {
    /// The length (in bytes) of an untagged Ethernet header
    pub const HEADER_LEN: u16 = 14;
    /// The length of an 802.1Q tag
    pub const TAG_LEN: u16 = 4;

    #[must_use]
    pub fn new(source: Mac, destination: Mac) -> Self {
        Self {
            destination,
            source,
            vlan: None,
        }
    }
    #[must_use]
    pub fn with_vlan(mut self, vlan: Option<Vid>) -> Self {
        self.vlan = vlan;
        self
    }
    #[must_use]
    pub fn header_len(&self) -> u16 {
        if self.vlan.is_some() {
            Self::HEADER_LEN + Self::TAG_LEN
        } else {
            Self::HEADER_LEN
        }
    }
}

impl Display for Eth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Eth {} -> {}", self.source, self.destination)?;
        if let Some(vid) = self.vlan {
            write!(f, " vlan {vid}")?;
        }
        Ok(())
    }
}
