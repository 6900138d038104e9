// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Flow hashing. Hashes are computed with fixed seeds so that a flow maps to
//! the same value across engine instances of the same build. `ahash` does not
//! guarantee the values across versions, targets or CPU features.

use crate::eth::EthType;
use crate::eth::mac::Mac;
use crate::frame::IpPacket;
use crate::ip::NextHeader;
use ahash::RandomState;
use std::hash::{BuildHasher, Hash};
use std::net::IpAddr;

const FLOW_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

fn flow_state() -> RandomState {
    RandomState::with_seeds(FLOW_SEEDS[0], FLOW_SEEDS[1], FLOW_SEEDS[2], FLOW_SEEDS[3])
}

/// The invariant fields of an IP flow: addresses, protocol and transport ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowKey {
    pub source: IpAddr,
    pub destination: IpAddr,
    pub protocol: NextHeader,
    pub source_port: u16,
    pub destination_port: u16,
}

impl From<&IpPacket> for FlowKey {
    fn from(packet: &IpPacket) -> Self {
        let (source_port, destination_port) = packet.ports().unwrap_or_default();
        Self {
            source: packet.header.source(),
            destination: packet.header.destination(),
            protocol: packet.header.next_header(),
            source_port,
            destination_port,
        }
    }
}

impl FlowKey {
    #[must_use]
    pub fn hash64(&self) -> u64 {
        flow_state().hash_one(self)
    }
}

pub(crate) fn hash_l2(source: Mac, destination: Mac, ether_type: EthType) -> u64 {
    flow_state().hash_one((source, destination, ether_type))
}

/// Highest-random-weight (rendezvous) score of a member for a flow. The member
/// with the highest score wins. Adding or removing a member only moves the flows
/// that member wins.
#[must_use]
pub fn hrw_weight(flow_hash: u64, member: u64) -> u64 {
    flow_state().hash_one((flow_hash, member))
}
