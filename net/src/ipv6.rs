// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPv6 header

use crate::ip::NextHeader;
use std::net::Ipv6Addr;

/// A parsed IPv6 header. Extension headers are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6 {
    pub version: u8,
    pub traffic_class: u8,
    pub flow_label: u32,
    pub hop_limit: u8,
    pub next_header: NextHeader,
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
}

impl Ipv6 {
    pub const HEADER_LEN: u16 = 40;

    #[must_use]
    pub fn new(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        next_header: NextHeader,
        hop_limit: u8,
    ) -> Self {
        Self {
            version: 6,
            traffic_class: 0,
            flow_label: 0,
            hop_limit,
            next_header,
            source,
            destination,
        }
    }
}
