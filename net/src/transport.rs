// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! UDP and TCP headers

/// A UDP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Udp {
    pub source: u16,
    pub destination: u16,
}

impl Udp {
    pub const HEADER_LEN: u16 = 8;

    #[must_use]
    pub fn new(source: u16, destination: u16) -> Self {
        Self {
            source,
            destination,
        }
    }
}

/// A TCP header, without options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tcp {
    pub source: u16,
    pub destination: u16,
}

impl Tcp {
    pub const HEADER_LEN: u16 = 20;

    #[must_use]
    pub fn new(source: u16, destination: u16) -> Self {
        Self {
            source,
            destination,
        }
    }
}
