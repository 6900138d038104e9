// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VXLAN header

mod vni;
pub use vni::{InvalidVni, Vni};

/// The IANA assigned UDP destination port for VXLAN
pub const VXLAN_UDP_PORT: u16 = 4789;

/// First UDP source port used for VXLAN encapsulation. The source port carries
/// entropy from the inner flow, in the ephemeral range.
pub const VXLAN_SRC_PORT_BASE: u16 = 49152;

/// A [VXLAN][RFC7348] header.
///
/// [RFC7348]: https://datatracker.ietf.org/doc/html/rfc7348#section-5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vxlan {
    pub vni: Vni,
}

impl Vxlan {
    /// The length (in bytes) of a VXLAN header
    pub const HEADER_LEN: u16 = 8;

    #[must_use]
    pub fn new(vni: Vni) -> Self {
        Self { vni }
    }

    /// Select a UDP source port in the ephemeral range from a flow hash
    #[must_use]
    pub fn source_port(flow_hash: u64) -> u16 {
        let span = u64::from(u16::MAX - VXLAN_SRC_PORT_BASE) + 1;
        #[allow(clippy::cast_possible_truncation)] // bounded by span
        let offset = (flow_hash % span) as u16;
        VXLAN_SRC_PORT_BASE + offset
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn source_port_is_ephemeral() {
        bolero::check!().with_type::<u64>().for_each(|hash| {
            assert!(Vxlan::source_port(*hash) >= VXLAN_SRC_PORT_BASE);
        });
        assert_eq!(Vxlan::source_port(0), VXLAN_SRC_PORT_BASE);
        assert_eq!(Vxlan::source_port(16383), u16::MAX);
        assert_eq!(Vxlan::source_port(16384), VXLAN_SRC_PORT_BASE);
    }
}
