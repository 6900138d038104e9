// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Nexthops and ECMP groups

use crate::objects::Handle;
use net::eth::mac::Mac;
use net::vxlan::Vni;
use std::net::IpAddr;

/// What a tunnel nexthop does to the frame it encapsulates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// bridged: the inner frame is sent unchanged
    L2,
    /// routed: the inner Ethernet header is rewritten
    L3,
    /// routed, with a VNI that must be set on the nexthop
    L3Vni,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nexthop {
    /// A neighbor reached through a router interface
    Ip { rif: Handle, ip: IpAddr },
    /// A remote tunnel endpoint
    Tunnel {
        tunnel: Handle,
        ip: IpAddr,
        rewrite: Rewrite,
        /// inner destination MAC
        mac: Option<Mac>,
        /// VNI override, which takes precedence over the tunnel mappers
        vni: Option<Vni>,
    },
    /// Traffic resolving to this nexthop is dropped
    Drop,
}

impl Nexthop {
    #[must_use]
    pub fn ip(rif: Handle, ip: IpAddr) -> Self {
        Nexthop::Ip { rif, ip }
    }
    /// A routed tunnel nexthop
    #[must_use]
    pub fn tunnel(tunnel: Handle, ip: IpAddr) -> Self {
        Nexthop::Tunnel {
            tunnel,
            ip,
            rewrite: Rewrite::L3,
            mac: None,
            vni: None,
        }
    }
    #[must_use]
    pub fn tunnel_with(
        tunnel: Handle,
        ip: IpAddr,
        rewrite: Rewrite,
        mac: Option<Mac>,
        vni: Option<Vni>,
    ) -> Self {
        Nexthop::Tunnel {
            tunnel,
            ip,
            rewrite,
            mac,
            vni,
        }
    }
    #[must_use]
    pub fn is_l2(&self) -> bool {
        matches!(
            self,
            Nexthop::Tunnel {
                rewrite: Rewrite::L2,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EcmpGroup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcmpMember {
    pub group: Handle,
    pub nexthop: Handle,
}
