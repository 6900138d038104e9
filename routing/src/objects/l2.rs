// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ports, LAGs, VLANs and FDB entries

use crate::objects::Handle;
use net::eth::mac::Mac;
use net::vlan::Vid;
use std::fmt::Display;
use std::net::IpAddr;

/// A front-panel port number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub u16);

impl Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port{}", self.0)
    }
}

/// Something frames can be sent to or received from: a port or a LAG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum L2Port {
    Port(PortId),
    Lag(Handle),
}

impl From<PortId> for L2Port {
    fn from(port: PortId) -> Self {
        L2Port::Port(port)
    }
}

impl Display for L2Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            L2Port::Port(p) => write!(f, "{p}"),
            L2Port::Lag(h) => write!(f, "{h}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LagMember {
    pub lag: Handle,
    pub port: PortId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vlan {
    pub vid: Vid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tagging {
    Tagged,
    Untagged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanMember {
    pub vlan: Handle,
    pub member: L2Port,
    pub tagging: Tagging,
}

/// Where an FDB entry sends frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FdbDest {
    Port(L2Port),
    /// A remote VTEP reached through a VXLAN tunnel
    Tunnel { tunnel: Handle, remote: IpAddr },
    /// A tunnel nexthop with L2 rewrite, which may override the VNI
    Nexthop(Handle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdbEntry {
    pub vlan: Handle,
    pub mac: Mac,
    pub dest: FdbDest,
}

impl FdbEntry {
    #[must_use]
    pub fn new(vlan: Handle, mac: Mac, dest: FdbDest) -> Self {
        Self { vlan, mac, dest }
    }
}
