// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VRFs, router interfaces and neighbors

use crate::objects::Handle;
use crate::objects::l2::L2Port;
use net::eth::mac::Mac;
use net::mtu::Mtu;
use net::vlan::Vid;
use std::net::IpAddr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vrf {
    /// Router MAC override for the interfaces of the VRF
    pub src_mac: Option<Mac>,
}

impl Vrf {
    #[must_use]
    pub fn with_src_mac(mac: Mac) -> Self {
        Self { src_mac: Some(mac) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RifKind {
    Port(L2Port),
    /// Switched virtual interface of a VLAN
    Vlan(Handle),
    /// 802.1Q tagged sub-interface
    SubPort(L2Port, Vid),
    Loopback,
}

/// A router interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rif {
    pub kind: RifKind,
    pub vrf: Handle,
    pub src_mac: Option<Mac>,
    pub mtu: Mtu,
    pub v4_enabled: bool,
    pub v6_enabled: bool,
}

impl Rif {
    #[must_use]
    pub fn new(kind: RifKind, vrf: Handle) -> Self {
        Self {
            kind,
            vrf,
            src_mac: None,
            mtu: Mtu::DEFAULT,
            v4_enabled: true,
            v6_enabled: true,
        }
    }
    #[must_use]
    pub fn port(vrf: Handle, port: impl Into<L2Port>) -> Self {
        Self::new(RifKind::Port(port.into()), vrf)
    }
    #[must_use]
    pub fn loopback(vrf: Handle) -> Self {
        Self::new(RifKind::Loopback, vrf)
    }
    #[must_use]
    pub fn vlan(vrf: Handle, vlan: Handle) -> Self {
        Self::new(RifKind::Vlan(vlan), vrf)
    }
    #[must_use]
    pub fn sub_port(vrf: Handle, port: impl Into<L2Port>, vid: Vid) -> Self {
        Self::new(RifKind::SubPort(port.into(), vid), vrf)
    }
    #[must_use]
    pub fn with_mtu(mut self, mtu: Mtu) -> Self {
        self.mtu = mtu;
        self
    }
    #[must_use]
    pub fn with_src_mac(mut self, mac: Mac) -> Self {
        self.src_mac = Some(mac);
        self
    }
    #[must_use]
    pub fn is_loopback(&self) -> bool {
        self.kind == RifKind::Loopback
    }
    #[must_use]
    pub fn enabled_for(&self, addr: &IpAddr) -> bool {
        match addr {
            IpAddr::V4(_) => self.v4_enabled,
            IpAddr::V6(_) => self.v6_enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub rif: Handle,
    pub ip: IpAddr,
    pub mac: Mac,
}

impl Neighbor {
    #[must_use]
    pub fn new(rif: Handle, ip: IpAddr, mac: Mac) -> Self {
        Self { rif, ip, mac }
    }
}
