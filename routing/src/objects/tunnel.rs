// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tunnels, terminations and mappers

use crate::errors::ConfigError;
use crate::objects::Handle;
use net::vxlan::Vni;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TunnelKind {
    Vxlan,
    Ipip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlMode {
    /// the outer TTL mirrors the inner one
    Uniform,
    /// the outer TTL is independent of the inner one
    Pipe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunnel {
    pub kind: TunnelKind,
    pub src_ip: IpAddr,
    /// Loopback RIF whose VRF carries the underlay
    pub underlay_rif: Handle,
    /// RIF whose VRF routes decapsulated IP-in-IP packets
    pub overlay_rif: Option<Handle>,
    pub encap_mappers: Vec<Handle>,
    pub decap_mappers: Vec<Handle>,
    pub encap_ttl_mode: TtlMode,
    pub decap_ttl_mode: TtlMode,
    /// outer TTL in pipe mode
    pub encap_ttl: u8,
}

impl Tunnel {
    pub const DEFAULT_TTL: u8 = 64;

    #[must_use]
    pub fn vxlan(src_ip: IpAddr, underlay_rif: Handle) -> Self {
        Self {
            kind: TunnelKind::Vxlan,
            src_ip,
            underlay_rif,
            overlay_rif: None,
            encap_mappers: vec![],
            decap_mappers: vec![],
            encap_ttl_mode: TtlMode::Pipe,
            decap_ttl_mode: TtlMode::Pipe,
            encap_ttl: Self::DEFAULT_TTL,
        }
    }
    #[must_use]
    pub fn ipip(src_ip: IpAddr, underlay_rif: Handle, overlay_rif: Handle) -> Self {
        Self {
            kind: TunnelKind::Ipip,
            overlay_rif: Some(overlay_rif),
            ..Self::vxlan(src_ip, underlay_rif)
        }
    }
    #[must_use]
    pub fn with_mappers(mut self, encap: &[Handle], decap: &[Handle]) -> Self {
        self.encap_mappers = encap.to_vec();
        self.decap_mappers = decap.to_vec();
        self
    }
    #[must_use]
    pub fn with_ttl_modes(mut self, encap: TtlMode, decap: TtlMode) -> Self {
        self.encap_ttl_mode = encap;
        self.decap_ttl_mode = decap;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    /// match on destination and source
    P2p,
    /// match on destination only
    P2mp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelTerm {
    pub tunnel: Handle,
    /// VRF in which outer packets are matched
    pub vrf: Handle,
    pub kind: TermKind,
    pub dst_ip: IpAddr,
    pub src_ip: Option<IpAddr>,
}

impl TunnelTerm {
    #[must_use]
    pub fn p2mp(tunnel: Handle, vrf: Handle, dst_ip: IpAddr) -> Self {
        Self {
            tunnel,
            vrf,
            kind: TermKind::P2mp,
            dst_ip,
            src_ip: None,
        }
    }
    #[must_use]
    pub fn p2p(tunnel: Handle, vrf: Handle, dst_ip: IpAddr, src_ip: IpAddr) -> Self {
        Self {
            tunnel,
            vrf,
            kind: TermKind::P2p,
            dst_ip,
            src_ip: Some(src_ip),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperKind {
    VrfToVni,
    VniToVrf,
    VlanToVni,
    VniToVlan,
}

impl MapperKind {
    /// Mappers used when encapsulating
    #[must_use]
    pub fn is_encap(&self) -> bool {
        matches!(self, MapperKind::VrfToVni | MapperKind::VlanToVni)
    }
    /// Mappers whose network is a VRF (as opposed to a VLAN)
    #[must_use]
    pub fn maps_vrf(&self) -> bool {
        matches!(self, MapperKind::VrfToVni | MapperKind::VniToVrf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelMapper {
    pub kind: MapperKind,
}

impl TunnelMapper {
    #[must_use]
    pub fn new(kind: MapperKind) -> Self {
        Self { kind }
    }
}

/// Binding of a VRF or a VLAN to a VNI in a mapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperEntry {
    pub mapper: Handle,
    pub network: Handle,
    pub vni: Vni,
}

impl MapperEntry {
    #[must_use]
    pub fn new(mapper: Handle, network: Handle, vni: Vni) -> Self {
        Self {
            mapper,
            network,
            vni,
        }
    }
    /// Build an entry from a raw, signed VNI value
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::InvalidAttribute`] if the value is not a legal VNI.
    pub fn from_raw(mapper: Handle, network: Handle, vni: i64) -> Result<Self, ConfigError> {
        Ok(Self::new(mapper, network, Vni::try_from(vni)?))
    }
}
