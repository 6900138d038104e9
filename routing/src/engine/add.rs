// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Object creation. Each call returns the handle of the new object.
//!
//! # Errors
//!
//! All the calls fail with [`ConfigError::InvalidAttribute`] if an attribute is
//! illegal or a handle refers to an object of the wrong type, with
//! [`ConfigError::NoSuchObject`] if a handle refers to no object, with
//! [`ConfigError::ObjectExists`] or [`ConfigError::ConflictingBinding`] if the
//! object collides with an existing one, and with [`ConfigError::TableFull`].

#![allow(clippy::missing_errors_doc)]

use crate::engine::Engine;
use crate::errors::ConfigError;
use crate::objects::{
    EcmpGroup, EcmpMember, FdbEntry, Handle, L2Port, Lag, LagMember, MapperEntry, MapperKind,
    Neighbor, Nexthop, PortId, Rif, Route, Tagging, Tunnel, TunnelMapper, TunnelTerm, Vlan,
    VlanMember, Vrf,
};
use net::vlan::Vid;

impl Engine {
    pub fn add_vrf(&mut self, vrf: Vrf) -> Result<Handle, ConfigError> {
        self.create(vrf.into())
    }

    pub fn add_rif(&mut self, rif: Rif) -> Result<Handle, ConfigError> {
        self.create(rif.into())
    }

    pub fn add_neighbor(&mut self, neighbor: Neighbor) -> Result<Handle, ConfigError> {
        self.create(neighbor.into())
    }

    pub fn add_nexthop(&mut self, nexthop: Nexthop) -> Result<Handle, ConfigError> {
        self.create(nexthop.into())
    }

    pub fn add_route(&mut self, route: Route) -> Result<Handle, ConfigError> {
        self.create(route.into())
    }

    pub fn add_ecmp(&mut self) -> Result<Handle, ConfigError> {
        self.create(EcmpGroup.into())
    }

    /// Add a nexthop to an ECMP group. The returned member handle identifies the
    /// membership and is what must be removed to take the nexthop out.
    pub fn add_ecmp_member(&mut self, group: Handle, nexthop: Handle) -> Result<Handle, ConfigError> {
        self.create(EcmpMember { group, nexthop }.into())
    }

    pub fn add_tunnel(&mut self, tunnel: Tunnel) -> Result<Handle, ConfigError> {
        self.create(tunnel.into())
    }

    pub fn add_tunnel_term(&mut self, term: TunnelTerm) -> Result<Handle, ConfigError> {
        self.create(term.into())
    }

    pub fn add_tunnel_mapper(&mut self, kind: MapperKind) -> Result<Handle, ConfigError> {
        self.create(TunnelMapper::new(kind).into())
    }

    pub fn add_tunnel_mapper_entry(&mut self, entry: MapperEntry) -> Result<Handle, ConfigError> {
        self.create(entry.into())
    }

    pub fn add_mac_entry(&mut self, entry: FdbEntry) -> Result<Handle, ConfigError> {
        self.create(entry.into())
    }

    pub fn add_lag(&mut self) -> Result<Handle, ConfigError> {
        self.create(Lag.into())
    }

    pub fn add_lag_member(&mut self, lag: Handle, port: PortId) -> Result<Handle, ConfigError> {
        self.create(LagMember { lag, port }.into())
    }

    pub fn add_vlan(&mut self, vid: u16) -> Result<Handle, ConfigError> {
        let vid = Vid::new(vid)?;
        self.create(Vlan { vid }.into())
    }

    pub fn add_vlan_member(
        &mut self,
        vlan: Handle,
        member: impl Into<L2Port>,
        tagging: Tagging,
    ) -> Result<Handle, ConfigError> {
        let member = member.into();
        self.create(
            VlanMember {
                vlan,
                member,
                tagging,
            }
            .into(),
        )
    }
}
