// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Route and nexthop resolution.
//!
//! Resolution walks the current objects every time it is asked: nothing is
//! cached, so the result never depends on the order in which objects were
//! created and follows attribute changes immediately.

use crate::db::ObjectDb;
use crate::objects::{
    FdbDest, Handle, L2Port, MapperKind, Nexthop, ObjectType, PortId, Rewrite, Rif, RifKind,
    RouteAction, Tagging, TtlMode, Tunnel, TunnelKind,
};
use net::drop::DropReason;
use net::eth::mac::Mac;
use net::frame::hrw_weight;
use net::mtu::Mtu;
use net::vlan::Vid;
use net::vxlan::Vni;
use std::net::IpAddr;
#[allow(unused)]
use tracing::{debug, trace};

use tracectl::trace_target;
trace_target!("resolver", tracectl::LevelFilter::INFO, &["routing"]);

/// Bound on nested resolutions (a tunnel nexthop resolves its underlay)
const MAX_DEPTH: usize = 4;

/// A port to send a frame on, with the tag to push, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EgressPort {
    pub port: PortId,
    pub vlan: Option<Vid>,
}

/// An adjacency: the frame leaves through `rif` with the given MACs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2Egress {
    pub rif: Handle,
    pub smac: Mac,
    pub dmac: Mac,
    pub mtu: Mtu,
    /// more than one port when flooding
    pub ports: Vec<EgressPort>,
}

/// Ethernet addresses of a routed inner frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerMacs {
    pub source: Mac,
    pub destination: Mac,
}

/// An encapsulation and the adjacency of the underlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelEgress {
    pub tunnel: Handle,
    pub kind: TunnelKind,
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    /// always set for VXLAN
    pub vni: Option<Vni>,
    /// `None` when the inner frame is bridged and must be left as is
    pub inner_macs: Option<InnerMacs>,
    pub ttl_mode: TtlMode,
    pub ttl: u8,
    pub underlay: L2Egress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Direct(L2Egress),
    Tunnel(TunnelEgress),
}

impl Resolution {
    /// The adjacency the frame finally leaves through
    #[must_use]
    pub fn egress(&self) -> &L2Egress {
        match self {
            Resolution::Direct(l2) => l2,
            Resolution::Tunnel(t) => &t.underlay,
        }
    }
}

/// Resolves destinations against a view of the object database
pub struct Resolver<'a> {
    db: &'a ObjectDb,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(db: &'a ObjectDb) -> Self {
        Self { db }
    }

    /// Resolve how to reach `dst` in a VRF, for a flow with the given hash
    ///
    /// # Errors
    ///
    /// Returns the reason why frames to this destination must be dropped.
    pub fn resolve(&self, vrf: Handle, dst: IpAddr, flow: u64) -> Result<Resolution, DropReason> {
        self.resolve_at(vrf, dst, flow, 0)
    }

    fn resolve_at(
        &self,
        vrf: Handle,
        dst: IpAddr,
        flow: u64,
        depth: usize,
    ) -> Result<Resolution, DropReason> {
        if depth > MAX_DEPTH {
            debug!("Resolution of {dst} in {vrf} is too deep");
            return Err(DropReason::RouteFailure);
        }
        if self.db.vrf(vrf).is_none() {
            return Err(DropReason::VrfUnknown);
        }
        let (prefix, route) = self.db.lookup_route(vrf, dst).ok_or(DropReason::NoRoute)?;
        trace!("{dst} in {vrf} matches {prefix}");
        if route.action == RouteAction::Drop {
            return Err(DropReason::RouteDrop);
        }
        let target = route.target.ok_or(DropReason::RouteFailure)?;
        match target.object_type() {
            Some(ObjectType::Rif) => self.adjacency(target, dst, flow).map(Resolution::Direct),
            Some(ObjectType::Nexthop) => self.nexthop(vrf, target, flow, depth),
            Some(ObjectType::EcmpGroup) => {
                let nexthop = self.ecmp_select(target, flow)?;
                self.nexthop(vrf, nexthop, flow, depth)
            }
            _ => Err(DropReason::InternalFailure),
        }
    }

    /// Pick the nexthop of an ECMP group for a flow
    ///
    /// # Errors
    ///
    /// Fails with [`DropReason::RouteFailure`] if the group has no members.
    pub fn ecmp_select(&self, group: Handle, flow: u64) -> Result<Handle, DropReason> {
        self.db
            .ecmp_members(group)
            .into_iter()
            .map(|(_, nexthop)| nexthop)
            .max_by_key(|nexthop| hrw_weight(flow, nexthop.as_u64()))
            .ok_or(DropReason::RouteFailure)
    }

    fn nexthop(
        &self,
        vrf: Handle,
        handle: Handle,
        flow: u64,
        depth: usize,
    ) -> Result<Resolution, DropReason> {
        match self.db.nexthop(handle).ok_or(DropReason::InternalFailure)? {
            Nexthop::Ip { rif, ip } => self.adjacency(*rif, *ip, flow).map(Resolution::Direct),
            Nexthop::Tunnel {
                tunnel, ip, mac, vni, ..
            } => {
                let device = self.db.device();
                let inner = InnerMacs {
                    source: self.db.vrf_mac(vrf),
                    destination: mac
                        .or(device.vxlan_default_router_mac)
                        .unwrap_or(device.src_mac),
                };
                self.encap(*tunnel, *ip, vrf, *vni, Some(inner), flow, depth)
                    .map(Resolution::Tunnel)
            }
            Nexthop::Drop => Err(DropReason::RouteDrop),
        }
    }

    /// The VNI to use for traffic of `network` (a VRF or a VLAN) sent through a
    /// tunnel: the override if any, else the first binding found in the encap mappers
    fn tunnel_vni(
        &self,
        tunnel: &Tunnel,
        network: Handle,
        vni: Option<Vni>,
    ) -> Result<Option<Vni>, DropReason> {
        if tunnel.kind == TunnelKind::Ipip {
            return Ok(None);
        }
        if vni.is_some() {
            return Ok(vni);
        }
        let wanted = if network.is(ObjectType::Vrf) {
            MapperKind::VrfToVni
        } else {
            MapperKind::VlanToVni
        };
        tunnel
            .encap_mappers
            .iter()
            .filter(|m| self.db.mapper(**m).is_some_and(|mapper| mapper.kind == wanted))
            .find_map(|m| self.db.mapper_vni(*m, network))
            .map(Some)
            .ok_or(DropReason::VniUnresolved)
    }

    #[allow(clippy::too_many_arguments)]
    fn encap(
        &self,
        handle: Handle,
        remote: IpAddr,
        network: Handle,
        vni: Option<Vni>,
        inner_macs: Option<InnerMacs>,
        flow: u64,
        depth: usize,
    ) -> Result<TunnelEgress, DropReason> {
        let tunnel = self.db.tunnel(handle).ok_or(DropReason::InternalFailure)?;
        let vni = self.tunnel_vni(tunnel, network, vni)?;
        let underlay_vrf = self
            .db
            .rif(tunnel.underlay_rif)
            .ok_or(DropReason::InternalFailure)?
            .vrf;
        let underlay = match self.resolve_at(underlay_vrf, remote, flow, depth + 1)? {
            Resolution::Direct(l2) => l2,
            Resolution::Tunnel(_) => {
                debug!("Underlay of {handle} to {remote} is itself a tunnel");
                return Err(DropReason::RouteFailure);
            }
        };
        Ok(TunnelEgress {
            tunnel: handle,
            kind: tunnel.kind,
            src_ip: tunnel.src_ip,
            dst_ip: remote,
            vni,
            inner_macs,
            ttl_mode: tunnel.encap_ttl_mode,
            ttl: tunnel.encap_ttl,
            underlay,
        })
    }

    /// Resolve the encapsulation of a bridged frame whose FDB entry points to a
    /// remote VTEP
    ///
    /// # Errors
    ///
    /// Returns the reason why the frame must be dropped.
    pub fn bridge_encap(
        &self,
        vlan: Handle,
        dest: &FdbDest,
        flow: u64,
    ) -> Result<TunnelEgress, DropReason> {
        match dest {
            FdbDest::Tunnel { tunnel, remote } => {
                self.encap(*tunnel, *remote, vlan, None, None, flow, 0)
            }
            FdbDest::Nexthop(nh) => match self.db.nexthop(*nh) {
                Some(Nexthop::Tunnel {
                    tunnel,
                    ip,
                    rewrite: Rewrite::L2,
                    vni,
                    ..
                }) => self.encap(*tunnel, *ip, vlan, *vni, None, flow, 0),
                _ => Err(DropReason::InternalFailure),
            },
            FdbDest::Port(_) => Err(DropReason::InternalFailure),
        }
    }

    fn adjacency(&self, handle: Handle, ip: IpAddr, flow: u64) -> Result<L2Egress, DropReason> {
        let rif = self.db.rif(handle).ok_or(DropReason::InternalFailure)?;
        if rif.is_loopback() {
            return Err(DropReason::ToCpu);
        }
        let neighbor = self
            .db
            .neighbor(handle, ip)
            .ok_or(DropReason::MissL2Resolution)?;
        let ports = self.rif_ports(rif, neighbor.mac, flow)?;
        Ok(L2Egress {
            rif: handle,
            smac: self.db.rif_mac(rif),
            dmac: neighbor.mac,
            mtu: rif.mtu,
            ports,
        })
    }

    fn rif_ports(&self, rif: &Rif, dmac: Mac, flow: u64) -> Result<Vec<EgressPort>, DropReason> {
        match rif.kind {
            RifKind::Port(l2port) => Ok(vec![EgressPort {
                port: self.pick_port(l2port, flow)?,
                vlan: None,
            }]),
            RifKind::SubPort(l2port, vid) => Ok(vec![EgressPort {
                port: self.pick_port(l2port, flow)?,
                vlan: Some(vid),
            }]),
            RifKind::Vlan(vlan) => self.routed_vlan_ports(vlan, dmac, flow),
            RifKind::Loopback => Err(DropReason::ToCpu),
        }
    }

    fn routed_vlan_ports(
        &self,
        vlan: Handle,
        dmac: Mac,
        flow: u64,
    ) -> Result<Vec<EgressPort>, DropReason> {
        match self.db.fdb_lookup(vlan, dmac) {
            Some((_, entry)) => match &entry.dest {
                FdbDest::Port(l2port) => Ok(vec![self.member_port(vlan, *l2port, flow)?]),
                FdbDest::Tunnel { .. } | FdbDest::Nexthop(_) => Err(DropReason::Unhandled),
            },
            None if self.db.device().flood_on_routed_fdb_miss => self.flood(vlan, None, flow),
            None => Err(DropReason::FdbMiss),
        }
    }

    /// The port to send on for a port or a LAG. LAG members are picked by
    /// rendezvous hashing of the flow.
    ///
    /// # Errors
    ///
    /// Fails with [`DropReason::NoEgressPort`] for a LAG without members.
    pub fn pick_port(&self, l2port: L2Port, flow: u64) -> Result<PortId, DropReason> {
        match l2port {
            L2Port::Port(port) => Ok(port),
            L2Port::Lag(lag) => self
                .db
                .lag_ports(lag)
                .into_iter()
                .max_by_key(|port| hrw_weight(flow, u64::from(port.0)))
                .ok_or(DropReason::NoEgressPort),
        }
    }

    /// The egress of a VLAN member, tagged per its membership
    ///
    /// # Errors
    ///
    /// Fails if the port is not a member of the VLAN or can't send.
    pub fn member_port(
        &self,
        vlan: Handle,
        l2port: L2Port,
        flow: u64,
    ) -> Result<EgressPort, DropReason> {
        let (_, member) = self
            .db
            .vlan_membership(vlan, l2port)
            .ok_or(DropReason::NoEgressPort)?;
        let vid = self.db.vlan(vlan).ok_or(DropReason::InternalFailure)?.vid;
        Ok(EgressPort {
            port: self.pick_port(l2port, flow)?,
            vlan: (member.tagging == Tagging::Tagged).then_some(vid),
        })
    }

    /// The egress ports of all the members of a VLAN but one
    ///
    /// # Errors
    ///
    /// Fails with [`DropReason::NoEgressPort`] if no member can send.
    pub fn flood(
        &self,
        vlan: Handle,
        except: Option<L2Port>,
        flow: u64,
    ) -> Result<Vec<EgressPort>, DropReason> {
        let ports: Vec<EgressPort> = self
            .db
            .vlan_members_of(vlan)
            .filter(|m| Some(m.member) != except)
            .filter_map(|m| self.member_port(vlan, m.member, flow).ok())
            .collect();
        if ports.is_empty() {
            return Err(DropReason::NoEgressPort);
        }
        Ok(ports)
    }
}
