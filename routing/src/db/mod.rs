// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The object database: every configured object plus the indexes the
//! forwarding path needs. A database is only mutated through [`DbChange`]s.

mod apply;

pub use apply::DbChange;

use crate::device::DeviceConfig;
use crate::objects::{
    EcmpMember, FdbEntry, Handle, L2Port, MapperEntry, Neighbor, Nexthop, Object, ObjectType,
    PortId, Rif, Route, Tunnel, TunnelKind, TunnelMapper, TunnelTerm, Vlan, VlanMember, Vrf,
};
use lpm::{LpmTable, Prefix};
use net::eth::mac::Mac;
use net::vlan::Vid;
use net::vxlan::Vni;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Key of a tunnel termination entry. A P2MP entry has no source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TermKey {
    pub(crate) vrf: Handle,
    pub(crate) kind: TunnelKind,
    pub(crate) dst: IpAddr,
    pub(crate) src: Option<IpAddr>,
}

const HANDLE_MIN: Handle = Handle::MIN;
const HANDLE_MAX: Handle = Handle::MAX;

#[derive(Debug, Clone)]
pub struct ObjectDb {
    device: DeviceConfig,
    objects: BTreeMap<Handle, Object>,
    refcounts: BTreeMap<Handle, usize>,

    routes: BTreeMap<Handle, LpmTable<Handle>>,
    neighbors: BTreeMap<(Handle, IpAddr), Handle>,
    fdb: BTreeMap<(Handle, Mac), Handle>,
    lag_of_port: BTreeMap<PortId, Handle>,
    lag_members: BTreeMap<(Handle, PortId), Handle>,
    vlans: BTreeMap<Vid, Handle>,
    vlan_members: BTreeMap<(Handle, L2Port), Handle>,
    untagged: BTreeMap<L2Port, Handle>,
    port_rifs: BTreeMap<L2Port, Handle>,
    subport_rifs: BTreeMap<(L2Port, Vid), Handle>,
    vlan_rifs: BTreeMap<Handle, Handle>,
    ecmp_members: BTreeMap<(Handle, Handle), Handle>,
    mapper_networks: BTreeMap<(Handle, Handle), Handle>,
    mapper_vnis: BTreeMap<(Handle, Vni), Handle>,
    terms: BTreeMap<TermKey, Handle>,
}

macro_rules! typed_getter {
    ($fn:ident, $variant:ident, $ty:ty) => {
        #[must_use]
        pub fn $fn(&self, handle: Handle) -> Option<&$ty> {
            match self.objects.get(&handle) {
                Some(Object::$variant(object)) => Some(object),
                _ => None,
            }
        }
    };
}

impl ObjectDb {
    #[must_use]
    pub fn new(device: DeviceConfig) -> Self {
        Self {
            device,
            objects: BTreeMap::new(),
            refcounts: BTreeMap::new(),
            routes: BTreeMap::new(),
            neighbors: BTreeMap::new(),
            fdb: BTreeMap::new(),
            lag_of_port: BTreeMap::new(),
            lag_members: BTreeMap::new(),
            vlans: BTreeMap::new(),
            vlan_members: BTreeMap::new(),
            untagged: BTreeMap::new(),
            port_rifs: BTreeMap::new(),
            subport_rifs: BTreeMap::new(),
            vlan_rifs: BTreeMap::new(),
            ecmp_members: BTreeMap::new(),
            mapper_networks: BTreeMap::new(),
            mapper_vnis: BTreeMap::new(),
            terms: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn device(&self) -> &DeviceConfig {
        &self.device
    }

    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&Object> {
        self.objects.get(&handle)
    }

    typed_getter!(vrf, Vrf, Vrf);
    typed_getter!(rif, Rif, Rif);
    typed_getter!(nexthop, Nexthop, Nexthop);
    typed_getter!(route, Route, Route);
    typed_getter!(tunnel, Tunnel, Tunnel);
    typed_getter!(term, TunnelTerm, TunnelTerm);
    typed_getter!(mapper, TunnelMapper, TunnelMapper);
    typed_getter!(mapper_entry, MapperEntry, MapperEntry);
    typed_getter!(fdb_entry, FdbEntry, FdbEntry);
    typed_getter!(vlan, Vlan, Vlan);
    typed_getter!(vlan_member, VlanMember, VlanMember);

    /// Handles of all the objects of a type, in creation order
    #[must_use]
    pub fn handles(&self, otype: ObjectType) -> Vec<Handle> {
        self.objects
            .range(Handle::range_of(otype))
            .map(|(h, _)| *h)
            .collect()
    }

    #[must_use]
    pub fn count(&self, otype: ObjectType) -> usize {
        self.objects.range(Handle::range_of(otype)).count()
    }

    /// Number of objects referring to the given one
    #[must_use]
    pub fn refcount(&self, handle: Handle) -> usize {
        self.refcounts.get(&handle).copied().unwrap_or(0)
    }

    /// Longest prefix match in a VRF
    #[must_use]
    pub fn lookup_route(&self, vrf: Handle, addr: IpAddr) -> Option<(Prefix, &Route)> {
        let (prefix, handle) = self.routes.get(&vrf)?.lookup(addr)?;
        self.route(*handle).map(|route| (prefix, route))
    }

    #[must_use]
    pub fn route_by_prefix(&self, vrf: Handle, prefix: &Prefix) -> Option<Handle> {
        self.routes.get(&vrf)?.get(prefix).copied()
    }

    #[must_use]
    pub fn neighbor(&self, rif: Handle, ip: IpAddr) -> Option<&Neighbor> {
        let handle = self.neighbors.get(&(rif, ip))?;
        match self.objects.get(handle) {
            Some(Object::Neighbor(n)) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn neighbor_handle(&self, rif: Handle, ip: IpAddr) -> Option<Handle> {
        self.neighbors.get(&(rif, ip)).copied()
    }

    #[must_use]
    pub fn fdb_lookup(&self, vlan: Handle, mac: Mac) -> Option<(Handle, &FdbEntry)> {
        let handle = *self.fdb.get(&(vlan, mac))?;
        self.fdb_entry(handle).map(|entry| (handle, entry))
    }

    /// The LAG a port is a member of
    #[must_use]
    pub fn lag_of(&self, port: PortId) -> Option<Handle> {
        self.lag_of_port.get(&port).copied()
    }

    /// The member ports of a LAG, in port order
    #[must_use]
    pub fn lag_ports(&self, lag: Handle) -> Vec<PortId> {
        self.lag_members
            .range((lag, PortId(0))..=(lag, PortId(u16::MAX)))
            .map(|((_, port), _)| *port)
            .collect()
    }

    #[must_use]
    pub fn vlan_by_vid(&self, vid: Vid) -> Option<Handle> {
        self.vlans.get(&vid).copied()
    }

    #[must_use]
    pub fn vlan_membership(&self, vlan: Handle, member: L2Port) -> Option<(Handle, &VlanMember)> {
        let handle = *self.vlan_members.get(&(vlan, member))?;
        self.vlan_member(handle).map(|m| (handle, m))
    }

    /// The members of a VLAN, ports first
    pub fn vlan_members_of(&self, vlan: Handle) -> impl Iterator<Item = &VlanMember> {
        self.vlan_members
            .range((vlan, L2Port::Port(PortId(0)))..=(vlan, L2Port::Lag(HANDLE_MAX)))
            .filter_map(|(_, h)| self.vlan_member(*h))
    }

    /// The VLAN a port or LAG is an untagged member of
    #[must_use]
    pub fn untagged_vlan(&self, member: L2Port) -> Option<Handle> {
        self.untagged.get(&member).copied()
    }

    #[must_use]
    pub fn port_rif(&self, port: L2Port) -> Option<Handle> {
        self.port_rifs.get(&port).copied()
    }

    #[must_use]
    pub fn subport_rif(&self, port: L2Port, vid: Vid) -> Option<Handle> {
        self.subport_rifs.get(&(port, vid)).copied()
    }

    #[must_use]
    pub fn vlan_rif(&self, vlan: Handle) -> Option<Handle> {
        self.vlan_rifs.get(&vlan).copied()
    }

    /// Tell if a port is used by a RIF or a VLAN membership
    #[must_use]
    pub fn port_in_use(&self, port: PortId) -> bool {
        let l2port = L2Port::Port(port);
        self.port_rifs.contains_key(&l2port)
            || self.subport_rifs.keys().any(|(p, _)| *p == l2port)
            || self.vlan_members.keys().any(|(_, p)| *p == l2port)
    }

    /// The nexthops of an ECMP group, with their member handles
    #[must_use]
    pub fn ecmp_members(&self, group: Handle) -> Vec<(Handle, Handle)> {
        self.ecmp_members
            .range((group, HANDLE_MIN)..=(group, HANDLE_MAX))
            .map(|((_, nexthop), member)| (*member, *nexthop))
            .collect()
    }

    #[must_use]
    pub fn ecmp_member_of(&self, group: Handle, nexthop: Handle) -> Option<Handle> {
        self.ecmp_members.get(&(group, nexthop)).copied()
    }

    /// The VNI a mapper binds a network to
    #[must_use]
    pub fn mapper_vni(&self, mapper: Handle, network: Handle) -> Option<Vni> {
        let entry = self.mapper_networks.get(&(mapper, network))?;
        self.mapper_entry(*entry).map(|e| e.vni)
    }

    /// The network a mapper binds a VNI to
    #[must_use]
    pub fn mapper_network(&self, mapper: Handle, vni: Vni) -> Option<Handle> {
        let entry = self.mapper_vnis.get(&(mapper, vni))?;
        self.mapper_entry(*entry).map(|e| e.network)
    }

    /// The termination entry matching an outer header, P2P entries first
    #[must_use]
    pub fn match_term(
        &self,
        vrf: Handle,
        kind: TunnelKind,
        dst: IpAddr,
        src: IpAddr,
    ) -> Option<(Handle, &TunnelTerm)> {
        let p2p = TermKey {
            vrf,
            kind,
            dst,
            src: Some(src),
        };
        let p2mp = TermKey { src: None, ..p2p };
        let handle = self.terms.get(&p2p).or_else(|| self.terms.get(&p2mp))?;
        self.term(*handle).map(|t| (*handle, t))
    }

    /// The termination entries with the same VRF, tunnel kind and destination
    pub(crate) fn terms_at(
        &self,
        vrf: Handle,
        kind: TunnelKind,
        dst: IpAddr,
    ) -> impl Iterator<Item = (&TermKey, &Handle)> {
        self.terms
            .range(
                TermKey {
                    vrf,
                    kind,
                    dst,
                    src: None,
                }..,
            )
            .take_while(move |(k, _)| k.vrf == vrf && k.kind == kind && k.dst == dst)
    }

    /// Router MAC of a VRF
    #[must_use]
    pub fn vrf_mac(&self, vrf: Handle) -> Mac {
        self.vrf(vrf)
            .and_then(|v| v.src_mac)
            .unwrap_or(self.device.src_mac)
    }

    /// Router MAC of a RIF: its own, else its VRF's, else the device's
    #[must_use]
    pub fn rif_mac(&self, rif: &Rif) -> Mac {
        rif.src_mac.unwrap_or_else(|| self.vrf_mac(rif.vrf))
    }

    /// Nexthop of an ECMP member
    #[must_use]
    pub fn ecmp_member(&self, handle: Handle) -> Option<&EcmpMember> {
        match self.objects.get(&handle) {
            Some(Object::EcmpMember(m)) => Some(m),
            _ => None,
        }
    }

    /// The tunnel of a tunnel nexthop
    #[must_use]
    pub fn tunnel_of(&self, nexthop: &Nexthop) -> Option<&Tunnel> {
        match nexthop {
            Nexthop::Tunnel { tunnel, .. } => self.tunnel(*tunnel),
            _ => None,
        }
    }
}
