// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The objects an engine is configured with

mod handle;
pub mod l2;
pub mod l3;
pub mod nexthop;
pub mod route;
pub mod tunnel;

pub use handle::{Handle, ObjectType};
pub use l2::{FdbDest, FdbEntry, L2Port, Lag, LagMember, PortId, Tagging, Vlan, VlanMember};
pub use l3::{Neighbor, Rif, RifKind, Vrf};
pub use nexthop::{EcmpGroup, EcmpMember, Nexthop, Rewrite};
pub use route::{Route, RouteAction};
pub use tunnel::{
    MapperEntry, MapperKind, TermKind, TtlMode, Tunnel, TunnelKind, TunnelMapper, TunnelTerm,
};

use crate::errors::ConfigError;
use net::eth::mac::Mac;
use net::mtu::Mtu;
use net::vxlan::Vni;

/// Any object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Vrf(Vrf),
    Rif(Rif),
    Neighbor(Neighbor),
    Nexthop(Nexthop),
    EcmpGroup(EcmpGroup),
    EcmpMember(EcmpMember),
    Route(Route),
    Tunnel(Tunnel),
    TunnelTerm(TunnelTerm),
    TunnelMapper(TunnelMapper),
    MapperEntry(MapperEntry),
    FdbEntry(FdbEntry),
    Lag(Lag),
    LagMember(LagMember),
    Vlan(Vlan),
    VlanMember(VlanMember),
}

impl Object {
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Vrf(_) => ObjectType::Vrf,
            Object::Rif(_) => ObjectType::Rif,
            Object::Neighbor(_) => ObjectType::Neighbor,
            Object::Nexthop(_) => ObjectType::Nexthop,
            Object::EcmpGroup(_) => ObjectType::EcmpGroup,
            Object::EcmpMember(_) => ObjectType::EcmpMember,
            Object::Route(_) => ObjectType::Route,
            Object::Tunnel(_) => ObjectType::Tunnel,
            Object::TunnelTerm(_) => ObjectType::TunnelTerm,
            Object::TunnelMapper(_) => ObjectType::TunnelMapper,
            Object::MapperEntry(_) => ObjectType::TunnelMapperEntry,
            Object::FdbEntry(_) => ObjectType::FdbEntry,
            Object::Lag(_) => ObjectType::Lag,
            Object::LagMember(_) => ObjectType::LagMember,
            Object::Vlan(_) => ObjectType::Vlan,
            Object::VlanMember(_) => ObjectType::VlanMember,
        }
    }

    /// The handles this object refers to. Each reference pins the referred object.
    #[must_use]
    pub fn references(&self) -> Vec<Handle> {
        fn lag_of(port: &L2Port) -> Option<Handle> {
            match port {
                L2Port::Lag(lag) => Some(*lag),
                L2Port::Port(_) => None,
            }
        }
        match self {
            Object::Vrf(_)
            | Object::EcmpGroup(_)
            | Object::TunnelMapper(_)
            | Object::Lag(_)
            | Object::Vlan(_) => vec![],
            Object::Rif(rif) => {
                let mut refs = vec![rif.vrf];
                match &rif.kind {
                    RifKind::Port(port) | RifKind::SubPort(port, _) => refs.extend(lag_of(port)),
                    RifKind::Vlan(vlan) => refs.push(*vlan),
                    RifKind::Loopback => {}
                }
                refs
            }
            Object::Neighbor(n) => vec![n.rif],
            Object::Nexthop(Nexthop::Ip { rif, .. }) => vec![*rif],
            Object::Nexthop(Nexthop::Tunnel { tunnel, .. }) => vec![*tunnel],
            Object::Nexthop(Nexthop::Drop) => vec![],
            Object::EcmpMember(m) => vec![m.group, m.nexthop],
            Object::Route(r) => std::iter::once(r.vrf).chain(r.target).collect(),
            Object::Tunnel(t) => std::iter::once(t.underlay_rif)
                .chain(t.overlay_rif)
                .chain(t.encap_mappers.iter().copied())
                .chain(t.decap_mappers.iter().copied())
                .collect(),
            Object::TunnelTerm(t) => vec![t.tunnel, t.vrf],
            Object::MapperEntry(e) => vec![e.mapper, e.network],
            Object::FdbEntry(e) => {
                let mut refs = vec![e.vlan];
                match &e.dest {
                    FdbDest::Port(port) => refs.extend(lag_of(port)),
                    FdbDest::Tunnel { tunnel, .. } => refs.push(*tunnel),
                    FdbDest::Nexthop(nh) => refs.push(*nh),
                }
                refs
            }
            Object::LagMember(m) => vec![m.lag],
            Object::VlanMember(m) => std::iter::once(m.vlan).chain(lag_of(&m.member)).collect(),
        }
    }

    /// A copy of this object with the attribute applied
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::InvalidAttribute`] if the attribute does not
    /// apply to this kind of object.
    pub fn with_attribute(&self, attr: &Attribute) -> Result<Object, ConfigError> {
        let mut object = self.clone();
        match (&mut object, attr) {
            (Object::Vrf(vrf), Attribute::VrfSrcMac(mac)) => vrf.src_mac = *mac,
            (Object::Rif(rif), Attribute::RifSrcMac(mac)) => rif.src_mac = *mac,
            (Object::Rif(rif), Attribute::RifMtu(mtu)) => rif.mtu = *mtu,
            (Object::Rif(rif), Attribute::RifV4Enabled(on)) => rif.v4_enabled = *on,
            (Object::Rif(rif), Attribute::RifV6Enabled(on)) => rif.v6_enabled = *on,
            (Object::Neighbor(n), Attribute::NeighborMac(mac)) => n.mac = *mac,
            (Object::Nexthop(Nexthop::Tunnel { mac, .. }), Attribute::NexthopMac(new)) => {
                *mac = *new;
            }
            (Object::Nexthop(Nexthop::Tunnel { vni, .. }), Attribute::NexthopVni(new)) => {
                *vni = *new;
            }
            (Object::Route(r), Attribute::RouteTarget(target)) => r.target = *target,
            (Object::Route(r), Attribute::RouteAction(action)) => r.action = *action,
            (Object::Tunnel(t), Attribute::TunnelEncapTtlMode(mode)) => t.encap_ttl_mode = *mode,
            (Object::Tunnel(t), Attribute::TunnelDecapTtlMode(mode)) => t.decap_ttl_mode = *mode,
            (Object::Tunnel(t), Attribute::TunnelEncapTtl(ttl)) => t.encap_ttl = *ttl,
            (Object::Tunnel(t), Attribute::TunnelEncapMappers(m)) => t.encap_mappers.clone_from(m),
            (Object::Tunnel(t), Attribute::TunnelDecapMappers(m)) => t.decap_mappers.clone_from(m),
            (Object::FdbEntry(e), Attribute::FdbDest(dest)) => e.dest = dest.clone(),
            (object, attr) => {
                return Err(ConfigError::InvalidAttribute(format!(
                    "{attr:?} does not apply to {} objects",
                    object.object_type()
                )));
            }
        }
        Ok(object)
    }
}

/// An attribute that can be changed on an existing object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    VrfSrcMac(Option<Mac>),
    RifSrcMac(Option<Mac>),
    RifMtu(Mtu),
    RifV4Enabled(bool),
    RifV6Enabled(bool),
    NeighborMac(Mac),
    NexthopMac(Option<Mac>),
    NexthopVni(Option<Vni>),
    RouteTarget(Option<Handle>),
    RouteAction(RouteAction),
    TunnelEncapTtlMode(TtlMode),
    TunnelDecapTtlMode(TtlMode),
    TunnelEncapTtl(u8),
    TunnelEncapMappers(Vec<Handle>),
    TunnelDecapMappers(Vec<Handle>),
    FdbDest(FdbDest),
}

macro_rules! object_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(impl From<$ty> for Object {
            fn from(value: $ty) -> Self {
                Object::$variant(value)
            }
        })*
    };
}

object_from!(
    Vrf(Vrf),
    Rif(Rif),
    Neighbor(Neighbor),
    Nexthop(Nexthop),
    EcmpGroup(EcmpGroup),
    EcmpMember(EcmpMember),
    Route(Route),
    Tunnel(Tunnel),
    TunnelTerm(TunnelTerm),
    TunnelMapper(TunnelMapper),
    MapperEntry(MapperEntry),
    FdbEntry(FdbEntry),
    Lag(Lag),
    LagMember(LagMember),
    Vlan(Vlan),
    VlanMember(VlanMember),
);
