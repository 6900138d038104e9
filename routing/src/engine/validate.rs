// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Checks run on an object before it is stored. Nothing here mutates the database.

use crate::db::{ObjectDb, TermKey};
use crate::errors::ConfigError;
use crate::objects::{
    EcmpMember, Handle, FdbDest, FdbEntry, L2Port, LagMember, MapperEntry, Neighbor, Nexthop, Object,
    ObjectType, PortId, Rewrite, Rif, RifKind, Route, RouteAction, Tagging, Tunnel, TunnelKind,
    TunnelMapper, TunnelTerm, TermKind, VlanMember,
};
use net::eth::mac::Mac;
use std::net::IpAddr;

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::InvalidAttribute(msg.into())
}

fn same_family(a: &IpAddr, b: &IpAddr) -> bool {
    a.is_ipv4() == b.is_ipv4()
}

/// Check that a handle refers to an existing object of the given type
fn must_be(db: &ObjectDb, handle: Handle, otype: ObjectType, what: &str) -> Result<(), ConfigError> {
    if !handle.is(otype) {
        return Err(invalid(format!("{what} {handle} is not a {otype}")));
    }
    if db.get(handle).is_none() {
        return Err(ConfigError::NoSuchObject(handle));
    }
    Ok(())
}

fn get_rif<'a>(db: &'a ObjectDb, handle: Handle, what: &str) -> Result<&'a Rif, ConfigError> {
    must_be(db, handle, ObjectType::Rif, what)?;
    db.rif(handle).ok_or(ConfigError::NoSuchObject(handle))
}

fn get_tunnel<'a>(db: &'a ObjectDb, handle: Handle) -> Result<&'a Tunnel, ConfigError> {
    must_be(db, handle, ObjectType::Tunnel, "tunnel")?;
    db.tunnel(handle).ok_or(ConfigError::NoSuchObject(handle))
}

fn get_mapper<'a>(db: &'a ObjectDb, handle: Handle) -> Result<&'a TunnelMapper, ConfigError> {
    must_be(db, handle, ObjectType::TunnelMapper, "mapper")?;
    db.mapper(handle).ok_or(ConfigError::NoSuchObject(handle))
}

fn get_nexthop<'a>(db: &'a ObjectDb, handle: Handle) -> Result<&'a Nexthop, ConfigError> {
    must_be(db, handle, ObjectType::Nexthop, "nexthop")?;
    db.nexthop(handle).ok_or(ConfigError::NoSuchObject(handle))
}

fn check_router_mac(mac: Option<Mac>) -> Result<(), ConfigError> {
    match mac {
        Some(mac) if !mac.is_unicast() || mac.is_zero() => {
            Err(invalid(format!("{mac} can not be a router mac")))
        }
        _ => Ok(()),
    }
}

fn check_port(db: &ObjectDb, port: PortId) -> Result<(), ConfigError> {
    if port.0 >= db.device().ports {
        return Err(invalid(format!(
            "{port} does not exist: the device has {} ports",
            db.device().ports
        )));
    }
    Ok(())
}

/// A port or LAG that can be bound to a RIF or a VLAN. Ports that are LAG
/// members can only be used through their LAG.
fn check_l2port(db: &ObjectDb, l2port: &L2Port) -> Result<(), ConfigError> {
    match l2port {
        L2Port::Port(port) => {
            check_port(db, *port)?;
            if let Some(lag) = db.lag_of(*port) {
                return Err(ConfigError::ConflictingBinding(format!(
                    "{port} is a member of {lag}"
                )));
            }
            Ok(())
        }
        L2Port::Lag(lag) => must_be(db, *lag, ObjectType::Lag, "lag"),
    }
}

fn check_rif(db: &ObjectDb, rif: &Rif) -> Result<(), ConfigError> {
    must_be(db, rif.vrf, ObjectType::Vrf, "vrf")?;
    check_router_mac(rif.src_mac)?;
    match &rif.kind {
        RifKind::Port(port) | RifKind::SubPort(port, _) => check_l2port(db, port),
        RifKind::Vlan(vlan) => must_be(db, *vlan, ObjectType::Vlan, "vlan"),
        RifKind::Loopback => Ok(()),
    }
}

fn check_neighbor(db: &ObjectDb, neighbor: &Neighbor) -> Result<(), ConfigError> {
    let rif = get_rif(db, neighbor.rif, "neighbor rif")?;
    if rif.is_loopback() {
        return Err(invalid("neighbors can not be set on loopback interfaces"));
    }
    if neighbor.mac.is_zero() {
        return Err(invalid("neighbor mac can not be zero"));
    }
    Ok(())
}

fn check_nexthop(db: &ObjectDb, nexthop: &Nexthop) -> Result<(), ConfigError> {
    match nexthop {
        Nexthop::Ip { rif, .. } => get_rif(db, *rif, "nexthop rif").map(|_| ()),
        Nexthop::Tunnel {
            tunnel,
            ip,
            rewrite,
            mac,
            vni,
        } => {
            let t = get_tunnel(db, *tunnel)?;
            if !same_family(ip, &t.src_ip) {
                return Err(invalid(format!(
                    "nexthop {ip} and tunnel source {} are of different families",
                    t.src_ip
                )));
            }
            if t.kind == TunnelKind::Ipip && (vni.is_some() || *rewrite != Rewrite::L3) {
                return Err(invalid("ip-in-ip nexthops only support l3 rewrite, without vni"));
            }
            match rewrite {
                Rewrite::L3Vni if vni.is_none() => {
                    Err(invalid("l3 rewrite with vni requires a vni"))
                }
                Rewrite::L2 if mac.is_some() || vni.is_some() => {
                    Err(invalid("l2 rewrite does not take a mac nor a vni"))
                }
                _ => check_router_mac(*mac),
            }
        }
        Nexthop::Drop => Ok(()),
    }
}

fn check_ecmp_member(db: &ObjectDb, member: &EcmpMember) -> Result<(), ConfigError> {
    must_be(db, member.group, ObjectType::EcmpGroup, "ecmp group")?;
    match get_nexthop(db, member.nexthop)? {
        Nexthop::Drop => Err(invalid("drop nexthops can not be ecmp members")),
        nh if nh.is_l2() => Err(invalid("l2 nexthops can not be ecmp members")),
        _ => Ok(()),
    }
}

fn check_route(db: &ObjectDb, route: &Route) -> Result<(), ConfigError> {
    must_be(db, route.vrf, ObjectType::Vrf, "vrf")?;
    let Some(target) = route.target else {
        if route.action == RouteAction::Forward {
            return Err(invalid(format!("forwarding route {} has no target", route.prefix)));
        }
        return Ok(());
    };
    match target.object_type() {
        Some(ObjectType::Rif) => get_rif(db, target, "route target").map(|_| ()),
        Some(ObjectType::EcmpGroup) => must_be(db, target, ObjectType::EcmpGroup, "route target"),
        Some(ObjectType::Nexthop) => {
            if get_nexthop(db, target)?.is_l2() {
                return Err(invalid("l2 nexthops can not be route targets"));
            }
            Ok(())
        }
        _ => Err(invalid(format!(
            "route target {target} is not a rif, a nexthop or an ecmp group"
        ))),
    }
}

fn check_tunnel(db: &ObjectDb, tunnel: &Tunnel) -> Result<(), ConfigError> {
    if !get_rif(db, tunnel.underlay_rif, "underlay rif")?.is_loopback() {
        return Err(invalid("the underlay rif of a tunnel must be a loopback"));
    }
    match (tunnel.kind, tunnel.overlay_rif) {
        (TunnelKind::Ipip, None) => return Err(invalid("ip-in-ip tunnels need an overlay rif")),
        (TunnelKind::Ipip, Some(overlay)) => {
            get_rif(db, overlay, "overlay rif")?;
            if !tunnel.encap_mappers.is_empty() || !tunnel.decap_mappers.is_empty() {
                return Err(invalid("ip-in-ip tunnels do not use mappers"));
            }
        }
        (TunnelKind::Vxlan, Some(_)) => {
            return Err(invalid("vxlan tunnels do not take an overlay rif"));
        }
        (TunnelKind::Vxlan, None) => {}
    }
    if tunnel.src_ip.is_unspecified() || tunnel.src_ip.is_multicast() {
        return Err(invalid(format!("{} is not a tunnel source", tunnel.src_ip)));
    }
    if tunnel.encap_ttl == 0 {
        return Err(invalid("tunnel ttl can not be 0"));
    }
    for mapper in &tunnel.encap_mappers {
        if !get_mapper(db, *mapper)?.kind.is_encap() {
            return Err(invalid(format!("{mapper} is not an encap mapper")));
        }
    }
    for mapper in &tunnel.decap_mappers {
        if get_mapper(db, *mapper)?.kind.is_encap() {
            return Err(invalid(format!("{mapper} is not a decap mapper")));
        }
    }
    Ok(())
}

fn check_term(db: &ObjectDb, term: &TunnelTerm) -> Result<(), ConfigError> {
    let tunnel = get_tunnel(db, term.tunnel)?;
    must_be(db, term.vrf, ObjectType::Vrf, "vrf")?;
    match (term.kind, term.src_ip) {
        (TermKind::P2p, None) => Err(invalid("p2p terminations need a source")),
        (TermKind::P2mp, Some(_)) => Err(invalid("p2mp terminations do not take a source")),
        (_, Some(src)) if !same_family(&src, &term.dst_ip) => {
            Err(invalid("termination source and destination are of different families"))
        }
        _ if !same_family(&term.dst_ip, &tunnel.src_ip) => Err(invalid(
            "termination and tunnel addresses are of different families",
        )),
        _ => Ok(()),
    }
}

fn check_mapper_entry(db: &ObjectDb, entry: &MapperEntry) -> Result<(), ConfigError> {
    let mapper = get_mapper(db, entry.mapper)?;
    if mapper.kind.maps_vrf() {
        must_be(db, entry.network, ObjectType::Vrf, "mapper network")
    } else {
        must_be(db, entry.network, ObjectType::Vlan, "mapper network")
    }
}

fn check_fdb_entry(db: &ObjectDb, entry: &FdbEntry) -> Result<(), ConfigError> {
    must_be(db, entry.vlan, ObjectType::Vlan, "vlan")?;
    if entry.mac.is_multicast() || entry.mac.is_zero() {
        return Err(invalid(format!("{} can not be learnt", entry.mac)));
    }
    match &entry.dest {
        FdbDest::Port(port) => {
            check_l2port(db, port)?;
            if db.vlan_membership(entry.vlan, *port).is_none() {
                return Err(invalid(format!("{port} is not a member of {}", entry.vlan)));
            }
            Ok(())
        }
        FdbDest::Tunnel { tunnel, remote } => {
            let t = get_tunnel(db, *tunnel)?;
            if t.kind != TunnelKind::Vxlan {
                return Err(invalid("fdb entries can only point to vxlan tunnels"));
            }
            if !same_family(remote, &t.src_ip) {
                return Err(invalid("remote vtep and tunnel source are of different families"));
            }
            Ok(())
        }
        FdbDest::Nexthop(nh) => {
            if !get_nexthop(db, *nh)?.is_l2() {
                return Err(invalid("fdb entries can only point to l2 tunnel nexthops"));
            }
            Ok(())
        }
    }
}

fn check_lag_member(db: &ObjectDb, member: &LagMember) -> Result<(), ConfigError> {
    must_be(db, member.lag, ObjectType::Lag, "lag")?;
    check_port(db, member.port)
}

fn check_vlan_member(db: &ObjectDb, member: &VlanMember) -> Result<(), ConfigError> {
    must_be(db, member.vlan, ObjectType::Vlan, "vlan")?;
    check_l2port(db, &member.member)
}

/// Check an object against the objects it refers to
pub(crate) fn check_object(db: &ObjectDb, object: &Object) -> Result<(), ConfigError> {
    match object {
        Object::Vrf(vrf) => check_router_mac(vrf.src_mac),
        Object::Rif(rif) => check_rif(db, rif),
        Object::Neighbor(n) => check_neighbor(db, n),
        Object::Nexthop(nh) => check_nexthop(db, nh),
        Object::EcmpMember(m) => check_ecmp_member(db, m),
        Object::Route(r) => check_route(db, r),
        Object::Tunnel(t) => check_tunnel(db, t),
        Object::TunnelTerm(t) => check_term(db, t),
        Object::MapperEntry(e) => check_mapper_entry(db, e),
        Object::FdbEntry(e) => check_fdb_entry(db, e),
        Object::LagMember(m) => check_lag_member(db, m),
        Object::VlanMember(m) => check_vlan_member(db, m),
        Object::EcmpGroup(_) | Object::TunnelMapper(_) | Object::Lag(_) | Object::Vlan(_) => {
            Ok(())
        }
    }
}

fn check_term_unique(db: &ObjectDb, term: &TunnelTerm) -> Result<(), ConfigError> {
    let kind = get_tunnel(db, term.tunnel)?.kind;
    let key = TermKey {
        vrf: term.vrf,
        kind,
        dst: term.dst_ip,
        src: term.src_ip,
    };
    for (existing, handle) in db.terms_at(key.vrf, key.kind, key.dst) {
        if existing.src == key.src {
            return Err(ConfigError::ObjectExists(format!(
                "termination to {} ({handle})",
                key.dst
            )));
        }
        if existing.src.is_none() || key.src.is_none() {
            return Err(ConfigError::ConflictingBinding(format!(
                "p2p and p2mp terminations to {} overlap ({handle})",
                key.dst
            )));
        }
    }
    Ok(())
}

fn check_mapping_unique(db: &ObjectDb, entry: &MapperEntry) -> Result<(), ConfigError> {
    match db.mapper_vni(entry.mapper, entry.network) {
        Some(vni) if vni == entry.vni => {
            return Err(ConfigError::ObjectExists(format!(
                "{} is mapped to vni {vni}",
                entry.network
            )));
        }
        Some(vni) => {
            return Err(ConfigError::ConflictingBinding(format!(
                "{} is already mapped to vni {vni}",
                entry.network
            )));
        }
        None => {}
    }
    if let Some(network) = db.mapper_network(entry.mapper, entry.vni) {
        return Err(ConfigError::ConflictingBinding(format!(
            "vni {} is already mapped to {network}",
            entry.vni
        )));
    }
    Ok(())
}

fn check_vlan_member_unique(db: &ObjectDb, member: &VlanMember) -> Result<(), ConfigError> {
    if db.vlan_membership(member.vlan, member.member).is_some() {
        return Err(ConfigError::ObjectExists(format!(
            "{} is a member of {}",
            member.member, member.vlan
        )));
    }
    if member.tagging == Tagging::Untagged
        && let Some(vlan) = db.untagged_vlan(member.member)
    {
        return Err(ConfigError::ConflictingBinding(format!(
            "{} is already an untagged member of {vlan}",
            member.member
        )));
    }
    Ok(())
}

/// Check that a new object does not collide with an existing one
pub(crate) fn check_unique(db: &ObjectDb, object: &Object) -> Result<(), ConfigError> {
    let exists = |what: String| -> Result<(), ConfigError> { Err(ConfigError::ObjectExists(what)) };
    match object {
        Object::Rif(rif) => match rif.kind {
            RifKind::Port(port) if db.port_rif(port).is_some() => {
                exists(format!("rif on {port}"))
            }
            RifKind::SubPort(port, vid) if db.subport_rif(port, vid).is_some() => {
                exists(format!("rif on {port} vlan {vid}"))
            }
            RifKind::Vlan(vlan) if db.vlan_rif(vlan).is_some() => {
                exists(format!("rif on {vlan}"))
            }
            _ => Ok(()),
        },
        Object::Neighbor(n) if db.neighbor_handle(n.rif, n.ip).is_some() => {
            exists(format!("neighbor {} on {}", n.ip, n.rif))
        }
        Object::EcmpMember(m) if db.ecmp_member_of(m.group, m.nexthop).is_some() => {
            exists(format!("{} in {}", m.nexthop, m.group))
        }
        Object::Route(r) if db.route_by_prefix(r.vrf, &r.prefix).is_some() => {
            exists(format!("route to {} in {}", r.prefix, r.vrf))
        }
        Object::TunnelTerm(t) => check_term_unique(db, t),
        Object::MapperEntry(e) => check_mapping_unique(db, e),
        Object::FdbEntry(e) if db.fdb_lookup(e.vlan, e.mac).is_some() => {
            exists(format!("fdb entry for {} in {}", e.mac, e.vlan))
        }
        Object::LagMember(m) => {
            if let Some(lag) = db.lag_of(m.port) {
                Err(ConfigError::ConflictingBinding(format!(
                    "{} is already a member of {lag}",
                    m.port
                )))
            } else if db.port_in_use(m.port) {
                Err(ConfigError::ConflictingBinding(format!(
                    "{} is used by an interface or a vlan",
                    m.port
                )))
            } else {
                Ok(())
            }
        }
        Object::Vlan(v) if db.vlan_by_vid(v.vid).is_some() => exists(format!("vlan {}", v.vid)),
        Object::VlanMember(m) => check_vlan_member_unique(db, m),
        _ => Ok(()),
    }
}
