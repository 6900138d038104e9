// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Changes to the object database and their publication with left-right

use crate::db::{ObjectDb, TermKey};
use crate::device::DeviceConfig;
use crate::objects::{FdbDest, FdbEntry, Handle, Object, RifKind, Tagging};
use left_right::Absorb;
use tracing::{debug, warn};

/// A change to the object database. Changes are validated before being
/// appended, so applying one never fails.
#[derive(Debug, Clone)]
pub enum DbChange {
    Insert(Handle, Object),
    Replace(Handle, Object),
    Remove(Handle),
    Device(DeviceConfig),
}

impl ObjectDb {
    pub(crate) fn apply(&mut self, change: &DbChange) {
        match change {
            DbChange::Insert(handle, object) => {
                self.index(*handle, object);
                self.add_refs(object);
                self.objects.insert(*handle, object.clone());
            }
            DbChange::Replace(handle, object) => {
                if let Some(old) = self.objects.remove(handle) {
                    self.unindex(*handle, &old);
                    self.del_refs(&old);
                }
                self.index(*handle, object);
                self.add_refs(object);
                self.objects.insert(*handle, object.clone());
            }
            DbChange::Remove(handle) => {
                if let Some(old) = self.objects.remove(handle) {
                    self.unindex(*handle, &old);
                    self.del_refs(&old);
                    self.refcounts.remove(handle);
                } else {
                    warn!("Removal of unknown object {handle}");
                }
            }
            DbChange::Device(device) => self.device = device.clone(),
        }
    }

    /// The objects this one depends on. FDB entries to a port also pin the
    /// membership of that port in their VLAN.
    fn dependencies(&self, object: &Object) -> Vec<Handle> {
        let mut refs = object.references();
        if let Object::FdbEntry(FdbEntry {
            vlan,
            dest: FdbDest::Port(port),
            ..
        }) = object
        {
            refs.extend(self.vlan_membership(*vlan, *port).map(|(h, _)| h));
        }
        refs
    }

    fn add_refs(&mut self, object: &Object) {
        for r in self.dependencies(object) {
            *self.refcounts.entry(r).or_insert(0) += 1;
        }
    }

    fn del_refs(&mut self, object: &Object) {
        for r in self.dependencies(object) {
            if let Some(count) = self.refcounts.get_mut(&r) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.refcounts.remove(&r);
                }
            }
        }
    }

    fn term_key(&self, term: &crate::objects::TunnelTerm) -> Option<TermKey> {
        let kind = self.tunnel(term.tunnel)?.kind;
        Some(TermKey {
            vrf: term.vrf,
            kind,
            dst: term.dst_ip,
            src: term.src_ip,
        })
    }

    fn index(&mut self, handle: Handle, object: &Object) {
        match object {
            Object::Rif(rif) => match rif.kind {
                RifKind::Port(port) => {
                    self.port_rifs.insert(port, handle);
                }
                RifKind::SubPort(port, vid) => {
                    self.subport_rifs.insert((port, vid), handle);
                }
                RifKind::Vlan(vlan) => {
                    self.vlan_rifs.insert(vlan, handle);
                }
                RifKind::Loopback => {}
            },
            Object::Neighbor(n) => {
                self.neighbors.insert((n.rif, n.ip), handle);
            }
            Object::EcmpMember(m) => {
                self.ecmp_members.insert((m.group, m.nexthop), handle);
            }
            Object::Route(r) => {
                self.routes.entry(r.vrf).or_default().insert(r.prefix, handle);
            }
            Object::TunnelTerm(t) => {
                if let Some(key) = self.term_key(t) {
                    self.terms.insert(key, handle);
                }
            }
            Object::MapperEntry(e) => {
                self.mapper_networks.insert((e.mapper, e.network), handle);
                self.mapper_vnis.insert((e.mapper, e.vni), handle);
            }
            Object::FdbEntry(e) => {
                self.fdb.insert((e.vlan, e.mac), handle);
            }
            Object::LagMember(m) => {
                self.lag_of_port.insert(m.port, m.lag);
                self.lag_members.insert((m.lag, m.port), handle);
            }
            Object::Vlan(v) => {
                self.vlans.insert(v.vid, handle);
            }
            Object::VlanMember(m) => {
                self.vlan_members.insert((m.vlan, m.member), handle);
                if m.tagging == Tagging::Untagged {
                    self.untagged.insert(m.member, m.vlan);
                }
            }
            Object::Vrf(_)
            | Object::Nexthop(_)
            | Object::EcmpGroup(_)
            | Object::Tunnel(_)
            | Object::TunnelMapper(_)
            | Object::Lag(_) => {}
        }
    }

    fn unindex(&mut self, handle: Handle, object: &Object) {
        match object {
            Object::Rif(rif) => match rif.kind {
                RifKind::Port(port) => {
                    self.port_rifs.remove(&port);
                }
                RifKind::SubPort(port, vid) => {
                    self.subport_rifs.remove(&(port, vid));
                }
                RifKind::Vlan(vlan) => {
                    self.vlan_rifs.remove(&vlan);
                }
                RifKind::Loopback => {}
            },
            Object::Neighbor(n) => {
                self.neighbors.remove(&(n.rif, n.ip));
            }
            Object::EcmpMember(m) => {
                self.ecmp_members.remove(&(m.group, m.nexthop));
            }
            Object::Route(r) => {
                if let Some(table) = self.routes.get_mut(&r.vrf) {
                    table.remove(&r.prefix);
                    if table.is_empty() {
                        self.routes.remove(&r.vrf);
                    }
                }
            }
            Object::TunnelTerm(t) => {
                if let Some(key) = self.term_key(t) {
                    self.terms.remove(&key);
                }
            }
            Object::MapperEntry(e) => {
                self.mapper_networks.remove(&(e.mapper, e.network));
                self.mapper_vnis.remove(&(e.mapper, e.vni));
            }
            Object::FdbEntry(e) => {
                self.fdb.remove(&(e.vlan, e.mac));
            }
            Object::LagMember(m) => {
                self.lag_of_port.remove(&m.port);
                self.lag_members.remove(&(m.lag, m.port));
            }
            Object::Vlan(v) => {
                self.vlans.remove(&v.vid);
            }
            Object::VlanMember(m) => {
                self.vlan_members.remove(&(m.vlan, m.member));
                if m.tagging == Tagging::Untagged {
                    self.untagged.remove(&m.member);
                }
            }
            Object::Vrf(_)
            | Object::Nexthop(_)
            | Object::EcmpGroup(_)
            | Object::Tunnel(_)
            | Object::TunnelMapper(_)
            | Object::Lag(_) => {}
        }
        debug!("Unindexed {handle}");
    }
}

impl Absorb<DbChange> for ObjectDb {
    fn absorb_first(&mut self, change: &mut DbChange, _: &Self) {
        self.apply(change);
    }
    fn drop_first(self: Box<Self>) {}
    fn sync_with(&mut self, first: &Self) {
        *self = first.clone();
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{DbChange, ObjectDb};
    use crate::device::DeviceConfig;
    use crate::objects::*;
    use crate::params::EngineParams;
    use net::eth::mac::Mac;
    use std::net::IpAddr;

    fn h(otype: ObjectType, seq: u64) -> Handle {
        Handle::new(otype, seq)
    }

    #[test]
    fn refcounts_follow_changes() {
        let mut db = ObjectDb::new(DeviceConfig::new(&EngineParams::default()));
        let vrf = h(ObjectType::Vrf, 0);
        let rif = h(ObjectType::Rif, 1);
        let nbr = h(ObjectType::Neighbor, 2);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        db.apply(&DbChange::Insert(vrf, Object::Vrf(Vrf::default())));
        db.apply(&DbChange::Insert(rif, Object::Rif(Rif::port(vrf, PortId(1)))));
        db.apply(&DbChange::Insert(
            nbr,
            Object::Neighbor(Neighbor::new(rif, ip, Mac([0, 1, 2, 3, 4, 5]))),
        ));
        assert_eq!(db.refcount(vrf), 1);
        assert_eq!(db.refcount(rif), 1);
        assert_eq!(db.port_rif(L2Port::Port(PortId(1))), Some(rif));
        assert_eq!(db.neighbor(rif, ip).map(|n| n.mac), Some(Mac([0, 1, 2, 3, 4, 5])));

        // replacing keeps counts balanced
        db.apply(&DbChange::Replace(
            nbr,
            Object::Neighbor(Neighbor::new(rif, ip, Mac([0, 1, 2, 3, 4, 6]))),
        ));
        assert_eq!(db.refcount(rif), 1);
        assert_eq!(db.neighbor(rif, ip).map(|n| n.mac), Some(Mac([0, 1, 2, 3, 4, 6])));

        db.apply(&DbChange::Remove(nbr));
        db.apply(&DbChange::Remove(rif));
        assert_eq!(db.refcount(vrf), 0);
        assert!(db.neighbor(rif, ip).is_none());
        assert!(db.port_rif(L2Port::Port(PortId(1))).is_none());
        assert_eq!(db.handles(ObjectType::Vrf), vec![vrf]);
    }
}
