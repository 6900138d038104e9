// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Scenario tests, and the topologies they share

mod bridge;
mod concurrency;

use crate::engine::Engine;
use crate::objects::{
    Handle, MapperEntry, MapperKind, Neighbor, Nexthop, PortId, Rif, Route, Tunnel, TunnelTerm,
    Vrf,
};
use crate::params::EngineParamsBuilder;
use lpm::Prefix;
use net::eth::Eth;
use net::eth::mac::Mac;
use net::frame::Frame;
use net::frame::build::{IpFrameParams, OuterParams};
use net::vxlan::{Vni, Vxlan};
use std::net::IpAddr;

pub(crate) const UPLINK: PortId = PortId(1);
pub(crate) const ACCESS: PortId = PortId(2);
pub(crate) const VNI: u32 = 1000;

pub(crate) fn ip(addr: &str) -> IpAddr {
    addr.parse().unwrap()
}

pub(crate) fn prefix(prefix: &str) -> Prefix {
    Prefix::try_from(prefix).unwrap()
}

pub(crate) fn vni(vni: u32) -> Vni {
    Vni::new_checked(vni).unwrap()
}

/// One end of a VXLAN tunnel: a switch with a host behind its access port
pub(crate) struct Side {
    pub mac: Mac,
    pub vtep: &'static str,
    pub host_net: &'static str,
    pub host_ip: &'static str,
    pub host_mac: Mac,
}

pub(crate) const SIDE_A: Side = Side {
    mac: Mac([0x00, 0x77, 0x66, 0x55, 0x44, 0x33]),
    vtep: "10.10.10.1",
    host_net: "192.168.0.0/24",
    host_ip: "192.168.0.1",
    host_mac: Mac([0x00, 0x22, 0x22, 0x22, 0x22, 0x22]),
};

pub(crate) const SIDE_B: Side = Side {
    mac: Mac([0x00, 0x11, 0x11, 0x11, 0x11, 0x11]),
    vtep: "10.10.10.2",
    host_net: "192.168.100.0/24",
    host_ip: "192.168.100.5",
    host_mac: Mac([0x00, 0x33, 0x33, 0x33, 0x33, 0x33]),
};

/// A switch routing an overlay VRF over a VXLAN tunnel. The underlay is the
/// default VRF, reached through the uplink port; the local hosts are behind
/// the access port.
pub(crate) struct Topo {
    pub engine: Engine,
    pub uvrf: Handle,
    pub ovrf: Handle,
    pub uplink: Handle,
    pub access: Handle,
    pub loopback: Handle,
    pub encap_mapper: Handle,
    pub decap_mapper: Handle,
    pub tunnel: Handle,
    pub term: Handle,
    pub tunnel_nh: Handle,
    pub overlay_route: Handle,
}

impl Topo {
    pub(crate) fn vxlan() -> Self {
        Self::vxlan_between(&SIDE_A, &SIDE_B)
    }

    pub(crate) fn vxlan_between(local: &Side, remote: &Side) -> Self {
        let params = EngineParamsBuilder::default()
            .name(local.vtep)
            .src_mac(local.mac)
            .build()
            .unwrap();
        let mut engine = Engine::new(params);
        let uvrf = engine.default_vrf();
        let ovrf = engine.add_vrf(Vrf::default()).unwrap();
        let uplink = engine.add_rif(Rif::port(uvrf, UPLINK)).unwrap();
        let access = engine.add_rif(Rif::port(ovrf, ACCESS)).unwrap();
        let loopback = engine.add_rif(Rif::loopback(uvrf)).unwrap();

        engine
            .add_neighbor(Neighbor::new(uplink, ip(remote.vtep), remote.mac))
            .unwrap();
        engine
            .add_route(Route::new(uvrf, prefix("10.10.10.0/24"), uplink))
            .unwrap();
        engine
            .add_neighbor(Neighbor::new(access, ip(local.host_ip), local.host_mac))
            .unwrap();
        engine
            .add_route(Route::new(ovrf, prefix(local.host_net), access))
            .unwrap();

        let encap_mapper = engine.add_tunnel_mapper(MapperKind::VrfToVni).unwrap();
        let decap_mapper = engine.add_tunnel_mapper(MapperKind::VniToVrf).unwrap();
        engine
            .add_tunnel_mapper_entry(MapperEntry::new(encap_mapper, ovrf, vni(VNI)))
            .unwrap();
        engine
            .add_tunnel_mapper_entry(MapperEntry::new(decap_mapper, ovrf, vni(VNI)))
            .unwrap();
        let tunnel = engine
            .add_tunnel(
                Tunnel::vxlan(ip(local.vtep), loopback)
                    .with_mappers(&[encap_mapper], &[decap_mapper]),
            )
            .unwrap();
        let term = engine
            .add_tunnel_term(TunnelTerm::p2mp(tunnel, uvrf, ip(local.vtep)))
            .unwrap();
        let tunnel_nh = engine
            .add_nexthop(Nexthop::tunnel(tunnel, ip(remote.vtep)))
            .unwrap();
        let overlay_route = engine
            .add_route(Route::new(ovrf, prefix(remote.host_net), tunnel_nh))
            .unwrap();
        Self {
            engine,
            uvrf,
            ovrf,
            uplink,
            access,
            loopback,
            encap_mapper,
            decap_mapper,
            tunnel,
            term,
            tunnel_nh,
            overlay_route,
        }
    }

    /// Add an IP-in-IP tunnel between the two VTEP addresses, terminated in the
    /// underlay and decapsulated into the overlay VRF. `192.168.200.0/24` is
    /// routed through it.
    pub(crate) fn with_ipip(&mut self, local: &Side, remote: &Side) -> (Handle, Handle) {
        let engine = &mut self.engine;
        let tunnel = engine
            .add_tunnel(Tunnel::ipip(ip(local.vtep), self.loopback, self.access))
            .unwrap();
        engine
            .add_tunnel_term(TunnelTerm::p2mp(tunnel, self.uvrf, ip(local.vtep)))
            .unwrap();
        let nexthop = engine
            .add_nexthop(Nexthop::tunnel(tunnel, ip(remote.vtep)))
            .unwrap();
        engine
            .add_route(Route::new(self.ovrf, prefix(IPIP_NET), nexthop))
            .unwrap();
        (tunnel, nexthop)
    }
}

pub(crate) const IPIP_NET: &str = "192.168.200.0/24";

/// A frame sent by the host behind the access port of side A
pub(crate) fn host_frame(dst: &str) -> IpFrameParams {
    IpFrameParams {
        eth_dst: SIDE_A.mac,
        eth_src: SIDE_A.host_mac,
        src: ip(SIDE_A.host_ip),
        dst: ip(dst),
        ..Default::default()
    }
}

/// Outer headers of frames from side A to side B, or the reverse
pub(crate) fn outer(from: &Side, to: &Side, ttl: u8) -> OuterParams {
    OuterParams {
        eth_dst: to.mac,
        eth_src: from.mac,
        vlan: None,
        src: ip(from.vtep),
        dst: ip(to.vtep),
        ttl,
    }
}

/// The VXLAN frame side A sends for a frame of its host, with the given outer TTL
/// and inner destination MAC
pub(crate) fn expected_vxlan(sent: &Frame, inner_dmac: Mac, outer_ttl: u8) -> Frame {
    let mut inner = sent.clone();
    inner.eth = Eth::new(SIDE_A.mac, inner_dmac);
    let packet = inner.ip_mut().unwrap();
    let ttl = packet.header.ttl();
    packet.header.set_ttl(ttl - 1);
    let udp_sport = Vxlan::source_port(inner.flow_hash());
    outer(&SIDE_A, &SIDE_B, outer_ttl).vxlan(udp_sport, vni(VNI), inner)
}

/// A VXLAN frame from side B's VTEP to side A, around an inner frame
pub(crate) fn vxlan_to_a(inner: Frame, vni: Vni) -> Frame {
    outer(&SIDE_B, &SIDE_A, 64).vxlan(Vxlan::source_port(inner.flow_hash()), vni, inner)
}

/// A frame from a host of side B to the host of side A, as found inside a VXLAN frame
pub(crate) fn inner_to_a(dmac: Mac) -> IpFrameParams {
    IpFrameParams {
        eth_dst: dmac,
        eth_src: SIDE_B.mac,
        src: ip(SIDE_B.host_ip),
        dst: ip(SIDE_A.host_ip),
        ..Default::default()
    }
}
