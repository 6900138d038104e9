// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bridging in VLANs, locally and over VXLAN

use crate::errors::ConfigError;
use crate::forward::{Emission, Verdict};
use crate::objects::{
    Attribute, FdbDest, FdbEntry, Handle, L2Port, MapperEntry, MapperKind, Nexthop, PortId,
    Rewrite, Rif, Tagging,
};
use crate::test::{
    ACCESS, SIDE_A, SIDE_B, Topo, UPLINK, VNI, expected_vxlan, inner_to_a, ip, outer, vni,
    vxlan_to_a,
};
use net::drop::DropReason;
use net::eth::Eth;
use net::eth::mac::Mac;
use net::frame::Frame;
use net::frame::build::IpFrameParams;
use net::vlan::Vid;
use net::vxlan::{Vni, Vxlan};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

const VID: u16 = 10;
const L2VNI: u32 = 5000;

fn host(n: u8) -> Mac {
    Mac([0x02, 0x00, 0x00, 0x00, 0x0a, n])
}

/// Hosts behind the remote VTEP
const REMOTE: Mac = Mac([0x02, 0x00, 0x00, 0x00, 0x0b, 0x01]);
const REMOTE_2: Mac = Mac([0x02, 0x00, 0x00, 0x00, 0x0b, 0x02]);

/// VLAN 10 on ports 3 (untagged), 4 (tagged) and 5 (untagged), on top of the
/// VXLAN topology
struct Bridge {
    topo: Topo,
    vlan: Handle,
}

impl Bridge {
    fn new() -> Self {
        let mut topo = Topo::vxlan();
        let engine = &mut topo.engine;
        let vlan = engine.add_vlan(VID).unwrap();
        engine.add_vlan_member(vlan, PortId(3), Tagging::Untagged).unwrap();
        engine.add_vlan_member(vlan, PortId(4), Tagging::Tagged).unwrap();
        engine.add_vlan_member(vlan, PortId(5), Tagging::Untagged).unwrap();
        Self { topo, vlan }
    }

    fn learn(&mut self, mac: Mac, dest: FdbDest) {
        self.topo
            .engine
            .add_mac_entry(FdbEntry::new(self.vlan, mac, dest))
            .unwrap();
    }

    fn learn_port(&mut self, mac: Mac, port: u16) {
        self.learn(mac, FdbDest::Port(PortId(port).into()));
    }

    /// Stretch the VLAN over the VXLAN tunnel with VNI 5000
    fn stretch(&mut self) {
        let topo = &mut self.topo;
        let encap = topo.engine.add_tunnel_mapper(MapperKind::VlanToVni).unwrap();
        let decap = topo.engine.add_tunnel_mapper(MapperKind::VniToVlan).unwrap();
        for mapper in [encap, decap] {
            topo.engine
                .add_tunnel_mapper_entry(MapperEntry::new(mapper, self.vlan, vni(L2VNI)))
                .unwrap();
        }
        topo.engine
            .set_attribute(
                topo.tunnel,
                Attribute::TunnelEncapMappers(vec![topo.encap_mapper, encap]),
            )
            .unwrap();
        topo.engine
            .set_attribute(
                topo.tunnel,
                Attribute::TunnelDecapMappers(vec![topo.decap_mapper, decap]),
            )
            .unwrap();
    }

    fn receive(&self, port: u16, frame: &Frame) -> Verdict {
        self.topo
            .engine
            .forwarder("bridge")
            .process(PortId(port), frame)
    }
}

fn frame(src: Mac, dst: Mac) -> Frame {
    IpFrameParams {
        eth_src: src,
        eth_dst: dst,
        src: ip("172.16.0.3"),
        dst: ip("172.16.0.5"),
        ..Default::default()
    }
    .build()
}

fn tagged(mut frame: Frame) -> Frame {
    frame.eth.vlan = Vid::new(VID).ok();
    frame
}

fn emission(port: u16, frame: Frame) -> Emission {
    Emission {
        port: PortId(port),
        frame,
    }
}

/// A VXLAN frame to side B around a bridged frame
fn vxlan_to_b(inner: Frame, vni: Vni) -> Frame {
    let sport = Vxlan::source_port(inner.flow_hash());
    outer(&SIDE_A, &SIDE_B, 64).vxlan(sport, vni, inner)
}

#[test]
#[traced_test]
fn known_destinations() {
    let mut bridge = Bridge::new();
    bridge.learn_port(host(4), 4);
    bridge.learn_port(host(5), 5);

    let sent = frame(host(3), host(5));
    assert_eq!(
        bridge.receive(3, &sent),
        Verdict::Forward(vec![emission(5, sent.clone())])
    );
    let sent = frame(host(3), host(4));
    assert_eq!(
        bridge.receive(3, &sent),
        Verdict::Forward(vec![emission(4, tagged(sent.clone()))])
    );
    // tags are removed for untagged members
    let sent = frame(host(4), host(5));
    assert_eq!(
        bridge.receive(4, &tagged(sent.clone())),
        Verdict::Forward(vec![emission(5, sent)])
    );
    // never sent back where it came from
    let sent = frame(host(3), host(5));
    assert_eq!(
        bridge.receive(5, &sent),
        Verdict::Drop(DropReason::Filtered)
    );
}

#[test]
#[traced_test]
fn unknown_destinations_are_flooded() {
    let mut bridge = Bridge::new();
    let sent = frame(host(3), host(9));
    let flooded = Verdict::Forward(vec![
        emission(4, tagged(sent.clone())),
        emission(5, sent.clone()),
    ]);
    assert_eq!(bridge.receive(3, &sent), flooded);

    let broadcast = frame(host(3), Mac::BROADCAST);
    assert_eq!(
        bridge.receive(3, &broadcast),
        Verdict::Forward(vec![
            emission(4, tagged(broadcast.clone())),
            emission(5, broadcast.clone()),
        ])
    );

    // a lonely member has nowhere to flood to
    let engine = &mut bridge.topo.engine;
    let vlan = engine.add_vlan(20).unwrap();
    engine.add_vlan_member(vlan, PortId(6), Tagging::Untagged).unwrap();
    assert_eq!(
        bridge.receive(6, &sent),
        Verdict::Drop(DropReason::NoEgressPort)
    );
}

#[test]
#[traced_test]
fn ingress_membership() {
    let bridge = Bridge::new();
    let sent = frame(host(3), host(5));
    // not a member
    assert_eq!(
        bridge.receive(6, &tagged(sent.clone())),
        Verdict::Drop(DropReason::InterfaceUnknown)
    );
    // no such vlan
    let mut other = sent.clone();
    other.eth.vlan = Vid::new(30).ok();
    assert_eq!(
        bridge.receive(4, &other),
        Verdict::Drop(DropReason::InterfaceUnknown)
    );
    // tagged members do not receive untagged frames
    assert_eq!(
        bridge.receive(4, &sent),
        Verdict::Drop(DropReason::InterfaceUnknown)
    );
}

#[test]
#[traced_test]
fn learnt_ports_keep_their_membership() {
    let mut bridge = Bridge::new();
    let engine = &mut bridge.topo.engine;
    let member = engine
        .add_vlan_member(bridge.vlan, PortId(6), Tagging::Untagged)
        .unwrap();
    let entry = engine
        .add_mac_entry(FdbEntry::new(bridge.vlan, host(6), FdbDest::Port(PortId(6).into())))
        .unwrap();
    assert_eq!(engine.remove(member), Err(ConfigError::HandleInUse(member)));

    // the entry moves elsewhere and releases the membership
    engine
        .set_attribute(entry, Attribute::FdbDest(FdbDest::Port(PortId(5).into())))
        .unwrap();
    engine.remove(member).unwrap();
    let sent = frame(host(3), host(6));
    assert_eq!(
        bridge.receive(3, &sent),
        Verdict::Forward(vec![emission(5, sent.clone())])
    );

    // with neither the member nor the entry, the port is a stranger again
    let engine = &mut bridge.topo.engine;
    engine.remove(entry).unwrap();
    assert!(
        engine
            .add_mac_entry(FdbEntry::new(bridge.vlan, host(6), FdbDest::Port(PortId(6).into())))
            .is_err()
    );
    assert_eq!(
        bridge.receive(6, &sent),
        Verdict::Drop(DropReason::InterfaceUnknown)
    );
}

#[test]
#[traced_test]
fn lags_in_vlans() {
    let mut bridge = Bridge::new();
    let engine = &mut bridge.topo.engine;
    let lag = engine.add_lag().unwrap();
    engine.add_lag_member(lag, PortId(7)).unwrap();
    engine.add_lag_member(lag, PortId(8)).unwrap();
    engine
        .add_vlan_member(bridge.vlan, L2Port::Lag(lag), Tagging::Untagged)
        .unwrap();
    bridge.learn(host(7), FdbDest::Port(L2Port::Lag(lag)));

    let sent = frame(host(3), host(7));
    match bridge.receive(3, &sent) {
        Verdict::Forward(emissions) => {
            assert_eq!(emissions.len(), 1);
            assert!([PortId(7), PortId(8)].contains(&emissions[0].port));
            assert_eq!(emissions[0].frame, sent);
        }
        verdict => panic!("unexpected {verdict}"),
    }
    // both lag members receive for the lag
    let back = frame(host(9), host(7));
    for port in [7, 8] {
        assert_eq!(
            bridge.receive(port, &back),
            Verdict::Drop(DropReason::Filtered)
        );
    }
    // and floods are sent once to the lag, never back to it
    let unknown = frame(host(3), host(9));
    assert_eq!(bridge.receive(3, &unknown).emissions().len(), 3);
    assert_eq!(bridge.receive(8, &unknown).emissions().len(), 3);
}

#[test]
#[traced_test]
fn vlan_interface_routes() {
    let mut bridge = Bridge::new();
    let topo = &mut bridge.topo;
    topo.engine.add_rif(Rif::vlan(topo.ovrf, bridge.vlan)).unwrap();

    let sent = IpFrameParams {
        eth_src: host(3),
        eth_dst: SIDE_A.mac,
        src: ip("172.16.0.3"),
        dst: ip(SIDE_B.host_ip),
        ..Default::default()
    }
    .build();
    let expected = expected_vxlan(&sent, SIDE_A.mac, 64);
    assert_eq!(
        bridge.receive(3, &sent),
        Verdict::Forward(vec![emission(UPLINK.0, expected)])
    );
    // the same frame tagged, from a tagged member
    let expected = expected_vxlan(&sent, SIDE_A.mac, 64);
    assert_eq!(
        bridge.receive(4, &tagged(sent)),
        Verdict::Forward(vec![emission(UPLINK.0, expected)])
    );
}

#[test]
#[traced_test]
fn vlan_interface_routes_decapsulated_frames() {
    let mut bridge = Bridge::new();
    bridge.stretch();
    let topo = &mut bridge.topo;
    topo.engine.add_rif(Rif::vlan(topo.ovrf, bridge.vlan)).unwrap();

    // inner packets are checked with the inner policy, for l2 and l3 vnis alike
    let inner = IpFrameParams {
        src: ip("127.0.0.1"),
        ..inner_to_a(SIDE_A.mac)
    };
    let mut expected = inner.build();
    expected.eth = Eth::new(SIDE_A.mac, SIDE_A.host_mac);
    expected.ip_mut().unwrap().header.set_ttl(63);
    let delivered = Verdict::Forward(vec![Emission {
        port: ACCESS,
        frame: expected,
    }]);
    for received_vni in [L2VNI, VNI] {
        let received = vxlan_to_a(inner.build(), vni(received_vni));
        assert_eq!(
            bridge.receive(UPLINK.0, &received),
            delivered,
            "vni {received_vni}"
        );
    }

    // the same packet from a local member is native
    let sent = IpFrameParams {
        eth_src: host(3),
        src: ip("127.0.0.1"),
        ..inner_to_a(SIDE_A.mac)
    }
    .build();
    assert_eq!(
        bridge.receive(3, &sent),
        Verdict::Drop(DropReason::Filtered)
    );
}

#[test]
#[traced_test]
fn bridged_into_vxlan() {
    let mut bridge = Bridge::new();
    let remote = FdbDest::Tunnel {
        tunnel: bridge.topo.tunnel,
        remote: ip(SIDE_B.vtep),
    };
    bridge.learn(REMOTE, remote);

    // no vni for the vlan yet
    let sent = frame(host(3), REMOTE);
    assert_eq!(
        bridge.receive(3, &sent),
        Verdict::Drop(DropReason::VniUnresolved)
    );

    bridge.stretch();
    assert_eq!(
        bridge.receive(3, &sent),
        Verdict::Forward(vec![emission(UPLINK.0, vxlan_to_b(sent.clone(), vni(L2VNI)))])
    );
    // the inner frame is never tagged
    assert_eq!(
        bridge.receive(4, &tagged(sent.clone())),
        Verdict::Forward(vec![emission(UPLINK.0, vxlan_to_b(sent, vni(L2VNI)))])
    );

    // l2 nexthops send with the vni of the vlan
    let nexthop = Nexthop::tunnel_with(bridge.topo.tunnel, ip(SIDE_B.vtep), Rewrite::L2, None, None);
    let nexthop = bridge.topo.engine.add_nexthop(nexthop).unwrap();
    bridge.learn(REMOTE_2, FdbDest::Nexthop(nexthop));
    let sent = frame(host(3), REMOTE_2);
    assert_eq!(
        bridge.receive(3, &sent),
        Verdict::Forward(vec![emission(UPLINK.0, vxlan_to_b(sent.clone(), vni(L2VNI)))])
    );
    // but never carry a vni of their own
    let with_vni =
        Nexthop::tunnel_with(bridge.topo.tunnel, ip(SIDE_B.vtep), Rewrite::L2, None, Some(vni(6000)));
    assert!(bridge.topo.engine.add_nexthop(with_vni).is_err());
}

#[test]
#[traced_test]
fn bridged_from_vxlan() {
    let mut bridge = Bridge::new();
    bridge.stretch();
    bridge.learn_port(host(4), 4);
    bridge.learn(
        REMOTE_2,
        FdbDest::Tunnel {
            tunnel: bridge.topo.tunnel,
            remote: ip(SIDE_B.vtep),
        },
    );

    let inner = frame(REMOTE, host(4));
    let received = vxlan_to_a(inner.clone(), vni(L2VNI));
    assert_eq!(
        bridge.receive(UPLINK.0, &received),
        Verdict::Forward(vec![emission(4, tagged(inner))])
    );

    // unknown destinations are flooded to local members only
    let inner = frame(REMOTE, host(9));
    let received = vxlan_to_a(inner.clone(), vni(L2VNI));
    assert_eq!(
        bridge.receive(UPLINK.0, &received),
        Verdict::Forward(vec![
            emission(3, inner.clone()),
            emission(4, tagged(inner.clone())),
            emission(5, inner),
        ])
    );

    // frames from a tunnel are not sent back to a tunnel
    let inner = frame(REMOTE, REMOTE_2);
    let received = vxlan_to_a(inner, vni(L2VNI));
    assert_eq!(
        bridge.receive(UPLINK.0, &received),
        Verdict::Drop(DropReason::Filtered)
    );

    // vnis of the vrf mapper do not reach the vlan
    let inner = frame(REMOTE, host(4));
    let received = vxlan_to_a(inner, vni(VNI));
    assert_eq!(
        bridge.receive(UPLINK.0, &received),
        Verdict::Drop(DropReason::InvalidInnerDmac)
    );
}
