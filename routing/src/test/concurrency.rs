// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Forwarders reading while the engine is reconfigured

use crate::engine::Engine;
use crate::forward::{Emission, Forwarder, Verdict};
use crate::objects::{Attribute, Neighbor, Nexthop, PortId, Rif, Route};
use crate::params::EngineParamsBuilder;
use crate::test::{ip, prefix};
use net::drop::DropReason;
use net::eth::Eth;
use net::eth::mac::Mac;
use net::frame::Frame;
use net::frame::build::IpFrameParams;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_test::traced_test;

const ROUTER_MAC: Mac = Mac([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
const READERS: usize = 4;

fn neighbor_mac(port: u16) -> Mac {
    Mac([0x02, 0xcc, 0x00, 0x00, 0x00, u8::try_from(port).unwrap()])
}

fn routed(sent: &Frame, port: u16) -> Verdict {
    let mut frame = sent.clone();
    frame.eth = Eth::new(ROUTER_MAC, neighbor_mac(port));
    if let Some(packet) = frame.ip_mut() {
        packet.header.set_ttl(63);
    }
    Verdict::Forward(vec![Emission {
        port: PortId(port),
        frame,
    }])
}

#[test]
#[traced_test]
fn readers_see_whole_updates() {
    let params = EngineParamsBuilder::default()
        .name("concurrent")
        .src_mac(ROUTER_MAC)
        .build()
        .unwrap();
    let mut engine = Engine::new(params);
    let vrf = engine.default_vrf();
    engine.add_rif(Rif::port(vrf, PortId(0))).unwrap();
    let mut nexthops = vec![];
    for port in [1u16, 2] {
        let rif = engine.add_rif(Rif::port(vrf, PortId(port))).unwrap();
        let addr = ip(&format!("10.{port}.0.2"));
        engine
            .add_neighbor(Neighbor::new(rif, addr, neighbor_mac(port)))
            .unwrap();
        nexthops.push(engine.add_nexthop(Nexthop::ip(rif, addr)).unwrap());
    }
    let route = engine
        .add_route(Route::new(vrf, prefix("172.16.0.0/16"), nexthops[0]))
        .unwrap();

    let sent = IpFrameParams {
        eth_dst: ROUTER_MAC,
        dst: ip("172.16.4.4"),
        ..Default::default()
    }
    .build();
    let accepted = [routed(&sent, 1), routed(&sent, 2)];

    let factory = engine.reader_factory();
    let done = AtomicBool::new(false);
    std::thread::scope(|s| {
        let workers: Vec<_> = (0..READERS)
            .map(|n| {
                let factory = factory.clone();
                let (done, sent, accepted) = (&done, &sent, &accepted);
                s.spawn(move || {
                    let mut forwarder = Forwarder::new(&format!("worker-{n}"), factory.handle());
                    let mut seen = 0usize;
                    while !done.load(Ordering::Relaxed) || seen == 0 {
                        let verdict = forwarder.process(PortId(0), sent);
                        assert!(accepted.contains(&verdict), "unexpected {verdict}");
                        seen += 1;
                    }
                    assert_eq!(forwarder.stats().total(), 0);
                    seen
                })
            })
            .collect();

        for round in 0..500 {
            let target = nexthops[round % 2];
            engine
                .set_attribute(route, Attribute::RouteTarget(Some(target)))
                .unwrap();
        }
        done.store(true, Ordering::Relaxed);
        for worker in workers {
            assert!(worker.join().unwrap() > 0);
        }
    });

    // the last update is the one in place
    let mut forwarder = engine.forwarder("after");
    assert_eq!(forwarder.process(PortId(0), &sent), routed(&sent, 2));
}

#[test]
#[traced_test]
fn removed_routes_are_never_half_seen() {
    let params = EngineParamsBuilder::default()
        .name("churn")
        .src_mac(ROUTER_MAC)
        .build()
        .unwrap();
    let mut engine = Engine::new(params);
    let vrf = engine.default_vrf();
    engine.add_rif(Rif::port(vrf, PortId(0))).unwrap();
    let rif = engine.add_rif(Rif::port(vrf, PortId(1))).unwrap();
    let addr = ip("10.1.0.2");
    engine
        .add_neighbor(Neighbor::new(rif, addr, neighbor_mac(1)))
        .unwrap();
    let nexthop = engine.add_nexthop(Nexthop::ip(rif, addr)).unwrap();

    let sent = IpFrameParams {
        eth_dst: ROUTER_MAC,
        dst: ip("172.16.4.4"),
        ..Default::default()
    }
    .build();
    let forwarded = routed(&sent, 1);

    let reader = engine.reader_factory();
    let done = AtomicBool::new(false);
    std::thread::scope(|s| {
        let worker = s.spawn(|| {
            let mut forwarder = Forwarder::new("churn", reader.handle());
            while !done.load(Ordering::Relaxed) {
                let verdict = forwarder.process(PortId(0), &sent);
                assert!(
                    verdict == forwarded || verdict == Verdict::Drop(DropReason::NoRoute),
                    "unexpected {verdict}"
                );
            }
        });
        for _ in 0..200 {
            let route = engine
                .add_route(Route::new(vrf, prefix("172.16.0.0/16"), nexthop))
                .unwrap();
            engine.remove(route).unwrap();
        }
        done.store(true, Ordering::Relaxed);
        worker.join().unwrap();
    });
    assert_eq!(engine.object_get_all_handles(crate::objects::ObjectType::Route).len(), 0);
}
