// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bridging within a VLAN

use crate::forward::encap::Payload;
use crate::forward::{Emission, FrameProcessor, Origin};
use crate::objects::{FdbDest, Handle};
use net::drop::DropReason;
use net::frame::{Frame, is_flooded};
use tracing::trace;

impl FrameProcessor<'_> {
    /// Forward a frame in a VLAN. Frames to the router MAC of the VLAN interface
    /// are routed instead. Frames from a tunnel are never sent back to a tunnel.
    pub(crate) fn bridge(
        &self,
        vlan: Handle,
        frame: &Frame,
        origin: Origin,
    ) -> Result<Vec<Emission>, DropReason> {
        let dmac = frame.eth.destination;
        if let Some(svi) = self.db.vlan_rif(vlan)
            && let Some(rif) = self.db.rif(svi)
            && dmac == self.db.rif_mac(rif)
        {
            let packet = frame.ip().ok_or(DropReason::NotIp)?;
            return match origin {
                Origin::Port(_) => self.l3_input(svi, packet),
                // already validated as an inner packet, and never terminated twice
                Origin::Tunnel(_) => {
                    if !rif.enabled_for(&packet.header.destination()) {
                        return Err(DropReason::InterfaceDisabled);
                    }
                    self.route(rif.vrf, packet.clone())
                }
            };
        }

        let flow = frame.flow_hash();
        let from = match origin {
            Origin::Port(l2port) => Some(l2port),
            Origin::Tunnel(_) => None,
        };
        // the tag, if any, is set per egress
        let mut frame = frame.clone();
        frame.eth.vlan = None;

        if !is_flooded(dmac)
            && let Some((entry, fdb)) = self.db.fdb_lookup(vlan, dmac)
        {
            trace!("{dmac} in {vlan} hits {entry}");
            return match &fdb.dest {
                FdbDest::Port(l2port) if Some(*l2port) == from => Err(DropReason::Filtered),
                FdbDest::Port(l2port) => {
                    let egress = self.resolver.member_port(vlan, *l2port, flow)?;
                    Ok(vec![Emission::new(egress, frame)])
                }
                dest => {
                    if let Origin::Tunnel(tunnel) = origin {
                        trace!("Not sending frame from {tunnel} back to a tunnel");
                        return Err(DropReason::Filtered);
                    }
                    let tunnel = self.resolver.bridge_encap(vlan, dest, flow)?;
                    self.encapsulate(&tunnel, Payload::Bridged(frame))
                }
            };
        }

        trace!("Flooding {dmac} in {vlan}");
        Ok(self
            .resolver
            .flood(vlan, from, flow)?
            .into_iter()
            .map(|egress| Emission::new(egress, frame.clone()))
            .collect())
    }
}
