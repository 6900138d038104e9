// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ingress classification

use crate::forward::{Emission, FrameProcessor};
use crate::objects::{Handle, L2Port, PortId};
use net::drop::DropReason;
use net::frame::{Frame, IpPacket};
use tracing::trace;

/// What a received frame is processed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Context {
    /// a router interface
    L3 { rif: Handle },
    /// a VLAN, with the port or LAG the frame came from
    L2 { vlan: Handle, from: L2Port },
}

impl FrameProcessor<'_> {
    /// Find the interface or VLAN of a frame from its ingress port and tag.
    /// Ports in a LAG receive for their LAG.
    pub(crate) fn classify(&self, port: PortId, frame: &Frame) -> Result<Context, DropReason> {
        if port.0 >= self.db.device().ports {
            return Err(DropReason::InterfaceUnknown);
        }
        let from = self
            .db
            .lag_of(port)
            .map_or(L2Port::Port(port), L2Port::Lag);
        let context = match frame.eth.vlan {
            Some(vid) => {
                if let Some(rif) = self.db.subport_rif(from, vid) {
                    Context::L3 { rif }
                } else {
                    let vlan = self
                        .db
                        .vlan_by_vid(vid)
                        .ok_or(DropReason::InterfaceUnknown)?;
                    self.db
                        .vlan_membership(vlan, from)
                        .ok_or(DropReason::InterfaceUnknown)?;
                    Context::L2 { vlan, from }
                }
            }
            None => match (self.db.port_rif(from), self.db.untagged_vlan(from)) {
                (Some(rif), _) => Context::L3 { rif },
                (None, Some(vlan)) => Context::L2 { vlan, from },
                (None, None) => return Err(DropReason::InterfaceUnknown),
            },
        };
        trace!("Frame from {from} is for {context:?}");
        Ok(context)
    }

    /// A frame received on a router interface
    pub(crate) fn routed_input(&self, rif: Handle, frame: &Frame) -> Result<Vec<Emission>, DropReason> {
        let iface = self.db.rif(rif).ok_or(DropReason::InternalFailure)?;
        let dmac = frame.eth.destination;
        if dmac != self.db.rif_mac(iface) && dmac != self.db.device().src_mac {
            return Err(DropReason::MacNotForUs);
        }
        let packet = frame.ip().ok_or(DropReason::NotIp)?;
        self.l3_input(rif, packet)
    }

    /// An IP packet received on a router interface: terminated if it matches a
    /// tunnel termination, routed otherwise
    pub(crate) fn l3_input(&self, rif: Handle, packet: &IpPacket) -> Result<Vec<Emission>, DropReason> {
        let iface = self.db.rif(rif).ok_or(DropReason::InternalFailure)?;
        if !iface.enabled_for(&packet.header.destination()) {
            return Err(DropReason::InterfaceDisabled);
        }
        if let Some(emissions) = self.terminate(iface.vrf, packet)? {
            return Ok(emissions);
        }
        Self::check_header(&packet.header, self.db.device().validation.native)?;
        self.route(iface.vrf, packet.clone())
    }
}
