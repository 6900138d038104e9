// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Routing and encapsulation

use crate::forward::{Emission, FrameProcessor};
use crate::objects::{Handle, TtlMode, TunnelKind};
use crate::resolve::{L2Egress, Resolution, TunnelEgress};
use net::drop::DropReason;
use net::eth::Eth;
use net::frame::{Frame, IpPacket};
use net::ip::{IpHeader, NextHeader};
use net::vxlan::Vxlan;
use tracing::trace;

/// What a tunnel carries
pub(crate) enum Payload {
    /// a routed packet, which gets a new Ethernet header if the tunnel needs one
    Routed(IpPacket),
    /// a bridged frame, carried unchanged
    Bridged(Frame),
}

impl FrameProcessor<'_> {
    /// Route a packet in a VRF. The packet has passed header validation.
    pub(crate) fn route(&self, vrf: Handle, mut packet: IpPacket) -> Result<Vec<Emission>, DropReason> {
        let ttl = packet.header.ttl();
        if ttl <= 1 {
            return Err(DropReason::HopLimitExceeded);
        }
        packet.header.set_ttl(ttl - 1);
        let flow = packet.flow_hash();
        let dst = packet.header.destination();
        match self.resolver.resolve(vrf, dst, flow)? {
            Resolution::Direct(egress) => {
                trace!("Routing to {dst} through {}", egress.rif);
                Self::emit(&egress, packet)
            }
            Resolution::Tunnel(tunnel) => {
                trace!("Routing to {dst} through {} to {}", tunnel.tunnel, tunnel.dst_ip);
                self.encapsulate(&tunnel, Payload::Routed(packet))
            }
        }
    }

    /// Send an IP packet through an adjacency. The packet must fit the MTU of
    /// the egress interface.
    pub(crate) fn emit(egress: &L2Egress, packet: IpPacket) -> Result<Vec<Emission>, DropReason> {
        if !egress.mtu.fits(packet.len()) {
            trace!(
                "Packet of {} bytes exceeds mtu {} of {}",
                packet.len(),
                egress.mtu,
                egress.rif
            );
            return Err(DropReason::MtuExceeded);
        }
        let frame = Frame::from_ip(Eth::new(egress.smac, egress.dmac), packet);
        Ok(egress
            .ports
            .iter()
            .map(|port| Emission::new(*port, frame.clone()))
            .collect())
    }

    /// Encapsulate and send through the underlay
    pub(crate) fn encapsulate(
        &self,
        tunnel: &TunnelEgress,
        payload: Payload,
    ) -> Result<Vec<Emission>, DropReason> {
        let inner_ttl = match &payload {
            Payload::Routed(packet) => Some(packet.header.ttl()),
            Payload::Bridged(frame) => frame.ip().map(|p| p.header.ttl()),
        };
        let ttl = match tunnel.ttl_mode {
            TtlMode::Pipe => tunnel.ttl,
            TtlMode::Uniform => inner_ttl.unwrap_or(tunnel.ttl),
        };
        let outer = match tunnel.kind {
            TunnelKind::Vxlan => {
                let inner = match payload {
                    Payload::Routed(packet) => {
                        let macs = tunnel.inner_macs.ok_or(DropReason::InternalFailure)?;
                        Frame::from_ip(Eth::new(macs.source, macs.destination), packet)
                    }
                    Payload::Bridged(frame) => frame,
                };
                let vni = tunnel.vni.ok_or(DropReason::VniUnresolved)?;
                let header = IpHeader::new(tunnel.src_ip, tunnel.dst_ip, NextHeader::UDP, ttl)
                    .ok_or(DropReason::InternalFailure)?;
                let src_port = Vxlan::source_port(inner.flow_hash());
                let dst_port = self.db.device().vxlan_udp_port;
                IpPacket::vxlan(header, src_port, dst_port, vni, inner)
            }
            TunnelKind::Ipip => {
                let Payload::Routed(packet) = payload else {
                    return Err(DropReason::Unhandled);
                };
                // the protocol is set from the inner packet family
                let header = IpHeader::new(tunnel.src_ip, tunnel.dst_ip, NextHeader::IPIP, ttl)
                    .ok_or(DropReason::InternalFailure)?;
                IpPacket::ipip(header, packet)
            }
        };
        Self::emit(&tunnel.underlay, outer)
    }
}
