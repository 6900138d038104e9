// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tunnel termination

use crate::forward::{Emission, FrameProcessor, Origin};
use crate::objects::{Handle, MapperKind, TtlMode, Tunnel, TunnelKind};
use net::drop::DropReason;
use net::frame::{Frame, IpPacket};
use net::vxlan::Vni;
use tracing::trace;

impl FrameProcessor<'_> {
    /// Terminate a packet received in a VRF if it matches a termination entry.
    /// Returns `None` for packets that are not terminated.
    pub(crate) fn terminate(
        &self,
        vrf: Handle,
        packet: &IpPacket,
    ) -> Result<Option<Vec<Emission>>, DropReason> {
        let device = self.db.device();
        let vxlan = packet
            .vxlan_parts()
            .filter(|(udp, _, _)| udp.destination == device.vxlan_udp_port);
        let kind = match (vxlan, packet.inner_ip()) {
            (Some(_), _) => TunnelKind::Vxlan,
            (None, Some(_)) => TunnelKind::Ipip,
            (None, None) => return Ok(None),
        };
        let (src, dst) = (packet.header.source(), packet.header.destination());
        let Some((handle, term)) = self.db.match_term(vrf, kind, dst, src) else {
            return Ok(None);
        };
        trace!("{src} -> {dst} terminates with {handle}");
        Self::check_header(&packet.header, device.validation.outer)?;
        let tunnel = self.db.tunnel(term.tunnel).ok_or(DropReason::InternalFailure)?;
        let outer_ttl = packet.header.ttl();
        let emissions = match (vxlan, packet.inner_ip()) {
            (Some((_, vxlan, inner)), _) => {
                self.decap_vxlan(term.tunnel, tunnel, vxlan.vni, inner, outer_ttl)?
            }
            (None, Some(inner)) => {
                let overlay = tunnel
                    .overlay_rif
                    .and_then(|rif| self.db.rif(rif))
                    .ok_or(DropReason::InternalFailure)?;
                self.check_inner(inner)?;
                self.route_inner(overlay.vrf, tunnel, inner.clone(), outer_ttl)?
            }
            (None, None) => return Ok(None),
        };
        Ok(Some(emissions))
    }

    fn check_inner(&self, inner: &IpPacket) -> Result<(), DropReason> {
        let policy = self.db.device().validation.inner(inner.header.is_ipv4());
        Self::check_header(&inner.header, policy)
    }

    /// The network a VNI is mapped to by the decap mappers of a tunnel, with the
    /// kind of mapping
    fn decap_network(&self, tunnel: &Tunnel, vni: Vni) -> Option<(MapperKind, Handle)> {
        tunnel.decap_mappers.iter().find_map(|m| {
            let kind = self.db.mapper(*m)?.kind;
            self.db.mapper_network(*m, vni).map(|network| (kind, network))
        })
    }

    fn decap_vxlan(
        &self,
        handle: Handle,
        tunnel: &Tunnel,
        vni: Vni,
        inner: &Frame,
        outer_ttl: u8,
    ) -> Result<Vec<Emission>, DropReason> {
        if let Some(packet) = inner.ip() {
            self.check_inner(packet)?;
        }
        match self.decap_network(tunnel, vni) {
            Some((MapperKind::VniToVrf, vrf)) => {
                let dmac = inner.eth.destination;
                let device = self.db.device();
                if !device
                    .acceptable_inner_dmacs(self.db.vrf_mac(vrf))
                    .contains(&dmac)
                {
                    trace!("Inner destination {dmac} is not a router mac of {vrf}");
                    return Err(DropReason::InvalidInnerDmac);
                }
                let packet = inner.ip().ok_or(DropReason::NotIp)?;
                self.route_inner(vrf, tunnel, packet.clone(), outer_ttl)
            }
            Some((MapperKind::VniToVlan, vlan)) => self.bridge(vlan, inner, Origin::Tunnel(handle)),
            Some(_) => Err(DropReason::InternalFailure),
            None => {
                trace!("No decap mapping for vni {vni}");
                Err(DropReason::UnknownVni)
            }
        }
    }

    /// Route a validated inner packet, after applying the decap TTL mode
    fn route_inner(
        &self,
        vrf: Handle,
        tunnel: &Tunnel,
        mut packet: IpPacket,
        outer_ttl: u8,
    ) -> Result<Vec<Emission>, DropReason> {
        if tunnel.decap_ttl_mode == TtlMode::Uniform {
            packet.header.set_ttl(outer_ttl);
        }
        self.route(vrf, packet)
    }
}
