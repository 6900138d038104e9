// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A parsed-header model of an Ethernet frame.
//!
//! Frames are trees of headers. Payload bytes beyond the last parsed header are
//! not carried, only their length, so that frame sizes are exact.

#[cfg(any(test, feature = "testing"))]
pub mod build;
mod hash;

pub use hash::{FlowKey, hrw_weight};

use crate::eth::mac::Mac;
use crate::eth::{Eth, EthType};
use crate::ip::{IpHeader, NextHeader};
use crate::transport::{Tcp, Udp};
use crate::vxlan::{Vni, Vxlan};
use std::fmt::Display;

/// An Ethernet frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub eth: Eth,
    pub body: FrameBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameBody {
    Ip(IpPacket),
    /// A non-IP payload (e.g. ARP) of the given length
    Other { ether_type: EthType, len: u16 },
}

/// An IP packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpPacket {
    pub header: IpHeader,
    pub payload: IpPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpPayload {
    Udp(Udp, UdpPayload),
    /// A TCP header followed by payload bytes of the given length
    Tcp(Tcp, u16),
    /// An encapsulated IP packet (IPv4-in-IP or IPv6-in-IP)
    Ip(Box<IpPacket>),
    /// Payload bytes of the given length, not parsed
    Raw(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UdpPayload {
    Vxlan(Vxlan, Box<Frame>),
    Raw(u16),
}

impl Frame {
    #[must_use]
    pub fn new(eth: Eth, body: FrameBody) -> Self {
        Self { eth, body }
    }
    #[must_use]
    pub fn from_ip(eth: Eth, packet: IpPacket) -> Self {
        Self::new(eth, FrameBody::Ip(packet))
    }
    /// Total length of the frame in bytes, FCS not included
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.eth.header_len())
            + match &self.body {
                FrameBody::Ip(packet) => packet.len(),
                FrameBody::Other { len, .. } => usize::from(*len),
            }
    }
    /// Frames always have at least an Ethernet header
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
    #[must_use]
    pub fn ether_type(&self) -> EthType {
        match &self.body {
            FrameBody::Ip(packet) if packet.header.is_ipv4() => EthType::IPV4,
            FrameBody::Ip(_) => EthType::IPV6,
            FrameBody::Other { ether_type, .. } => *ether_type,
        }
    }
    #[must_use]
    pub fn ip(&self) -> Option<&IpPacket> {
        match &self.body {
            FrameBody::Ip(packet) => Some(packet),
            FrameBody::Other { .. } => None,
        }
    }
    pub fn ip_mut(&mut self) -> Option<&mut IpPacket> {
        match &mut self.body {
            FrameBody::Ip(packet) => Some(packet),
            FrameBody::Other { .. } => None,
        }
    }
    #[must_use]
    pub fn into_ip(self) -> Option<IpPacket> {
        match self.body {
            FrameBody::Ip(packet) => Some(packet),
            FrameBody::Other { .. } => None,
        }
    }
    /// Flow hash of the frame: the IP flow for IP frames, the MAC addresses otherwise
    #[must_use]
    pub fn flow_hash(&self) -> u64 {
        match &self.body {
            FrameBody::Ip(packet) => packet.flow_hash(),
            FrameBody::Other { ether_type, .. } => {
                hash::hash_l2(self.eth.source, self.eth.destination, *ether_type)
            }
        }
    }
}

impl IpPacket {
    /// Build a packet. The protocol / next-header field of the header is set
    /// to match the payload, unless the payload is opaque.
    #[must_use]
    pub fn new(mut header: IpHeader, payload: IpPayload) -> Self {
        let next_header = match &payload {
            IpPayload::Udp(..) => Some(NextHeader::UDP),
            IpPayload::Tcp(..) => Some(NextHeader::TCP),
            IpPayload::Ip(inner) if inner.header.is_ipv4() => Some(NextHeader::IPIP),
            IpPayload::Ip(_) => Some(NextHeader::IPV6),
            IpPayload::Raw(_) => None,
        };
        if let Some(nh) = next_header {
            match &mut header {
                IpHeader::V4(h) => h.protocol = nh,
                IpHeader::V6(h) => h.next_header = nh,
            }
        }
        Self { header, payload }
    }
    /// Build a VXLAN packet around an inner frame
    #[must_use]
    pub fn vxlan(outer: IpHeader, src_port: u16, dst_port: u16, vni: Vni, inner: Frame) -> Self {
        Self::new(
            outer,
            IpPayload::Udp(
                Udp::new(src_port, dst_port),
                UdpPayload::Vxlan(Vxlan::new(vni), Box::new(inner)),
            ),
        )
    }
    /// Build an IP-in-IP packet
    #[must_use]
    pub fn ipip(outer: IpHeader, inner: IpPacket) -> Self {
        Self::new(outer, IpPayload::Ip(Box::new(inner)))
    }
    /// Total length of the packet in bytes, IP header included
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.header.header_len()) + self.payload.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
    /// Transport ports, if any
    #[must_use]
    pub fn ports(&self) -> Option<(u16, u16)> {
        match &self.payload {
            IpPayload::Udp(udp, _) => Some((udp.source, udp.destination)),
            IpPayload::Tcp(tcp, _) => Some((tcp.source, tcp.destination)),
            IpPayload::Ip(_) | IpPayload::Raw(_) => None,
        }
    }
    /// The UDP and VXLAN headers and the inner frame of a VXLAN packet
    #[must_use]
    pub fn vxlan_parts(&self) -> Option<(&Udp, &Vxlan, &Frame)> {
        match &self.payload {
            IpPayload::Udp(udp, UdpPayload::Vxlan(vxlan, inner)) => Some((udp, vxlan, inner)),
            _ => None,
        }
    }
    /// The inner packet of an IP-in-IP packet
    #[must_use]
    pub fn inner_ip(&self) -> Option<&IpPacket> {
        match &self.payload {
            IpPayload::Ip(inner) => Some(inner),
            _ => None,
        }
    }
    #[must_use]
    pub fn flow_key(&self) -> FlowKey {
        FlowKey::from(self)
    }
    #[must_use]
    pub fn flow_hash(&self) -> u64 {
        self.flow_key().hash64()
    }
}

impl IpPayload {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            IpPayload::Udp(_, payload) => usize::from(Udp::HEADER_LEN) + payload.len(),
            IpPayload::Tcp(_, len) => usize::from(Tcp::HEADER_LEN) + usize::from(*len),
            IpPayload::Ip(inner) => inner.len(),
            IpPayload::Raw(len) => usize::from(*len),
        }
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UdpPayload {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            UdpPayload::Vxlan(_, inner) => usize::from(Vxlan::HEADER_LEN) + inner.len(),
            UdpPayload::Raw(len) => usize::from(*len),
        }
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tell if a destination MAC is a group (broadcast or multicast) address
#[must_use]
pub fn is_flooded(dmac: Mac) -> bool {
    dmac.is_multicast()
}

impl Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] len {}", self.eth, self.len())?;
        match &self.body {
            FrameBody::Ip(packet) => write!(f, " / {packet}"),
            FrameBody::Other { ether_type, len } => write!(f, " / ethertype {ether_type} ({len})"),
        }
    }
}

impl Display for IpPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.header)?;
        match &self.payload {
            IpPayload::Udp(udp, UdpPayload::Vxlan(vxlan, inner)) => write!(
                f,
                " / UDP {} -> {} / VXLAN vni {} / {inner}",
                udp.source, udp.destination, vxlan.vni
            ),
            IpPayload::Udp(udp, UdpPayload::Raw(len)) => {
                write!(f, " / UDP {} -> {} ({len})", udp.source, udp.destination)
            }
            IpPayload::Tcp(tcp, len) => {
                write!(f, " / TCP {} -> {} ({len})", tcp.source, tcp.destination)
            }
            IpPayload::Ip(inner) => write!(f, " / {inner}"),
            IpPayload::Raw(len) => write!(f, " ({len})"),
        }
    }
}
