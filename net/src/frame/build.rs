// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Frame builders for tests. Sizes follow the usual packet-test conventions:
//! `pktlen` is the full frame length, FCS excluded.

use crate::eth::Eth;
use crate::eth::mac::Mac;
use crate::frame::{Frame, IpPacket, IpPayload, UdpPayload};
use crate::ip::{IpHeader, NextHeader};
use crate::ipv4::Ipv4;
use crate::ipv6::Ipv6;
use crate::transport::{Tcp, Udp};
use crate::vlan::Vid;
use crate::vxlan::{VXLAN_UDP_PORT, Vni};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Transport of a test frame
#[derive(Debug, Clone, Copy)]
pub enum L4 {
    Tcp { sport: u16, dport: u16 },
    Udp { sport: u16, dport: u16 },
    None,
}

/// A simple IP frame
#[derive(Debug, Clone)]
pub struct IpFrameParams {
    pub pktlen: u16,
    pub eth_dst: Mac,
    pub eth_src: Mac,
    pub vlan: Option<Vid>,
    pub src: IpAddr,
    pub dst: IpAddr,
    pub ttl: u8,
    pub l4: L4,
    /// overrides the IPv4 IHL
    pub ihl: Option<u8>,
    /// overrides the version field
    pub version: Option<u8>,
}

impl Default for IpFrameParams {
    fn default() -> Self {
        Self {
            pktlen: 100,
            eth_dst: Mac([0x00, 0x01, 0x02, 0x03, 0x04, 0x05]),
            eth_src: Mac([0x00, 0x06, 0x07, 0x08, 0x09, 0x0a]),
            vlan: None,
            src: Ipv4Addr::new(192, 168, 0, 1).into(),
            dst: Ipv4Addr::new(192, 168, 0, 2).into(),
            ttl: 64,
            l4: L4::Tcp {
                sport: 1234,
                dport: 80,
            },
            ihl: None,
            version: None,
        }
    }
}

impl IpFrameParams {
    /// Defaults for an IPv6 frame
    #[must_use]
    pub fn v6() -> Self {
        Self {
            src: Ipv6Addr::new(0x2000, 0, 0, 0, 0, 0, 0, 1).into(),
            dst: Ipv6Addr::new(0x2000, 0, 0, 0, 0, 0, 0, 2).into(),
            ..Default::default()
        }
    }

    /// Build the IP packet of the frame, with a payload sized so that the frame is `pktlen` long
    #[must_use]
    pub fn build_packet(&self) -> IpPacket {
        let mut header = ip_header(self.src, self.dst, NextHeader(0), self.ttl);
        match &mut header {
            IpHeader::V4(h) => {
                h.ihl = self.ihl.unwrap_or(h.ihl);
                h.version = self.version.unwrap_or(h.version);
            }
            IpHeader::V6(h) => h.version = self.version.unwrap_or(h.version),
        }
        let eth_len = Eth::new(self.eth_src, self.eth_dst)
            .with_vlan(self.vlan)
            .header_len();
        let l3_len = self
            .pktlen
            .saturating_sub(eth_len)
            .saturating_sub(header.header_len());
        let payload = match self.l4 {
            L4::Tcp { sport, dport } => {
                IpPayload::Tcp(Tcp::new(sport, dport), l3_len.saturating_sub(Tcp::HEADER_LEN))
            }
            L4::Udp { sport, dport } => IpPayload::Udp(
                Udp::new(sport, dport),
                UdpPayload::Raw(l3_len.saturating_sub(Udp::HEADER_LEN)),
            ),
            L4::None => IpPayload::Raw(l3_len),
        };
        IpPacket::new(header, payload)
    }

    #[must_use]
    pub fn build(&self) -> Frame {
        let eth = Eth::new(self.eth_src, self.eth_dst).with_vlan(self.vlan);
        Frame::from_ip(eth, self.build_packet())
    }
}

/// Outer headers of a tunnel frame
#[derive(Debug, Clone)]
pub struct OuterParams {
    pub eth_dst: Mac,
    pub eth_src: Mac,
    pub vlan: Option<Vid>,
    pub src: IpAddr,
    pub dst: IpAddr,
    pub ttl: u8,
}

impl Default for OuterParams {
    fn default() -> Self {
        Self {
            eth_dst: Mac([0x00, 0x01, 0x02, 0x03, 0x04, 0x05]),
            eth_src: Mac([0x00, 0x06, 0x07, 0x08, 0x09, 0x0a]),
            vlan: None,
            src: Ipv4Addr::new(192, 168, 0, 1).into(),
            dst: Ipv4Addr::new(192, 168, 0, 2).into(),
            ttl: 64,
        }
    }
}

impl OuterParams {
    fn eth(&self) -> Eth {
        Eth::new(self.eth_src, self.eth_dst).with_vlan(self.vlan)
    }

    /// A VXLAN frame around `inner`
    #[must_use]
    pub fn vxlan(&self, udp_sport: u16, vni: Vni, inner: Frame) -> Frame {
        let header = ip_header(self.src, self.dst, NextHeader::UDP, self.ttl);
        let packet = IpPacket::vxlan(header, udp_sport, VXLAN_UDP_PORT, vni, inner);
        Frame::from_ip(self.eth(), packet)
    }

    /// An IP-in-IP frame around `inner`
    #[must_use]
    pub fn ipip(&self, inner: IpPacket) -> Frame {
        let header = ip_header(self.src, self.dst, NextHeader::IPIP, self.ttl);
        Frame::from_ip(self.eth(), IpPacket::ipip(header, inner))
    }
}

/// An IP header for a pair of addresses. Mixed families yield an IPv6 header
/// with the IPv4 address mapped.
#[must_use]
pub fn ip_header(src: IpAddr, dst: IpAddr, next_header: NextHeader, ttl: u8) -> IpHeader {
    match (src, dst) {
        (IpAddr::V4(s), IpAddr::V4(d)) => IpHeader::V4(Ipv4::new(s, d, next_header, ttl)),
        (s, d) => IpHeader::V6(Ipv6::new(to_v6(s), to_v6(d), next_header, ttl)),
    }
}

fn to_v6(addr: IpAddr) -> Ipv6Addr {
    match addr {
        IpAddr::V4(a) => a.to_ipv6_mapped(),
        IpAddr::V6(a) => a,
    }
}
