// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Engine parameters

use crate::objects::ObjectType;
use derive_builder::Builder;
use net::eth::mac::Mac;
use net::vxlan::VXLAN_UDP_PORT;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Capacity of each object table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableSizes {
    pub vrfs: usize,
    pub rifs: usize,
    pub neighbors: usize,
    pub nexthops: usize,
    pub ecmp_groups: usize,
    pub ecmp_members: usize,
    pub routes: usize,
    pub tunnels: usize,
    pub tunnel_terms: usize,
    pub tunnel_mappers: usize,
    pub tunnel_mapper_entries: usize,
    pub fdb_entries: usize,
    pub lags: usize,
    pub lag_members: usize,
    pub vlans: usize,
    pub vlan_members: usize,
}

impl Default for TableSizes {
    fn default() -> Self {
        Self {
            vrfs: 64,
            rifs: 1024,
            neighbors: 8192,
            nexthops: 8192,
            ecmp_groups: 512,
            ecmp_members: 4096,
            routes: 65536,
            tunnels: 128,
            tunnel_terms: 512,
            tunnel_mappers: 256,
            tunnel_mapper_entries: 4096,
            fdb_entries: 16384,
            lags: 64,
            lag_members: 256,
            vlans: 4094,
            vlan_members: 8192,
        }
    }
}

impl TableSizes {
    /// The capacity of the table for the given object type
    #[must_use]
    pub fn size_of(&self, otype: ObjectType) -> usize {
        match otype {
            ObjectType::Vrf => self.vrfs,
            ObjectType::Rif => self.rifs,
            ObjectType::Neighbor => self.neighbors,
            ObjectType::Nexthop => self.nexthops,
            ObjectType::EcmpGroup => self.ecmp_groups,
            ObjectType::EcmpMember => self.ecmp_members,
            ObjectType::Route => self.routes,
            ObjectType::Tunnel => self.tunnels,
            ObjectType::TunnelTerm => self.tunnel_terms,
            ObjectType::TunnelMapper => self.tunnel_mappers,
            ObjectType::TunnelMapperEntry => self.tunnel_mapper_entries,
            ObjectType::FdbEntry => self.fdb_entries,
            ObjectType::Lag => self.lags,
            ObjectType::LagMember => self.lag_members,
            ObjectType::Vlan => self.vlans,
            ObjectType::VlanMember => self.vlan_members,
        }
    }
}

/// Struct to configure an engine. N.B we derive a builder type `EngineParamsBuilder`
/// and provide defaults for each field. Missing fields also take their default
/// when deserializing.
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineParams {
    #[builder(setter(into), default = "engine".to_string())]
    pub name: String,

    /// Number of front-panel ports. Ports are numbered from 0.
    #[builder(default = 32)]
    pub ports: u16,

    #[builder(default)]
    pub tables: TableSizes,

    /// Initial router MAC of the device
    #[builder(default = Mac([0x00, 0x77, 0x66, 0x55, 0x44, 0x33]))]
    pub src_mac: Mac,

    /// Initial UDP destination port for VXLAN
    #[builder(default = VXLAN_UDP_PORT)]
    pub vxlan_udp_port: u16,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            name: "engine".to_string(),
            ports: 32,
            tables: TableSizes::default(),
            src_mac: Mac([0x00, 0x77, 0x66, 0x55, 0x44, 0x33]),
            vxlan_udp_port: VXLAN_UDP_PORT,
        }
    }
}

impl Display for EngineParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        writeln!(f, "Engine parameters")?;
        writeln!(f, "  name      : {}", self.name)?;
        writeln!(f, "  ports     : {}", self.ports)?;
        writeln!(f, "  src mac   : {}", self.src_mac)?;
        writeln!(f, "  vxlan port: {}", self.vxlan_udp_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_defaults_match_default() {
        let built = EngineParamsBuilder::default().build().unwrap();
        assert_eq!(built, EngineParams::default());
        let built = EngineParamsBuilder::default()
            .name("leaf-1")
            .ports(8)
            .build()
            .unwrap();
        assert_eq!(built.name, "leaf-1");
        assert_eq!(built.ports, 8);
        assert_eq!(built.vxlan_udp_port, 4789);
    }

    #[test]
    fn params_from_yaml() {
        let yaml = r"
name: spine
ports: 4
src_mac: 00:aa:bb:cc:dd:ee
tables:
  routes: 10
";
        let params: EngineParams = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(params.name, "spine");
        assert_eq!(params.ports, 4);
        assert_eq!(params.src_mac, Mac([0x00, 0xaa, 0xbb, 0xcc, 0xdd, 0xee]));
        assert_eq!(params.tables.size_of(ObjectType::Route), 10);
        assert_eq!(params.tables.vrfs, TableSizes::default().vrfs);

        assert!(serde_yaml_ng::from_str::<EngineParams>("bogus: 1").is_err());
        assert!(serde_yaml_ng::from_str::<EngineParams>("src_mac: 1:2:3").is_err());
    }
}
