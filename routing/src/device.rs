// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Device-wide (switch) configuration

use crate::errors::ConfigError;
use crate::params::EngineParams;
use bitflags::bitflags;
use net::eth::mac::Mac;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

bitflags! {
    /// Sanity checks applied to an IP header
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct HeaderChecks: u8 {
        /// IPv4 IHL must be at least 5
        const IHL = 0b0000_0001;
        /// TTL / hop limit must not be zero
        const TTL = 0b0000_0010;
        /// the version field must match the header type
        const VERSION = 0b0000_0100;
        const SRC_MULTICAST = 0b0000_1000;
        const SRC_LOOPBACK = 0b0001_0000;
        const DST_LOOPBACK = 0b0010_0000;
    }
}

/// The checks applied to each kind of IP header the device processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationPolicy {
    /// packets routed as received
    pub native: HeaderChecks,
    /// outer header of terminated tunnel packets
    pub outer: HeaderChecks,
    /// inner IPv4 header of terminated tunnel packets
    pub inner_v4: HeaderChecks,
    /// inner IPv6 header of terminated tunnel packets
    pub inner_v6: HeaderChecks,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            native: HeaderChecks::all(),
            outer: HeaderChecks::all().difference(HeaderChecks::SRC_LOOPBACK),
            inner_v4: HeaderChecks::IHL
                | HeaderChecks::TTL
                | HeaderChecks::VERSION
                | HeaderChecks::DST_LOOPBACK,
            inner_v6: HeaderChecks::TTL
                | HeaderChecks::VERSION
                | HeaderChecks::DST_LOOPBACK
                | HeaderChecks::SRC_MULTICAST,
        }
    }
}

impl ValidationPolicy {
    /// The checks for an inner header of the given family
    #[must_use]
    pub fn inner(&self, ipv4: bool) -> HeaderChecks {
        if ipv4 { self.inner_v4 } else { self.inner_v6 }
    }
}

/// Switch attributes. These are not objects and have no handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Number of front-panel ports
    pub ports: u16,
    /// Router MAC of the device, used where no RIF or VRF MAC is set
    pub src_mac: Mac,
    /// MAC accepted as inner destination of terminated VXLAN frames, and used as
    /// the inner destination of routed VXLAN frames when the nexthop has none
    pub vxlan_default_router_mac: Option<Mac>,
    pub vxlan_udp_port: u16,
    pub validation: ValidationPolicy,
    /// Flood routed frames to all VLAN members when the FDB has no entry for the neighbor
    pub flood_on_routed_fdb_miss: bool,
}

impl DeviceConfig {
    #[must_use]
    pub fn new(params: &EngineParams) -> Self {
        Self {
            ports: params.ports,
            src_mac: params.src_mac,
            vxlan_default_router_mac: None,
            vxlan_udp_port: params.vxlan_udp_port,
            validation: ValidationPolicy::default(),
            flood_on_routed_fdb_miss: false,
        }
    }

    /// Apply an attribute to a copy of this configuration
    ///
    /// # Errors
    ///
    /// Fails if the attribute value is not legal.
    pub fn with(&self, attr: DeviceAttribute) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        match attr {
            DeviceAttribute::SrcMac(mac) => {
                if mac.is_zero() || mac.is_multicast() {
                    return Err(ConfigError::InvalidAttribute(format!(
                        "{mac} can not be a router mac"
                    )));
                }
                config.src_mac = mac;
            }
            DeviceAttribute::VxlanDefaultRouterMac(mac) => {
                if mac.is_some_and(|m| m.is_zero() || m.is_multicast()) {
                    return Err(ConfigError::InvalidAttribute(
                        "vxlan default router mac must be unicast".to_string(),
                    ));
                }
                config.vxlan_default_router_mac = mac;
            }
            DeviceAttribute::VxlanUdpPort(0) => {
                return Err(ConfigError::InvalidAttribute(
                    "vxlan udp port can not be 0".to_string(),
                ));
            }
            DeviceAttribute::VxlanUdpPort(port) => config.vxlan_udp_port = port,
            DeviceAttribute::ValidationPolicy(policy) => config.validation = policy,
            DeviceAttribute::FloodOnRoutedFdbMiss(flood) => config.flood_on_routed_fdb_miss = flood,
        }
        Ok(config)
    }

    /// The MACs accepted as inner destination of VXLAN frames terminated into a VRF,
    /// in order of preference
    #[must_use]
    pub fn acceptable_inner_dmacs(&self, vrf_mac: Mac) -> Vec<Mac> {
        let mut macs: Vec<Mac> = self.vxlan_default_router_mac.into_iter().collect();
        macs.push(self.src_mac);
        macs.push(vrf_mac);
        macs
    }
}

/// A settable device attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAttribute {
    SrcMac(Mac),
    VxlanDefaultRouterMac(Option<Mac>),
    VxlanUdpPort(u16),
    ValidationPolicy(ValidationPolicy),
    FloodOnRoutedFdbMiss(bool),
}

impl Display for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Device")?;
        writeln!(f, "  ports        : {}", self.ports)?;
        writeln!(f, "  src mac      : {}", self.src_mac)?;
        if let Some(mac) = self.vxlan_default_router_mac {
            writeln!(f, "  vxlan rmac   : {mac}")?;
        }
        writeln!(f, "  vxlan port   : {}", self.vxlan_udp_port)?;
        writeln!(f, "  native checks: {:?}", self.validation.native)?;
        writeln!(f, "  outer checks : {:?}", self.validation.outer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_policy() {
        let policy = ValidationPolicy::default();
        assert!(policy.native.contains(HeaderChecks::SRC_LOOPBACK));
        assert!(!policy.outer.contains(HeaderChecks::SRC_LOOPBACK));
        assert!(policy.outer.contains(HeaderChecks::SRC_MULTICAST));
        assert!(!policy.inner(true).contains(HeaderChecks::SRC_MULTICAST));
        assert!(policy.inner(false).contains(HeaderChecks::SRC_MULTICAST));
        assert!(!policy.inner(false).contains(HeaderChecks::IHL));
    }

    #[test]
    fn policy_from_yaml() {
        let yaml = "inner_v4: IHL | TTL\n";
        let policy: ValidationPolicy = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(policy.inner_v4, HeaderChecks::IHL | HeaderChecks::TTL);
        assert_eq!(policy.native, HeaderChecks::all());
    }

    #[test]
    fn device_attributes() {
        let device = DeviceConfig::new(&EngineParams::default());
        assert_eq!(device.vxlan_udp_port, 4789);
        assert!(device.with(DeviceAttribute::VxlanUdpPort(0)).is_err());
        assert!(device.with(DeviceAttribute::SrcMac(Mac::BROADCAST)).is_err());
        let rmac = Mac([0, 0, 0, 0, 0, 0x11]);
        let device = device
            .with(DeviceAttribute::VxlanDefaultRouterMac(Some(rmac)))
            .unwrap();
        let vrf_mac = Mac([0, 0, 0, 0, 0, 0x22]);
        assert_eq!(
            device.acceptable_inner_dmacs(vrf_mac),
            vec![rmac, device.src_mac, vrf_mac]
        );
    }
}
