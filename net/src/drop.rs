// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Reasons for dropping frames and per-reason counters

use std::collections::BTreeMap;
use std::fmt::Display;
use strum::{EnumIter, IntoStaticStr};

/// Why a frame was not forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, IntoStaticStr)]
pub enum DropReason {
    /// a header does not conform (bad IHL, bad version)
    Malformed,
    /// TTL or hop limit is zero, or would become zero
    HopLimitExceeded,
    /// administratively filtered: loopback or multicast addresses, split horizon
    Filtered,
    /// the destination MAC of a frame to be routed is not a router MAC
    MacNotForUs,
    /// the ingress port does not map to any interface or VLAN
    InterfaceUnknown,
    /// the ingress interface does not route this address family
    InterfaceDisabled,
    VrfUnknown,
    NoRoute,
    /// routing explicitly requests frames to be dropped
    RouteDrop,
    /// routing information is incomplete (empty group, unresolvable underlay)
    RouteFailure,
    /// no neighbor for an IP next-hop
    MissL2Resolution,
    /// no FDB entry for a routed frame
    FdbMiss,
    /// an egress was resolved but no port can send (e.g. LAG without members)
    NoEgressPort,
    /// destined to the device itself
    ToCpu,
    /// no VNI for an encapsulation
    VniUnresolved,
    /// no decap mapping for the VNI of a terminated frame
    UnknownVni,
    /// the inner destination MAC of a terminated frame is not acceptable
    InvalidInnerDmac,
    MtuExceeded,
    NotIp,
    /// no support to handle this type of frame
    Unhandled,
    InternalFailure,
}

impl Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        write!(f, "{name}")
    }
}

/// Per-reason drop counters
#[derive(Debug, Default, Clone)]
pub struct DropStats {
    pub name: String,
    reasons: BTreeMap<DropReason, u64>,
}

impl DropStats {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            reasons: BTreeMap::new(),
        }
    }
    pub fn incr(&mut self, reason: DropReason, value: u64) {
        *self.reasons.entry(reason).or_insert(0) += value;
    }
    #[must_use]
    pub fn get_stat(&self, reason: DropReason) -> u64 {
        self.reasons.get(&reason).copied().unwrap_or(0)
    }
    #[must_use]
    pub fn total(&self) -> u64 {
        self.reasons.values().sum()
    }
    pub fn iter(&self) -> impl Iterator<Item = (DropReason, u64)> + '_ {
        self.reasons.iter().map(|(r, c)| (*r, *c))
    }
    pub fn clear(&mut self) {
        self.reasons.clear();
    }
}

impl Display for DropStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "drops ({}):", self.name)?;
        for (reason, count) in &self.reasons {
            writeln!(f, "  {reason:>20}: {count}")?;
        }
        Ok(())
    }
}
