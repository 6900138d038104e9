// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::objects::Handle;
use lpm::Prefix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Forward,
    Drop,
}

/// A route. The target is a RIF (directly attached), a nexthop or an ECMP group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub vrf: Handle,
    pub prefix: Prefix,
    pub action: RouteAction,
    pub target: Option<Handle>,
}

impl Route {
    #[must_use]
    pub fn new(vrf: Handle, prefix: Prefix, target: Handle) -> Self {
        Self {
            vrf,
            prefix,
            action: RouteAction::Forward,
            target: Some(target),
        }
    }
    #[must_use]
    pub fn blackhole(vrf: Handle, prefix: Prefix) -> Self {
        Self {
            vrf,
            prefix,
            action: RouteAction::Drop,
            target: None,
        }
    }
}
