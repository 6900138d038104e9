// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Network types for the tunnel routing engine: addresses and identifiers,
//! a parsed-header frame model, flow hashing and drop accounting.

pub mod drop;
pub mod eth;
pub mod frame;
pub mod ip;
pub mod ipv4;
pub mod ipv6;
pub mod mtu;
pub mod transport;
pub mod vlan;
pub mod vxlan;

use tracectl::trace_target;
trace_target!("net", tracectl::LevelFilter::INFO, &["forwarding"]);
