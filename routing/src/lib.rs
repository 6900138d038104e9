// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A tunnel routing engine: the objects of a switch routing and bridging over
//! VXLAN and IP-in-IP tunnels, and the forwarding decisions they produce.
//!
//! An [`Engine`] is configured through handle-based calls and publishes its
//! configuration with `left-right`. Any number of [`Forwarder`]s evaluate
//! frames against the published configuration concurrently.

#![allow(clippy::all)]
#![allow(clippy::pedantic)]
#![allow(clippy::similar_names)]

pub mod db;
pub mod device;
mod engine;
mod errors;
pub mod forward;
pub mod objects;
mod params;
pub mod resolve;

#[cfg(test)]
mod test;

// re-exports
pub use device::{DeviceAttribute, DeviceConfig, HeaderChecks, ValidationPolicy};
pub use engine::{Engine, TableInfo};
pub use errors::ConfigError;
pub use forward::{Emission, Forwarder, Verdict};
pub use params::{EngineParams, EngineParamsBuilder, TableSizes};
pub use resolve::Resolution;
