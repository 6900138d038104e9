// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The forwarding side of the engine. A [`Forwarder`] evaluates frames against
//! the latest configuration published by its [`Engine`](crate::Engine), without
//! ever blocking the engine.

mod bridge;
mod decap;
mod encap;
mod ingress;
mod validate;

use crate::db::ObjectDb;
use crate::objects::{Handle, L2Port, PortId};
use crate::resolve::{EgressPort, Resolution, Resolver};
use left_right::ReadHandle;
use net::drop::{DropReason, DropStats};
use net::frame::Frame;
use std::fmt::Display;
use std::net::IpAddr;
#[allow(unused)]
use tracing::{debug, trace};

use tracectl::trace_target;
trace_target!("forwarder", tracectl::LevelFilter::INFO, &["routing"]);

/// A frame to be sent on a port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub port: PortId,
    pub frame: Frame,
}

impl Emission {
    /// Send a frame to an egress, tagging it as required
    pub(crate) fn new(egress: EgressPort, mut frame: Frame) -> Self {
        frame.eth.vlan = egress.vlan;
        Self {
            port: egress.port,
            frame,
        }
    }
}

/// What to do with a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Forward(Vec<Emission>),
    Drop(DropReason),
}

impl Verdict {
    #[must_use]
    pub fn is_drop(&self) -> bool {
        matches!(self, Verdict::Drop(_))
    }
    /// The frames to emit, none if dropped
    #[must_use]
    pub fn emissions(&self) -> &[Emission] {
        match self {
            Verdict::Forward(emissions) => emissions,
            Verdict::Drop(_) => &[],
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Drop(reason) => write!(f, "drop ({reason})"),
            Verdict::Forward(emissions) => {
                write!(f, "forward")?;
                for e in emissions {
                    write!(f, "\n  {}: {}", e.port, e.frame)?;
                }
                Ok(())
            }
        }
    }
}

/// Where a frame being processed came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Port(L2Port),
    /// decapsulated from a tunnel
    Tunnel(Handle),
}

/// Per-frame processing against a view of the database
pub(crate) struct FrameProcessor<'a> {
    db: &'a ObjectDb,
    resolver: Resolver<'a>,
}

impl<'a> FrameProcessor<'a> {
    pub(crate) fn new(db: &'a ObjectDb) -> Self {
        Self {
            db,
            resolver: Resolver::new(db),
        }
    }

    pub(crate) fn process(&self, port: PortId, frame: &Frame) -> Result<Vec<Emission>, DropReason> {
        match self.classify(port, frame)? {
            ingress::Context::L3 { rif } => self.routed_input(rif, frame),
            ingress::Context::L2 { vlan, from } => self.bridge(vlan, frame, Origin::Port(from)),
        }
    }
}

/// Evaluates frames. Each forwarder holds its own read handle and drop counters.
pub struct Forwarder {
    name: String,
    reader: ReadHandle<ObjectDb>,
    stats: DropStats,
}

impl Forwarder {
    #[must_use]
    pub fn new(name: &str, reader: ReadHandle<ObjectDb>) -> Self {
        Self {
            name: name.to_owned(),
            reader,
            stats: DropStats::new(name),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn stats(&self) -> &DropStats {
        &self.stats
    }

    /// Decide what to do with a frame received on a port
    pub fn process(&mut self, port: PortId, frame: &Frame) -> Verdict {
        trace!("{}: {port} received {frame}", self.name);
        let result = match self.reader.enter() {
            Some(db) => FrameProcessor::new(&db).process(port, frame),
            None => Err(DropReason::InternalFailure),
        };
        match result {
            Ok(emissions) => Verdict::Forward(emissions),
            Err(reason) => {
                debug!("{}: dropped frame from {port}: {reason}", self.name);
                self.stats.incr(reason, 1);
                Verdict::Drop(reason)
            }
        }
    }

    /// Resolve a destination in a VRF for a flow hash
    ///
    /// # Errors
    ///
    /// Returns the reason why traffic to the destination would be dropped.
    pub fn resolve(&self, vrf: Handle, dst: IpAddr, flow: u64) -> Result<Resolution, DropReason> {
        match self.reader.enter() {
            Some(db) => Resolver::new(&db).resolve(vrf, dst, flow),
            None => Err(DropReason::InternalFailure),
        }
    }
}
