// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A library to implement Longest Prefix Match (LPM) functions.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::similar_names)]

pub mod prefix;
pub mod trie;

pub use prefix::{Prefix, PrefixError};
pub use trie::LpmTable;

use tracectl::trace_target;
trace_target!("lpm", tracectl::LevelFilter::INFO, &["routing"]);
