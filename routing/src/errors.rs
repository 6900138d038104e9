// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The error results used by this library.

use crate::objects::{Handle, ObjectType};
use lpm::PrefixError;
use net::mtu::MtuError;
use net::vlan::InvalidVid;
use net::vxlan::InvalidVni;
use thiserror::Error;

/// Errors returned by configuration calls. A call that fails leaves the
/// configuration untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("Object {0} is referenced by other objects")]
    HandleInUse(Handle),

    #[error("Conflicting binding: {0}")]
    ConflictingBinding(String),

    #[error("No object with handle {0}")]
    NoSuchObject(Handle),

    #[error("Object already exists: {0}")]
    ObjectExists(String),

    #[error("Table for {0} objects is full")]
    TableFull(ObjectType),

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Internal error: {0}")]
    Internal(&'static str),
}

impl From<InvalidVni> for ConfigError {
    fn from(e: InvalidVni) -> Self {
        ConfigError::InvalidAttribute(e.to_string())
    }
}
impl From<MtuError> for ConfigError {
    fn from(e: MtuError) -> Self {
        ConfigError::InvalidAttribute(e.to_string())
    }
}
impl From<InvalidVid> for ConfigError {
    fn from(e: InvalidVid) -> Self {
        ConfigError::InvalidAttribute(e.to_string())
    }
}
impl From<PrefixError> for ConfigError {
    fn from(e: PrefixError) -> Self {
        ConfigError::InvalidAttribute(e.to_string())
    }
}
