// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The configuration side of the engine. An [`Engine`] owns the write half of
//! the object database: every configuration call is validated against the
//! latest published database and, if legal, published as a single change.

mod add;
mod validate;

use crate::db::{DbChange, ObjectDb};
use crate::device::{DeviceAttribute, DeviceConfig};
use crate::errors::ConfigError;
use crate::forward::Forwarder;
use crate::objects::{Attribute, Handle, Object, ObjectType, Vrf};
use crate::params::EngineParams;
use left_right::{ReadGuard, ReadHandle, ReadHandleFactory, WriteHandle};
use std::fmt::Display;
#[allow(unused)]
use tracing::{debug, info, warn};

use tracectl::trace_target;
trace_target!("engine", tracectl::LevelFilter::INFO, &["routing"]);

/// Capacity and usage of an object table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInfo {
    pub size: usize,
    pub usage: usize,
}

impl Display for TableInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.usage, self.size)
    }
}

pub struct Engine {
    params: EngineParams,
    next_seq: u64,
    write: WriteHandle<ObjectDb, DbChange>,
    default_vrf: Handle,
}

impl Engine {
    /// Create an engine. The engine comes with a default VRF that can't be removed.
    #[must_use]
    pub fn new(params: EngineParams) -> Self {
        let mut db = ObjectDb::new(DeviceConfig::new(&params));
        let default_vrf = Handle::new(ObjectType::Vrf, 0);
        db.apply(&DbChange::Insert(default_vrf, Object::Vrf(Vrf::default())));
        let (write, _) = left_right::new_from_empty::<ObjectDb, DbChange>(db);
        info!("Created engine {} with {} ports", params.name, params.ports);
        Self {
            params,
            next_seq: 1,
            write,
            default_vrf,
        }
    }

    #[must_use]
    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    #[must_use]
    pub fn default_vrf(&self) -> Handle {
        self.default_vrf
    }

    fn db(&self) -> Result<ReadGuard<'_, ObjectDb>, ConfigError> {
        self.write
            .enter()
            .ok_or(ConfigError::Internal("object database is not accessible"))
    }

    fn commit(&mut self, change: DbChange) {
        self.write.append(change);
        self.write.publish();
    }

    /// Validate and store a new object
    pub(crate) fn create(&mut self, object: Object) -> Result<Handle, ConfigError> {
        let otype = object.object_type();
        {
            let db = self.db()?;
            let size = self.params.tables.size_of(otype);
            if db.count(otype) >= size {
                warn!("Can't create {otype}: table is full ({size} entries)");
                return Err(ConfigError::TableFull(otype));
            }
            validate::check_object(&db, &object)
                .and_then(|()| validate::check_unique(&db, &object))
                .inspect_err(|e| warn!("Rejected {otype}: {e}"))?;
        }
        let handle = Handle::new(otype, self.next_seq);
        self.next_seq += 1;
        debug!("Created {handle}: {object:?}");
        self.commit(DbChange::Insert(handle, object));
        Ok(handle)
    }

    /// Change an attribute of an existing object. Objects depending on it see
    /// the change as soon as this returns.
    ///
    /// # Errors
    ///
    /// Fails if the object does not exist or if the attribute does not apply to it
    /// or is illegal. The object is left unchanged on failure.
    pub fn set_attribute(&mut self, handle: Handle, attr: Attribute) -> Result<(), ConfigError> {
        let object = {
            let db = self.db()?;
            let current = db.get(handle).ok_or(ConfigError::NoSuchObject(handle))?;
            let object = current.with_attribute(&attr)?;
            validate::check_object(&db, &object)
                .inspect_err(|e| warn!("Rejected {attr:?} on {handle}: {e}"))?;
            object
        };
        debug!("Set {attr:?} on {handle}");
        self.commit(DbChange::Replace(handle, object));
        Ok(())
    }

    /// Change a device attribute
    ///
    /// # Errors
    ///
    /// Fails if the value is illegal.
    pub fn set_device_attribute(&mut self, attr: DeviceAttribute) -> Result<(), ConfigError> {
        let device = self.db()?.device().with(attr.clone())?;
        debug!("Set device attribute {attr:?}");
        self.commit(DbChange::Device(device));
        Ok(())
    }

    /// Remove an object
    ///
    /// # Errors
    ///
    /// Fails if the object does not exist, is referenced by other objects or is
    /// the default VRF.
    pub fn remove(&mut self, handle: Handle) -> Result<(), ConfigError> {
        if handle == self.default_vrf {
            return Err(ConfigError::Forbidden("the default vrf can not be removed"));
        }
        {
            let db = self.db()?;
            if db.get(handle).is_none() {
                return Err(ConfigError::NoSuchObject(handle));
            }
            let refs = db.refcount(handle);
            if refs > 0 {
                warn!("Can't remove {handle}: it has {refs} references");
                return Err(ConfigError::HandleInUse(handle));
            }
        }
        debug!("Removed {handle}");
        self.commit(DbChange::Remove(handle));
        Ok(())
    }

    /// Get a copy of an object
    ///
    /// # Errors
    ///
    /// Fails if there is no such object.
    pub fn get(&self, handle: Handle) -> Result<Object, ConfigError> {
        self.db()?
            .get(handle)
            .cloned()
            .ok_or(ConfigError::NoSuchObject(handle))
    }

    /// The current device configuration
    ///
    /// # Errors
    ///
    /// Fails if the database can't be accessed.
    pub fn device(&self) -> Result<DeviceConfig, ConfigError> {
        Ok(self.db()?.device().clone())
    }

    /// Handles of all the objects of a type, in creation order
    #[must_use]
    pub fn object_get_all_handles(&self, otype: ObjectType) -> Vec<Handle> {
        self.db()
            .map(|db| db.handles(otype))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn table_info_get(&self, otype: ObjectType) -> TableInfo {
        TableInfo {
            size: self.params.tables.size_of(otype),
            usage: self.db().map(|db| db.count(otype)).unwrap_or_default(),
        }
    }

    /// A read handle on the object database
    #[must_use]
    pub fn reader(&self) -> ReadHandle<ObjectDb> {
        self.write.factory().handle()
    }

    /// A factory of read handles, which can be shared between threads
    #[must_use]
    pub fn reader_factory(&self) -> ReadHandleFactory<ObjectDb> {
        self.write.factory()
    }

    /// A forwarder evaluating frames against the configuration of this engine
    #[must_use]
    pub fn forwarder(&self, name: &str) -> Forwarder {
        Forwarder::new(name, self.reader())
    }
}
