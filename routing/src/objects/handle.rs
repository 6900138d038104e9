// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Object handles

use std::fmt::Display;
use strum::{EnumIter, FromRepr, IntoStaticStr};

/// The kinds of objects an engine stores
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, FromRepr, IntoStaticStr,
)]
#[repr(u8)]
pub enum ObjectType {
    Vrf = 1,
    Rif,
    Neighbor,
    Nexthop,
    EcmpGroup,
    EcmpMember,
    Route,
    Tunnel,
    TunnelTerm,
    TunnelMapper,
    TunnelMapperEntry,
    FdbEntry,
    Lag,
    LagMember,
    Vlan,
    VlanMember,
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        write!(f, "{name}")
    }
}

/// An opaque object identifier. The object type lives in the high 16 bits,
/// a sequence number that is never reused in the low 48 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    const TYPE_SHIFT: u32 = 48;
    const SEQ_MASK: u64 = (1 << Self::TYPE_SHIFT) - 1;
    pub(crate) const MIN: Handle = Handle(0);
    pub(crate) const MAX: Handle = Handle(u64::MAX);

    pub(crate) fn new(otype: ObjectType, seq: u64) -> Self {
        Self((u64::from(otype as u8) << Self::TYPE_SHIFT) | (seq & Self::SEQ_MASK))
    }

    /// The type of object this handle refers to. `None` for values that no
    /// engine produces.
    #[must_use]
    pub fn object_type(&self) -> Option<ObjectType> {
        u8::try_from(self.0 >> Self::TYPE_SHIFT)
            .ok()
            .and_then(ObjectType::from_repr)
    }

    #[must_use]
    pub fn is(&self, otype: ObjectType) -> bool {
        self.object_type() == Some(otype)
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The lowest and highest handles of a type, for range queries
    pub(crate) fn range_of(otype: ObjectType) -> std::ops::RangeInclusive<Handle> {
        Handle::new(otype, 0)..=Handle::new(otype, Self::SEQ_MASK)
    }
}

impl From<Handle> for u64 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

/// Handles are accepted from integers so that they can cross API boundaries.
/// Values not produced by an engine simply refer to no object.
impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Handle(value)
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.object_type() {
            Some(otype) => write!(f, "{otype}#{}", self.0 & Self::SEQ_MASK),
            None => write!(f, "{:#x}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn handle_carries_type() {
        for otype in ObjectType::iter() {
            let handle = Handle::new(otype, 42);
            assert_eq!(handle.object_type(), Some(otype));
            assert!(Handle::range_of(otype).contains(&handle));
        }
        assert_eq!(Handle::from(7).object_type(), None);
        assert_eq!(Handle::new(ObjectType::Route, 3).to_string(), "Route#3");
    }

    #[test]
    fn handles_of_a_type_are_ordered_by_sequence() {
        let a = Handle::new(ObjectType::Nexthop, 10);
        let b = Handle::new(ObjectType::Nexthop, 11);
        let c = Handle::new(ObjectType::Vrf, 12);
        assert!(a < b);
        assert!(!Handle::range_of(ObjectType::Nexthop).contains(&c));
    }
}
