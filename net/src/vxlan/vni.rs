// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use core::fmt::Display;
use std::fmt::Formatter;
use std::num::NonZero;

/// A [VXLAN][RFC7348] Network Identifier.
///
/// A `Vni` is a 24-bit value that identifies a VXLAN overlay network.
///
/// # Legal values
///
/// * Value `0` is reserved and can not be used.
/// * The maximum legal value is <var>2<sup>24</sup> - 1 = 16,777,215 = `0x00_FF_FF_FF`</var>.
///
/// Use [`Vni::new_checked`] or one of the `TryFrom` implementations to build a `Vni`.
/// `Option<Vni>` has the size of a `u32`.
///
/// [RFC7348]: https://datatracker.ietf.org/doc/html/rfc7348#section-5
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(try_from = "i64", into = "u32")]
#[repr(transparent)]
pub struct Vni(NonZero<u32>);

impl Display for Vni {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.get())
    }
}

impl Vni {
    /// The minimum legal [`Vni`] value (1).
    pub const MIN: u32 = 1;
    /// The maximum legal [`Vni`] value (2<sup>24</sup> - 1).
    pub const MAX: u32 = 0x00_FF_FF_FF;

    /// Create a new [`Vni`] from a `u32`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidVni`] error if the value is 0 or greater than [`Vni::MAX`].
    pub fn new_checked(vni: u32) -> Result<Vni, InvalidVni> {
        match NonZero::<u32>::new(vni) {
            None => Err(InvalidVni::ReservedZero),
            _ if vni > Vni::MAX => Err(InvalidVni::TooLarge(i64::from(vni))),
            Some(vni) => Ok(Vni(vni)),
        }
    }

    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0.get()
    }
}

/// Errors that can occur when converting an integer to a [`Vni`]
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum InvalidVni {
    #[error("Zero is not a legal Vni")]
    ReservedZero,
    #[error("Negative value {0} is not a legal Vni")]
    Negative(i64),
    #[error("The value {0} is too large to be a Vni (max is {MAX})", MAX = Vni::MAX)]
    TooLarge(i64),
}

impl From<Vni> for u32 {
    fn from(vni: Vni) -> u32 {
        vni.as_u32()
    }
}

impl TryFrom<u32> for Vni {
    type Error = InvalidVni;

    fn try_from(vni: u32) -> Result<Vni, Self::Error> {
        Vni::new_checked(vni)
    }
}

/// Configuration interfaces commonly carry VNIs as signed integers.
impl TryFrom<i64> for Vni {
    type Error = InvalidVni;

    fn try_from(vni: i64) -> Result<Vni, Self::Error> {
        if vni < 0 {
            return Err(InvalidVni::Negative(vni));
        }
        let raw = u32::try_from(vni).map_err(|_| InvalidVni::TooLarge(vni))?;
        Vni::new_checked(raw)
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use super::Vni;
    use bolero::{Driver, TypeGenerator};

    impl TypeGenerator for Vni {
        fn generate<D: Driver>(u: &mut D) -> Option<Self> {
            let raw: u32 = u.produce::<u32>()? & Vni::MAX;
            Vni::new_checked(raw.max(Vni::MIN)).ok()
        }
    }
}
