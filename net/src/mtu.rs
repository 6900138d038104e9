// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::num::NonZero;

/// The MTU of a router interface: the largest IP packet (Ethernet header not
/// included) that can be sent through it.
#[derive(Copy, Clone, Debug, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(transparent)]
pub struct Mtu(NonZero<u32>);

/// Errors which can occur when building an [`Mtu`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MtuError {
    #[error("Invalid MTU {0}: legal values are {min} to {max}", min = Mtu::MIN_U32, max = Mtu::MAX_U32)]
    InvalidMtu(u32),
}

impl Mtu {
    pub(crate) const MIN_U32: u32 = 68; // IPv4 minimum
    pub(crate) const MAX_U32: u32 = 65535;
    pub(crate) const DEFAULT_U32: u32 = 1500;

    pub const MIN: Mtu = Mtu(NonZero::new(Self::MIN_U32).unwrap());
    pub const MAX: Mtu = Mtu(NonZero::new(Self::MAX_U32).unwrap());
    /// The typical MTU for an ethernet interface
    pub const DEFAULT: Mtu = Mtu(NonZero::new(Self::DEFAULT_U32).unwrap());

    #[must_use]
    pub fn to_u32(&self) -> u32 {
        self.0.get()
    }

    #[must_use]
    pub fn to_u16(&self) -> u16 {
        #[allow(clippy::cast_possible_truncation)] // known to be safe by bounds on type
        {
            self.to_u32() as u16
        }
    }

    /// Tell if an IP packet of the given length fits
    #[must_use]
    pub fn fits(&self, ip_len: usize) -> bool {
        u32::try_from(ip_len).is_ok_and(|len| len <= self.to_u32())
    }
}

impl Default for Mtu {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Mtu {
    type Error = MtuError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if !(Self::MIN_U32..=Self::MAX_U32).contains(&value) {
            return Err(MtuError::InvalidMtu(value));
        }
        NonZero::new(value).map(Mtu).ok_or(MtuError::InvalidMtu(value))
    }
}

impl From<Mtu> for u32 {
    fn from(value: Mtu) -> Self {
        value.0.get()
    }
}

impl Display for Mtu {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.get())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mtu_bounds() {
        assert_eq!(Mtu::try_from(67), Err(MtuError::InvalidMtu(67)));
        assert_eq!(Mtu::try_from(68), Ok(Mtu::MIN));
        assert_eq!(Mtu::try_from(65535), Ok(Mtu::MAX));
        assert_eq!(Mtu::try_from(65536), Err(MtuError::InvalidMtu(65536)));
        assert_eq!(Mtu::default().to_u16(), 1500);
    }

    #[test]
    fn fits_is_inclusive() {
        let mtu = Mtu::try_from(200).unwrap();
        assert!(mtu.fits(199));
        assert!(mtu.fits(200));
        assert!(!mtu.fits(201));
        assert!(Mtu::MAX.fits(65535));
        assert!(!Mtu::MAX.fits(65536));
    }

    #[test]
    fn mtu_serde() {
        let mtu: Mtu = serde_yaml_ng::from_str("9000").unwrap();
        assert_eq!(mtu.to_u32(), 9000);
        assert!(serde_yaml_ng::from_str::<Mtu>("10").is_err());
    }
}
