// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VLAN identifiers

use core::num::NonZero;

/// A VLAN Identifier.
///
/// This type is marked `#[repr(transparent)]` so that [`Option<Vid>`] has the same
/// size as a `u16`. Only the values 1 to 4094 are legal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(transparent)]
pub struct Vid(NonZero<u16>);

/// Errors which can occur when converting a `u16` to a validated [`Vid`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[must_use]
pub enum InvalidVid {
    /// 0 is a reserved [`Vid`] meaning "no vlan"
    #[error("Zero is a reserved Vid")]
    Zero,
    #[error("4095 is a reserved Vid")]
    Reserved,
    #[error("{0} is too large to be a legal Vid (max is 2^12)")]
    TooLarge(u16),
}

impl Vid {
    /// The minimum legal VID value (1).
    pub const MIN: u16 = 1;
    /// The maximum legal VID value (2^12 - 2).
    pub const MAX: u16 = 4094;

    /// Create a new [`Vid`] from a `u16`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is 0, 4095 (reserved), or greater than [`Vid::MAX`].
    pub fn new(vid: u16) -> Result<Self, InvalidVid> {
        match vid {
            0 => Err(InvalidVid::Zero),
            4095 => Err(InvalidVid::Reserved),
            v if v > Vid::MAX => Err(InvalidVid::TooLarge(v)),
            v => NonZero::new(v).map(Vid).ok_or(InvalidVid::Zero),
        }
    }

    #[must_use]
    pub fn as_u16(self) -> u16 {
        self.0.get()
    }
}

impl From<Vid> for u16 {
    fn from(vid: Vid) -> u16 {
        vid.as_u16()
    }
}

impl TryFrom<u16> for Vid {
    type Error = InvalidVid;

    fn try_from(vid: u16) -> Result<Vid, Self::Error> {
        Vid::new(vid)
    }
}

impl core::fmt::Display for Vid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn legal_range() {
        assert_eq!(Vid::new(0), Err(InvalidVid::Zero));
        assert_eq!(Vid::new(1).map(Vid::as_u16), Ok(1));
        assert_eq!(Vid::new(4094).map(Vid::as_u16), Ok(4094));
        assert_eq!(Vid::new(4095), Err(InvalidVid::Reserved));
        assert_eq!(Vid::new(4096), Err(InvalidVid::TooLarge(4096)));
    }

    #[test]
    fn every_u16_is_checked() {
        bolero::check!().with_type::<u16>().for_each(|raw| {
            let legal = (Vid::MIN..=Vid::MAX).contains(raw);
            assert_eq!(Vid::new(*raw).is_ok(), legal);
        });
    }
}
