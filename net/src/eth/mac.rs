// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mac address type and logic.

use arrayvec::ArrayVec;
use std::fmt::Display;
use std::str::FromStr;

/// A [MAC Address] type.
///
/// `Mac` is a transparent wrapper around `[u8; 6]`. It serializes as the usual
/// colon-separated hex string.
///
/// [MAC Address]: https://en.wikipedia.org/wiki/MAC_address
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Mac(pub [u8; 6]);

impl From<[u8; 6]> for Mac {
    fn from(value: [u8; 6]) -> Self {
        Mac(value)
    }
}

impl From<Mac> for [u8; 6] {
    fn from(value: Mac) -> Self {
        value.0
    }
}

impl AsRef<[u8; 6]> for Mac {
    fn as_ref(&self) -> &[u8; 6] {
        &self.0
    }
}

/// Errors which can occur while converting a string to a [`Mac`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacFromStringError {
    /// Invalid string representation of mac address
    #[error("invalid string representation of mac address: {0}")]
    Invalid(String),
}

impl TryFrom<&str> for Mac {
    type Error = MacFromStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        const MAX_OCTETS: usize = 6;
        let invalid = || MacFromStringError::Invalid(value.to_string());
        let octets = value
            .split(':')
            .try_fold(ArrayVec::<u8, MAX_OCTETS>::new(), |mut acc, octet| {
                if octet.len() != 2 || !octet.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(invalid());
                }
                let parsed = u8::from_str_radix(octet, 16).map_err(|_| invalid())?;
                acc.try_push(parsed).map_err(|_| invalid())?;
                Ok(acc)
            })?;
        octets.into_inner().map(Mac).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Mac {
    type Error = MacFromStringError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Mac::try_from(value.as_str())
    }
}

impl FromStr for Mac {
    type Err = MacFromStringError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mac::try_from(s)
    }
}

impl From<Mac> for String {
    fn from(value: Mac) -> Self {
        value.to_string()
    }
}

impl Mac {
    /// The broadcast `Mac`
    pub const BROADCAST: Mac = Mac([u8::MAX; 6]);
    /// The zero `Mac`.
    pub const ZERO: Mac = Mac([0; 6]);

    /// Returns true iff the binary representation of the [`Mac`] is exclusively ones.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self == &Mac::BROADCAST
    }

    /// Returns true iff the least significant bit of the first octet is one.
    /// Broadcast is a multicast address.
    #[must_use]
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }

    #[must_use]
    pub fn is_unicast(&self) -> bool {
        !self.is_multicast()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self == &Mac::ZERO
    }
}

impl Display for Mac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use super::Mac;
    use bolero::{Driver, TypeGenerator};

    impl TypeGenerator for Mac {
        fn generate<D: Driver>(d: &mut D) -> Option<Self> {
            Some(Mac(d.produce()?))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_and_display() {
        let mac = Mac::try_from("00:77:66:55:44:33").unwrap();
        assert_eq!(mac, Mac([0x00, 0x77, 0x66, 0x55, 0x44, 0x33]));
        assert_eq!(mac.to_string(), "00:77:66:55:44:33");
        assert_eq!(Mac::from_str("ff:ff:ff:ff:ff:ff").unwrap(), Mac::BROADCAST);
    }

    #[test]
    fn bad_strings() {
        for bad in [
            "",
            "00:11:22:33:44",
            "00:11:22:33:44:55:66",
            "00:11:22:33:44:5",
            "00:11:22:33:44:gg",
            "001:1:22:33:44:55",
        ] {
            assert!(Mac::try_from(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn display_round_trips() {
        bolero::check!().with_type::<Mac>().for_each(|mac| {
            assert_eq!(Mac::try_from(mac.to_string().as_str()).unwrap(), *mac);
        });
    }

    #[test]
    fn mac_kinds() {
        assert!(Mac::BROADCAST.is_multicast());
        assert!(Mac::BROADCAST.is_broadcast());
        assert!(Mac([0x01, 0, 0x5e, 0, 0, 1]).is_multicast());
        assert!(Mac([0x02, 0, 0, 0, 0, 1]).is_unicast());
        assert!(Mac::ZERO.is_zero());
    }
}
