// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mac address type and logic.

use arrayvec::ArrayVec;
use std::fmt::Display;
use std::str::FromStr;

#[cfg(any(test, feature = "bolero"))]
#[allow(unused_imports)] // re-export of conditionally included generators
pub use contract::*;

/// A [MAC Address] type.
///
/// `Mac` is a transparent wrapper around `[u8; 6]`. In configuration documents a `Mac` is always
/// written as a string of six colon separated hex octets.
///
/// [MAC Address]: https://en.wikipedia.org/wiki/MAC_address
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
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
        let octets_parsed = value.split(':').try_fold(
            ArrayVec::<u8, MAX_OCTETS>::new(),
            |mut acc, octet_str| {
                if octet_str.len() != 2 || !octet_str.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(invalid());
                }
                let parsed = u8::from_str_radix(octet_str, 16).map_err(|_| invalid())?;
                acc.try_push(parsed).map_err(|_| invalid())?;
                Ok(acc)
            },
        )?;
        octets_parsed.into_inner().map(Mac).map_err(|_| invalid())
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

    /// Returns true iff the least significant bit of the first octet of the `[Mac]` is one.
    #[must_use]
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }

    /// Returns true iff the least significant bit of the first octet of the `[Mac]` is zero.
    #[must_use]
    pub fn is_unicast(&self) -> bool {
        !self.is_multicast()
    }

    /// Returns true iff the binary representation of the [`Mac`] is exclusively zeros.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self == &Mac::ZERO
    }

    /// Returns true iff the second least significant bit of the first octet is one.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Returns `Ok(())` iff the [`Mac`] can be used to rewrite the destination of a packet.
    ///
    /// # Errors
    ///
    /// Zero and multicast addresses are refused.
    pub fn valid_unicast_dst(&self) -> Result<(), MacFromStringError> {
        if self.is_zero() || self.is_multicast() {
            Err(MacFromStringError::Invalid(self.to_string()))
        } else {
            Ok(())
        }
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
    use bolero::{Driver, TypeGenerator, ValueGenerator};
    use std::ops::Bound;

    impl TypeGenerator for Mac {
        fn generate<D: Driver>(u: &mut D) -> Option<Self> {
            Some(Mac(u.produce()?))
        }
    }

    /// Generate valid MAC address strings in format XX:XX:XX:XX:XX:XX
    pub struct MacTestStringGenerator;
    impl ValueGenerator for MacTestStringGenerator {
        type Output = String;

        fn generate<D: Driver>(&self, u: &mut D) -> Option<Self::Output> {
            let hexchars = "0123456789abcdefABCDEF";
            (0..6)
                .map(|_| {
                    (0..2)
                        .map(|_| {
                            hexchars.chars().nth(
                                u.gen_usize(Bound::Included(&0), Bound::Excluded(&hexchars.len()))?,
                            )
                        })
                        .collect::<Option<String>>()
                })
                .collect::<Option<Vec<String>>>()
                .map(|v| v.join(":"))
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Mac, MacTestStringGenerator};
    use bolero::{Driver, ValueGenerator};
    use std::ops::Bound;

    struct InvalidMacStringGenerator;
    impl ValueGenerator for InvalidMacStringGenerator {
        type Output = String;

        fn generate<D: Driver>(&self, u: &mut D) -> Option<Self::Output> {
            let mut valid_mac = MacTestStringGenerator.generate(u)?;
            let fuzz_char = char::from(u.produce::<u8>()?);
            let pos = u.gen_usize(Bound::Included(&0), Bound::Excluded(&valid_mac.len()))?;
            if fuzz_char.is_ascii_hexdigit() || fuzz_char == ':' {
                valid_mac.insert(pos, fuzz_char);
            } else {
                valid_mac.replace_range(pos..=pos, &fuzz_char.to_string());
            }
            Some(valid_mac)
        }
    }

    #[test]
    fn mac_parses_like_try_from() {
        let mac: Mac = "0e:00:00:00:02:0A".parse().unwrap();
        assert_eq!(mac, Mac([0x0e, 0, 0, 0, 0x02, 0x0a]));
        assert!("0e:00:00:00:02".parse::<Mac>().is_err());
        assert!("0e:00:00:00:02:0a:01".parse::<Mac>().is_err());
    }

    #[test]
    fn mac_from_valid_string() {
        bolero::check!()
            .with_generator(MacTestStringGenerator)
            .for_each(|input: &String| {
                let mac = Mac::try_from(input.as_str()).unwrap();
                assert_eq!(input.to_lowercase(), mac.to_string());
            });
    }

    #[test]
    fn mac_from_invalid_string() {
        bolero::check!()
            .with_generator(InvalidMacStringGenerator)
            .for_each(|input: &String| {
                assert!(Mac::try_from(input.as_str()).is_err());
            });
    }

    #[test]
    fn mac_from_string_wrong_octet_count() {
        assert!(Mac::try_from("00:00:00:00:00:00:00").is_err());
        assert!(Mac::try_from("00:00:00:00:00").is_err());
        assert!(Mac::try_from("").is_err());
        assert!(Mac::try_from("0e:00:00:00:02:0").is_err());
    }

    #[test]
    fn mac_yaml_is_a_string() {
        let mac: Mac = serde_yaml_ng::from_str("\"0E:00:00:00:02:02\"").unwrap();
        assert_eq!(mac, Mac([0x0e, 0, 0, 0, 2, 2]));
        assert!(mac.is_unicast());
        assert!(mac.is_local());
        assert!(mac.valid_unicast_dst().is_ok());
        assert!(Mac::BROADCAST.valid_unicast_dst().is_err());
        let out = serde_yaml_ng::to_string(&mac).unwrap();
        assert!(out.contains("0e:00:00:00:02:02"));
    }
}
