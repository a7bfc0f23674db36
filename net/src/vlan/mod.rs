// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VLAN identifier validation.

use core::num::NonZero;
use std::fmt::Display;

/// A VLAN Identifier.
///
/// This type is marked `#[repr(transparent)]` to ensure that it has the same memory layout
/// as a [`NonZero<u16>`], so that [`Option<Vid>`] has the size of a `u16`.
#[repr(transparent)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vid(NonZero<u16>);

/// Errors which can occur when converting a `u16` to a validated [`Vid`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[must_use]
pub enum InvalidVid {
    /// 0 is a reserved [`Vid`] which basically means "the native vlan."
    #[error("Zero is a reserved Vid")]
    Zero,
    /// 4095 is a reserved [`Vid`] per 802.1Q.
    #[error("4095 is a reserved Vid")]
    Reserved,
    /// The value is too large to be a legal [`Vid`] (12-bit max).
    #[error("{0} is too large to be a legal Vid ({MAX} is max legal value)", MAX = Vid::MAX)]
    TooLarge(u16),
}

impl InvalidVid {
    /// The raw `u16` value of the reserved (4095) [`Vid`]
    pub const RESERVED: u16 = 4095;
}

impl Vid {
    /// The minimum legal [`Vid`] value (1).
    pub const MIN: Vid = Vid(NonZero::<u16>::MIN);

    /// The maximum legal [`Vid`] value (2^12 - 2).
    #[allow(clippy::unwrap_used)] // safe due to const eval
    pub const MAX: Vid = Vid(NonZero::new(4094).unwrap());

    /// Create a new [`Vid`] from a `u16`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is 0, 4095 (reserved), or greater than [`Vid::MAX`].
    pub fn new(vid: u16) -> Result<Self, InvalidVid> {
        match NonZero::new(vid) {
            None => Err(InvalidVid::Zero),
            Some(val) if val.get() == InvalidVid::RESERVED => Err(InvalidVid::Reserved),
            Some(val) if val.get() > InvalidVid::RESERVED => Err(InvalidVid::TooLarge(val.get())),
            Some(val) => Ok(Vid(val)),
        }
    }

    /// Get the value of the [`Vid`] as a `u16`.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
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

impl Display for Vid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use super::Vid;
    use bolero::{Driver, TypeGenerator};
    use std::ops::Bound;

    impl TypeGenerator for Vid {
        fn generate<D: Driver>(u: &mut D) -> Option<Self> {
            let raw = u.gen_u16(
                Bound::Included(&Vid::MIN.as_u16()),
                Bound::Included(&Vid::MAX.as_u16()),
            )?;
            Vid::new(raw).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidVid, Vid};

    #[test]
    fn vid_bounds() {
        assert_eq!(Vid::new(0), Err(InvalidVid::Zero));
        assert_eq!(Vid::new(4095), Err(InvalidVid::Reserved));
        assert_eq!(Vid::new(4096), Err(InvalidVid::TooLarge(4096)));
        assert_eq!(Vid::new(1).unwrap(), Vid::MIN);
        assert_eq!(Vid::new(4094).unwrap(), Vid::MAX);
    }

    #[test]
    fn vid_from_any_u16() {
        bolero::check!().with_type().for_each(|raw: &u16| match Vid::new(*raw) {
            Ok(vid) => {
                assert_eq!(vid.as_u16(), *raw);
                assert!(vid >= Vid::MIN && vid <= Vid::MAX);
            }
            Err(InvalidVid::Zero) => assert_eq!(*raw, 0),
            Err(InvalidVid::Reserved) => assert_eq!(*raw, InvalidVid::RESERVED),
            Err(InvalidVid::TooLarge(x)) => assert!(x > InvalidVid::RESERVED),
        });
    }

    #[test]
    fn generated_vids_are_legal() {
        bolero::check!().with_type().for_each(|vid: &Vid| {
            assert!(Vid::new(vid.as_u16()).is_ok());
        });
    }

    #[test]
    fn vid_yaml() {
        let vid: Vid = serde_yaml_ng::from_str("0x100").unwrap();
        assert_eq!(vid.as_u16(), 256);
        assert!(serde_yaml_ng::from_str::<Vid>("4095").is_err());
    }
}
