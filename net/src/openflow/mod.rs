// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! OpenFlow identifiers: datapath ids and physical port numbers.

use std::fmt::Display;

/// An OpenFlow datapath identifier.
///
/// The low 48 bits usually carry a MAC address of the switch; the configuration only requires
/// the value to be non-zero and unique.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct DpId(u64);

/// Errors building a [`DpId`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDpId {
    /// Zero is not a usable datapath id
    #[error("datapath id must not be zero")]
    Zero,
}

impl DpId {
    /// Build a [`DpId`]
    ///
    /// # Errors
    ///
    /// Fails if `raw` is zero.
    pub fn new(raw: u64) -> Result<Self, InvalidDpId> {
        if raw == 0 {
            Err(InvalidDpId::Zero)
        } else {
            Ok(DpId(raw))
        }
    }

    /// The raw value
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Zero-padded hex rendering as expected by `other-config:datapath-id`
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl TryFrom<u64> for DpId {
    type Error = InvalidDpId;
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        DpId::new(value)
    }
}

impl From<DpId> for u64 {
    fn from(value: DpId) -> Self {
        value.0
    }
}

impl Display for DpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An OpenFlow (1.3) physical port number.
///
/// Legal values are `1..=OFPP_MAX`; the numbers above that are reserved ports.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PortNo(u32);

/// Errors building a [`PortNo`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPortNo {
    /// Port numbers start at 1
    #[error("port number must not be zero")]
    Zero,
    /// Reserved OpenFlow port
    #[error("port number {0} is reserved (max is {max})", max = PortNo::OFPP_MAX)]
    Reserved(u32),
}

impl PortNo {
    /// Highest physical port number (`OFPP_MAX`)
    pub const OFPP_MAX: u32 = 0xffff_ff00;

    /// Build a [`PortNo`]
    ///
    /// # Errors
    ///
    /// Fails on zero or reserved port numbers.
    pub fn new(raw: u32) -> Result<Self, InvalidPortNo> {
        match raw {
            0 => Err(InvalidPortNo::Zero),
            n if n > Self::OFPP_MAX => Err(InvalidPortNo::Reserved(n)),
            n => Ok(PortNo(n)),
        }
    }

    /// The raw value
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for PortNo {
    type Error = InvalidPortNo;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PortNo::new(value)
    }
}

impl From<PortNo> for u32 {
    fn from(value: PortNo) -> Self {
        value.0
    }
}

impl Display for PortNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use super::{DpId, PortNo};
    use bolero::{Driver, TypeGenerator};
    use std::ops::Bound;

    impl TypeGenerator for DpId {
        fn generate<D: Driver>(u: &mut D) -> Option<Self> {
            DpId::new(u.gen_u64(Bound::Included(&1), Bound::Unbounded)?).ok()
        }
    }

    impl TypeGenerator for PortNo {
        fn generate<D: Driver>(u: &mut D) -> Option<Self> {
            PortNo::new(u.gen_u32(Bound::Included(&1), Bound::Included(&PortNo::OFPP_MAX))?).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DpId, InvalidDpId, InvalidPortNo, PortNo};

    #[test]
    fn dpid_hex() {
        assert_eq!(DpId::new(0x1).unwrap().to_hex(), "0000000000000001");
        assert_eq!(DpId::new(0), Err(InvalidDpId::Zero));
    }

    #[test]
    fn port_numbers() {
        assert_eq!(PortNo::new(0), Err(InvalidPortNo::Zero));
        assert_eq!(
            PortNo::new(0xffff_fffd),
            Err(InvalidPortNo::Reserved(0xffff_fffd))
        );
        bolero::check!().with_type().for_each(|port: &PortNo| {
            assert!(port.as_u32() >= 1 && port.as_u32() <= PortNo::OFPP_MAX);
        });
    }
}
