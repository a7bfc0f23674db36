// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IP protocol numbers, as matched by ACL rules (`nw_proto`)

use etherparse::IpNumber;
use std::fmt::Display;

/// Thin wrapper around [`IpNumber`]
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct IpProto(IpNumber);

impl IpProto {
    /// Internet control message protocol (v4)
    pub const ICMP: IpProto = IpProto(IpNumber::ICMP);
    /// Transmission control protocol
    pub const TCP: IpProto = IpProto(IpNumber::TCP);
    /// User datagram protocol
    pub const UDP: IpProto = IpProto(IpNumber::UDP);
    /// Internet control message protocol (v6)
    pub const ICMPV6: IpProto = IpProto(IpNumber::IPV6_ICMP);

    /// Build an [`IpProto`] from its raw value
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        IpProto(IpNumber(raw))
    }

    /// Return the [`IpProto`] represented as a `u8`
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0.0
    }
}

impl From<u8> for IpProto {
    fn from(raw: u8) -> Self {
        IpProto::new(raw)
    }
}

impl From<IpProto> for u8 {
    fn from(value: IpProto) -> Self {
        value.as_u8()
    }
}

impl Display for IpProto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use super::IpProto;
    use bolero::{Driver, TypeGenerator};

    impl TypeGenerator for IpProto {
        fn generate<D: Driver>(u: &mut D) -> Option<Self> {
            Some(IpProto::new(u.produce()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IpProto;

    #[test]
    fn well_known_protocols() {
        assert_eq!(IpProto::ICMP.as_u8(), 1);
        assert_eq!(IpProto::TCP.as_u8(), 6);
        assert_eq!(IpProto::UDP.as_u8(), 17);
        assert_eq!(IpProto::ICMPV6.as_u8(), 58);
    }
}
