// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ethernet type related fields

use etherparse::EtherType;
use std::fmt::Display;

/// The ethernet header's ethertype field, as matched by ACL rules (`dl_type`).
///
/// This is a transparent wrapper around the type provided by etherparse, so that the
/// configuration model does not leak etherparse into its public API and so that we can
/// implement `TypeGenerator` for property tests.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct EthType(EtherType);

impl EthType {
    /// Ethernet type for [address resolution protocol](https://en.wikipedia.org/wiki/Address_Resolution_Protocol)
    pub const ARP: EthType = EthType(EtherType::ARP);
    /// Ethernet type for [IPv4](https://en.wikipedia.org/wiki/IPv4)
    pub const IPV4: EthType = EthType(EtherType::IPV4);
    /// Ethernet type for [IPv6](https://en.wikipedia.org/wiki/IPv6)
    pub const IPV6: EthType = EthType(EtherType::IPV6);
    /// Ethernet type for [VLAN](https://en.wikipedia.org/wiki/IEEE_802.1Q)
    pub const VLAN: EthType = EthType(EtherType::VLAN_TAGGED_FRAME);
    /// Ethernet type for [LLDP](https://en.wikipedia.org/wiki/Link_Layer_Discovery_Protocol)
    pub const LLDP: EthType = EthType(EtherType(0x88cc));

    /// Map a raw (native-endian) u16 into an [`EthType`]
    #[must_use]
    pub const fn new(raw: u16) -> EthType {
        EthType(EtherType(raw))
    }

    /// get the raw `u16` value (native-endian)
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0.0
    }

    /// Tell if this [`EthType`] carries IP (v4 or v6)
    #[must_use]
    pub fn is_ip(self) -> bool {
        self == EthType::IPV4 || self == EthType::IPV6
    }
}

impl From<u16> for EthType {
    fn from(raw: u16) -> Self {
        EthType::new(raw)
    }
}

impl From<EthType> for u16 {
    fn from(value: EthType) -> Self {
        value.raw()
    }
}

impl Display for EthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.raw())
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use super::EthType;
    use bolero::{Driver, TypeGenerator};

    impl TypeGenerator for EthType {
        fn generate<D: Driver>(u: &mut D) -> Option<Self> {
            Some(EthType::new(u.produce()?))
        }
    }
}
