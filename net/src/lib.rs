// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![forbid(unsafe_code)] // Validation logic should always be strictly safe
#![deny(missing_docs, clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Strictly validated network values used by switch configurations: MAC addresses, VLAN ids,
//! ethertypes, IP protocol numbers, datapath ids, OpenFlow port numbers and Linux interface names.

pub mod eth;
pub mod interface;
pub mod ip;
pub mod openflow;
pub mod vlan;
