// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ethernet related values

pub mod ethtype;
pub mod mac;
