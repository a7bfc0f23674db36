// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors building a provisioning plan

use net::interface::IllegalInterfaceName;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("DP '{0}': {1}")]
    InterfaceName(String, IllegalInterfaceName),
    #[error("DP '{dp}': stack port {port} refers to unknown DP '{peer}'")]
    NoSuchPeer { dp: String, port: u32, peer: String },
    #[error("DP '{0}': stack port {1} loops back to the same DP")]
    SelfLink(String, u32),
    #[error("DP '{0}' has more than {max} links to DP '{1}'", max = crate::bridge::MAX_PATCHES)]
    TooManyPatches(String, String),
    #[error("Can't address more than {0} VLANs")]
    TooManyVlans(usize),
    #[error("VLAN {0}: can't address more than {1} hosts")]
    TooManyHosts(u16, usize),
    #[error("Host '{0}' is defined more than once")]
    DuplicateHost(String),
}
