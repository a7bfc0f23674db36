// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Type for configuration / validation failures.
//! Any result returned by the parsing or validation functions of this crate carries a
//! `ConfigError`. An invalid document must always surface as one of these, never as a panic.

use std::path::PathBuf;

use net::eth::mac::Mac;
use net::openflow::{InvalidDpId, InvalidPortNo};
use net::vlan::InvalidVid;
use thiserror::Error;

/// The reasons why we may reject a configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    // file handling and includes
    #[error("Failed to read config file {}: {}", .0.display(), .1)]
    Io(PathBuf, String),
    #[error("Config file {} is included recursively", .0.display())]
    IncludeCycle(PathBuf),
    #[error("Include directives are not supported without a config file")]
    IncludeWithoutFile,
    #[error("Config file {} is not a mapping", .0.display())]
    NotAMapping(PathBuf),
    #[error("Key '{key}' of section '{section}' is defined more than once")]
    DuplicateKey { section: String, key: String },

    // document schema
    #[error("Invalid YAML: {0}")]
    Yaml(String),
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
    #[error("Unsupported config version {0}, only version 2 is supported")]
    UnsupportedVersion(u32),

    // datapaths
    #[error("No datapaths are configured")]
    NoDatapaths,
    #[error("DP '{0}': invalid dp_id: {1}")]
    InvalidDpId(String, InvalidDpId),
    #[error("DP '{0}' and DP '{1}' share dp_id {2}")]
    DuplicateDpId(String, String, u64),
    #[error("DP '{0}': unsupported hardware '{1}'")]
    UnsupportedHardware(String, String),
    #[error("DP '{0}': stack priority must be greater than zero")]
    InvalidStackPriority(String),

    // ports
    #[error("DP '{dp}': interface '{port}' has no port number")]
    MissingPortNumber { dp: String, port: String },
    #[error("DP '{dp}': interface {key} declares number {number}")]
    PortNumberMismatch { dp: String, key: u32, number: u32 },
    #[error("DP '{0}': invalid port number: {1}")]
    InvalidPortNo(String, InvalidPortNo),
    #[error("DP '{0}': port number {1} is configured more than once")]
    DuplicatePortNumber(String, u32),
    #[error("DP '{0}': port name '{1}' is used more than once")]
    DuplicatePortName(String, String),
    #[error("DP '{0}': invalid interface range '{1}'")]
    InvalidPortRange(String, String),
    #[error("DP '{0}': more than {1} ports")]
    TooManyPorts(String, usize),
    #[error("DP '{0}': interface range '{1}' must not set a name or number")]
    NamedPortRange(String, String),
    #[error("DP '{dp}': port {port} has VLAN {vid} both native and tagged")]
    NativeVlanTagged { dp: String, port: u32, vid: u16 },
    #[error("DP '{dp}': port {port} tags VLAN {vid} more than once")]
    DuplicateTaggedVlan { dp: String, port: u32, vid: u16 },

    // stacking
    #[error("DP '{dp}': stack port {port} must not have VLANs")]
    StackPortWithVlans { dp: String, port: u32 },
    #[error("DP '{dp}': stack port {port} refers to unknown DP '{peer}'")]
    NoSuchStackDp { dp: String, port: u32, peer: String },
    #[error("DP '{dp}': stack port {port} refers to unknown port {peer_port} of DP '{peer}'")]
    NoSuchStackPort {
        dp: String,
        port: u32,
        peer: String,
        peer_port: String,
    },
    #[error("DP '{dp}': stack port {port} is not reciprocated by DP '{peer}' port {peer_port}")]
    StackPeerMismatch {
        dp: String,
        port: u32,
        peer: String,
        peer_port: u32,
    },
    #[error("Stack ports are configured but no DP has a stack priority")]
    NoStackRoot,
    #[error("DP '{0}' is not connected to the stack root '{1}'")]
    StackNotConnected(String, String),

    // vlans
    #[error("VLAN '{0}': invalid vid: {1}")]
    InvalidVid(String, InvalidVid),
    #[error("VLANs '{0}' and '{1}' share vid {2}")]
    DuplicateVid(String, String, u16),
    #[error("'{0}' refers to unknown VLAN '{1}'")]
    NoSuchVlan(String, String),
    #[error("VLAN '{0}': invalid faucet_mac {1}")]
    InvalidFaucetMac(String, Mac),

    // acls
    #[error("'{0}' refers to unknown ACL '{1}'")]
    NoSuchAcl(String, String),
    #[error("ACL '{acl}' rule {rule}: {reason}")]
    InvalidAclRule {
        acl: String,
        rule: usize,
        reason: String,
    },
    #[error("ACL '{acl}' used by DP '{dp}' refers to unknown port '{port}'")]
    NoSuchAclPort {
        acl: String,
        dp: String,
        port: String,
    },

    // routers
    #[error("Router '{0}' has no VLANs")]
    EmptyRouter(String),
}

/// Result-like type for configurations
pub type ConfigResult = Result<(), ConfigError>;

#[must_use]
pub fn stringify(conf_result: &ConfigResult) -> String {
    match conf_result {
        Ok(()) => "Ok".to_string(),
        Err(e) => format!("FAILED: {e}"),
    }
}

impl ConfigError {
    /// Map a deserialization failure, singling out unknown keys.
    pub(crate) fn from_yaml(e: &serde_yaml_ng::Error) -> Self {
        let msg = e.to_string();
        if msg.contains("unknown field") || msg.contains("unknown variant") {
            ConfigError::UnknownKey(msg)
        } else {
            ConfigError::Yaml(msg)
        }
    }
}
