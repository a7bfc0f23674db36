// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The external configuration model: a faithful, unvalidated image of the YAML document.
//! Every mapping rejects unknown keys.

pub mod acl;
pub mod dp;
pub mod vlan;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use acl::{
    ACTION_FIELDS, AclConf, ActionsConf, Flag, MATCH_FIELDS, MatchAddr, OutputConf, RuleConf,
    RuleEntry,
};
pub use dp::{
    DP_KEYS, DpConf, DpStackConf, INTERFACE_KEYS, InterfaceConf, LldpBeaconConf, PortRef,
    STACK_KEYS, StackLinkConf,
};
pub use vlan::{VLAN_KEYS, VlanConf, VlanRef};

/// The only supported document version
pub const CONFIG_VERSION: u32 = 2;

/// Top-level keys of a config document
pub const TOP_LEVEL_KEYS: [&str; 7] = [
    "version",
    "include",
    "include_optional",
    "acls",
    "vlans",
    "routers",
    "dps",
];

/// A router joins VLANs for inter-VLAN routing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConf {
    #[serde(default)]
    pub vlans: Vec<VlanRef>,
}

/// A whole config document, as written by users
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaucetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_optional: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub acls: BTreeMap<String, AclConf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vlans: BTreeMap<String, VlanConf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub routers: BTreeMap<String, RouterConf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dps: BTreeMap<String, DpConf>,
}

impl FaucetConfig {
    /// Serialize this document as YAML
    ///
    /// # Errors
    ///
    /// Fails only if serialization of a value fails.
    pub fn to_yaml(&self) -> Result<String, crate::ConfigError> {
        serde_yaml_ng::to_string(self).map_err(|e| crate::ConfigError::Yaml(e.to_string()))
    }
}
