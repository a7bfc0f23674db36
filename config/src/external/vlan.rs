// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Config model: VLANs

use ipnet::IpNet;
use net::eth::mac::Mac;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Keys of a VLAN
pub const VLAN_KEYS: [&str; 9] = [
    "vid",
    "description",
    "faucet_vips",
    "faucet_mac",
    "acl_in",
    "acls_in",
    "max_hosts",
    "unicast_flood",
    "edge_learn_stack_root",
];

/// A reference to a VLAN: either its name or its numeric vid
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VlanRef {
    Vid(u16),
    Name(String),
}
impl Display for VlanRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VlanRef::Vid(vid) => write!(f, "{vid}"),
            VlanRef::Name(name) => write!(f, "{name}"),
        }
    }
}
impl From<&str> for VlanRef {
    fn from(value: &str) -> Self {
        VlanRef::Name(value.to_owned())
    }
}

fn default_true() -> bool {
    true
}
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_true(value: &bool) -> bool {
    *value
}

/// A VLAN as written in the `vlans` section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VlanConf {
    pub vid: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faucet_vips: Vec<IpNet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faucet_mac: Option<Mac>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl_in: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acls_in: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hosts: Option<u32>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub unicast_flood: bool,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub edge_learn_stack_root: bool,
}

impl VlanConf {
    /// A VLAN with the given vid and defaults for everything else
    #[must_use]
    pub fn new(vid: u16) -> Self {
        Self {
            vid,
            description: None,
            faucet_vips: vec![],
            faucet_mac: None,
            acl_in: None,
            acls_in: vec![],
            max_hosts: None,
            unicast_flood: true,
            edge_learn_stack_root: true,
        }
    }
}
