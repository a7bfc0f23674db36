// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Config model: datapaths and their interfaces

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::external::vlan::VlanRef;

/// Hardware type assumed when none is configured
pub const DEFAULT_HARDWARE: &str = "Open vSwitch";

/// Keys of a datapath
pub const DP_KEYS: [&str; 7] = [
    "dp_id",
    "hardware",
    "description",
    "stack",
    "lldp_beacon",
    "interfaces",
    "interface_ranges",
];

/// Keys of an interface
pub const INTERFACE_KEYS: [&str; 11] = [
    "name",
    "description",
    "number",
    "enabled",
    "native_vlan",
    "tagged_vlans",
    "acl_in",
    "acls_in",
    "stack",
    "output_only",
    "max_lldp_lost",
];

/// Keys of the `stack` attribute of datapaths and interfaces, and of `lldp_beacon`
pub const STACK_KEYS: [&str; 7] = [
    "priority",
    "route_learning",
    "root_down_time_multiple",
    "dp",
    "port",
    "send_interval",
    "max_per_interval",
];

/// A reference to a port: either its number or its name
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortRef {
    Number(u32),
    Name(String),
}
impl Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortRef::Number(n) => write!(f, "{n}"),
            PortRef::Name(name) => write!(f, "{name}"),
        }
    }
}
impl From<u32> for PortRef {
    fn from(value: u32) -> Self {
        PortRef::Number(value)
    }
}

fn default_true() -> bool {
    true
}
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_true(value: &bool) -> bool {
    *value
}
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}
fn default_hardware() -> String {
    DEFAULT_HARDWARE.to_owned()
}
fn default_max_lldp_lost() -> u32 {
    3
}
fn default_root_down_time_multiple() -> u32 {
    3
}
fn default_lldp_interval() -> u32 {
    5
}

/// The `stack` attribute of an interface: the peer end of a stack link
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackLinkConf {
    pub dp: String,
    pub port: PortRef,
}

/// The `stack` attribute of a datapath
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DpStackConf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub route_learning: bool,
    #[serde(default = "default_root_down_time_multiple")]
    pub root_down_time_multiple: u32,
}
impl DpStackConf {
    #[must_use]
    pub fn with_priority(priority: u32) -> Self {
        Self {
            priority: Some(priority),
            route_learning: false,
            root_down_time_multiple: default_root_down_time_multiple(),
        }
    }
}

/// LLDP beacon settings of a datapath
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LldpBeaconConf {
    #[serde(default = "default_lldp_interval")]
    pub send_interval: u32,
    #[serde(default = "default_lldp_interval")]
    pub max_per_interval: u32,
}
impl Default for LldpBeaconConf {
    fn default() -> Self {
        Self {
            send_interval: default_lldp_interval(),
            max_per_interval: default_lldp_interval(),
        }
    }
}

/// An interface of a datapath, or the shared attributes of an interface range
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceConf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_vlan: Option<VlanRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_vlans: Vec<VlanRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl_in: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acls_in: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackLinkConf>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub output_only: bool,
    #[serde(default = "default_max_lldp_lost")]
    pub max_lldp_lost: u32,
}
impl Default for InterfaceConf {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            number: None,
            enabled: true,
            native_vlan: None,
            tagged_vlans: vec![],
            acl_in: None,
            acls_in: vec![],
            stack: None,
            output_only: false,
            max_lldp_lost: default_max_lldp_lost(),
        }
    }
}

/// A datapath (switch)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DpConf {
    pub dp_id: u64,
    #[serde(default = "default_hardware")]
    pub hardware: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<DpStackConf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lldp_beacon: Option<LldpBeaconConf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub interfaces: BTreeMap<PortRef, InterfaceConf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub interface_ranges: BTreeMap<String, InterfaceConf>,
}
impl DpConf {
    #[must_use]
    pub fn new(dp_id: u64) -> Self {
        Self {
            dp_id,
            hardware: default_hardware(),
            description: None,
            stack: None,
            lldp_beacon: None,
            interfaces: BTreeMap::new(),
            interface_ranges: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dp_defaults() {
        let yaml = r"
dp_id: 0x1
interfaces:
  1:
    native_vlan: office
  uplink:
    number: 2
    stack: {dp: sw2, port: 3}
";
        let dp: DpConf = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(dp.dp_id, 1);
        assert_eq!(dp.hardware, DEFAULT_HARDWARE);
        assert_eq!(dp.interfaces.len(), 2);

        let port1 = &dp.interfaces[&PortRef::Number(1)];
        assert!(port1.enabled);
        assert_eq!(port1.max_lldp_lost, 3);
        assert_eq!(port1.native_vlan, Some(VlanRef::from("office")));

        let uplink = &dp.interfaces[&PortRef::Name("uplink".to_owned())];
        assert_eq!(uplink.number, Some(2));
        assert_eq!(
            uplink.stack,
            Some(StackLinkConf {
                dp: "sw2".to_owned(),
                port: PortRef::Number(3)
            })
        );
    }

    #[test]
    fn test_dp_stack_defaults() {
        let stack: DpStackConf = serde_yaml_ng::from_str("priority: 1").unwrap();
        assert_eq!(stack, DpStackConf::with_priority(1));
        assert!(serde_yaml_ng::from_str::<DpStackConf>("prio: 1").is_err());
    }
}
