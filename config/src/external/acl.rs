// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Config model: ACLs

use ipnet::IpNet;
use net::eth::mac::Mac;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::net::IpAddr;

use crate::external::dp::PortRef;

/// A boolean that may be written as `true`/`false` or as an integer (`0` is false)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(u64),
}
impl Flag {
    #[must_use]
    pub fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(n) => n != 0,
        }
    }
}
impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Flag::Bool(value)
    }
}

/// An IP address or prefix used as a match value. A bare address matches a single host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchAddr(pub IpNet);

impl TryFrom<String> for MatchAddr {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if let Ok(net) = value.parse::<IpNet>() {
            return Ok(MatchAddr(net));
        }
        value
            .parse::<IpAddr>()
            .map(|addr| MatchAddr(IpNet::from(addr)))
            .map_err(|_| format!("invalid address or prefix '{value}'"))
    }
}
impl From<MatchAddr> for String {
    fn from(value: MatchAddr) -> Self {
        value.0.to_string()
    }
}
impl Display for MatchAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output action of a rule
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dl_dst: Option<Mac>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_vid: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pop_vlans: Option<Flag>,
}

/// Actions of a rule
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionsConf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<PortRef>,
}

/// Match fields and actions of a rule
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_port: Option<PortRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dl_src: Option<Mac>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dl_dst: Option<Mac>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dl_type: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_vid: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_proto: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_src: Option<MatchAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_dst: Option<MatchAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_src: Option<MatchAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_dst: Option<MatchAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_src: Option<MatchAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_dst: Option<MatchAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_src: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_dst: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_src: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_dst: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmpv6_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<ActionsConf>,
    /// Legacy form of `actions.allow`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Flag>,
}

/// One element of an ACL: `- rule: {...}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleEntry {
    pub rule: RuleConf,
}

/// An ACL is an ordered list of rules
pub type AclConf = Vec<RuleEntry>;

/// Match field names, as written in config documents
pub const MATCH_FIELDS: [&str; 17] = [
    "in_port",
    "dl_src",
    "dl_dst",
    "dl_type",
    "vlan_vid",
    "nw_proto",
    "nw_src",
    "nw_dst",
    "ipv4_src",
    "ipv4_dst",
    "ipv6_src",
    "ipv6_dst",
    "udp_src",
    "udp_dst",
    "tcp_src",
    "tcp_dst",
    "icmpv6_type",
];

/// Action keywords, as written in config documents
pub const ACTION_FIELDS: [&str; 9] = [
    "actions", "allow", "output", "mirror", "port", "ports", "dl_dst", "vlan_vid", "pop_vlans",
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rule_with_hex_fields() {
        let yaml = r"
dl_type: 0x86dd
nw_proto: 58
icmpv6_type: 135
actions:
  allow: 1
";
        let rule: RuleConf = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(rule.dl_type, Some(0x86dd));
        assert_eq!(rule.nw_proto, Some(58));
        assert_eq!(rule.icmpv6_type, Some(135));
        assert!(rule.actions.unwrap().allow.unwrap().is_set());
    }

    #[test]
    fn test_rule_rejects_unknown_match() {
        let yaml = "dl_type: 0x800\nnot_a_field: 1\n";
        assert!(serde_yaml_ng::from_str::<RuleConf>(yaml).is_err());
    }

    #[test]
    fn test_match_addr() {
        let host = MatchAddr::try_from("10.0.0.1".to_string()).unwrap();
        assert_eq!(host.to_string(), "10.0.0.1/32");
        let net = MatchAddr::try_from("fc00::/64".to_string()).unwrap();
        assert_eq!(net.to_string(), "fc00::/64");
        assert!(MatchAddr::try_from("10.0.0.300".to_string()).is_err());
    }

    #[test]
    fn test_flag() {
        assert!(!serde_yaml_ng::from_str::<Flag>("0").unwrap().is_set());
        assert!(serde_yaml_ng::from_str::<Flag>("true").unwrap().is_set());
        assert!(serde_yaml_ng::from_str::<Flag>("\"yes\"").is_err());
    }
}
