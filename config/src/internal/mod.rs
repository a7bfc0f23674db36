// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The internal, validated configuration model. A [`Dp`] is built from the external document
//! only if every reference in it resolves: ports are keyed by [`PortNo`], VLANs by [`Vid`] and
//! ACLs carry the port numbers of the datapath that uses them.

pub mod acl;
pub mod build;
pub mod ranges;

use ipnet::IpNet;
use net::eth::mac::Mac;
use net::openflow::{DpId, PortNo};
use net::vlan::Vid;
use std::collections::BTreeMap;

pub use acl::{Acl, Output, Rule, RuleActions, RuleMatch};
pub use build::build_dps;

/// The far end of a stack link
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackPeer {
    pub dp: String,
    pub port: PortNo,
}

/// Stacking role of a datapath
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DpStack {
    /// Root priority; lower is preferred. Only set on root candidates.
    pub priority: Option<u32>,
    pub route_learning: bool,
    pub root_down_time_multiple: u32,
}
impl DpStack {
    #[must_use]
    pub fn is_root_candidate(&self) -> bool {
        self.priority.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LldpBeacon {
    pub send_interval: u32,
    pub max_per_interval: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    pub number: PortNo,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub native_vlan: Option<Vid>,
    pub tagged_vlans: Vec<Vid>,
    pub acls_in: Vec<String>,
    pub stack: Option<StackPeer>,
    pub output_only: bool,
    pub max_lldp_lost: u32,
}
impl Port {
    #[must_use]
    pub fn is_stack(&self) -> bool {
        self.stack.is_some()
    }
    /// All the VLANs of this port, native first
    pub fn vlans(&self) -> impl Iterator<Item = Vid> + '_ {
        self.native_vlan
            .iter()
            .copied()
            .chain(self.tagged_vlans.iter().copied())
    }
    #[must_use]
    pub fn has_vlan(&self, vid: Vid) -> bool {
        self.vlans().any(|v| v == vid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vlan {
    pub name: String,
    pub vid: Vid,
    pub description: Option<String>,
    pub faucet_vips: Vec<IpNet>,
    pub faucet_mac: Option<Mac>,
    pub acls_in: Vec<String>,
    pub max_hosts: Option<u32>,
    pub unicast_flood: bool,
    pub edge_learn_stack_root: bool,
    /// Whether this VLAN was only referenced by vid, not declared
    pub implicit: bool,
}
impl Vlan {
    /// A VLAN created for a numeric reference with no declaration
    #[must_use]
    pub fn implicit(vid: Vid) -> Self {
        Self {
            name: vid.to_string(),
            vid,
            description: None,
            faucet_vips: vec![],
            faucet_mac: None,
            acls_in: vec![],
            max_hosts: None,
            unicast_flood: true,
            edge_learn_stack_root: true,
            implicit: true,
        }
    }
    #[must_use]
    pub fn has_vips(&self) -> bool {
        !self.faucet_vips.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Router {
    pub name: String,
    pub vlans: Vec<Vid>,
}

/// A validated datapath
#[derive(Clone, Debug, PartialEq)]
pub struct Dp {
    pub name: String,
    pub dp_id: DpId,
    pub hardware: String,
    pub description: Option<String>,
    pub stack: Option<DpStack>,
    pub lldp_beacon: LldpBeacon,
    pub ports: BTreeMap<PortNo, Port>,
    pub vlans: BTreeMap<Vid, Vlan>,
    pub acls: BTreeMap<String, Acl>,
    pub routers: BTreeMap<String, Router>,
}

impl Dp {
    #[must_use]
    pub fn port(&self, number: PortNo) -> Option<&Port> {
        self.ports.get(&number)
    }
    #[must_use]
    pub fn port_by_name(&self, name: &str) -> Option<&Port> {
        self.ports.values().find(|p| p.name == name)
    }
    /// Ports that are stack links to other datapaths
    pub fn stack_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values().filter(|p| p.is_stack())
    }
    #[must_use]
    pub fn has_stack_ports(&self) -> bool {
        self.stack_ports().next().is_some()
    }
    #[must_use]
    pub fn is_root_candidate(&self) -> bool {
        self.stack.is_some_and(|s| s.is_root_candidate())
    }
    #[must_use]
    pub fn stack_priority(&self) -> Option<u32> {
        self.stack.and_then(|s| s.priority)
    }
    /// Ports carrying the given VLAN
    pub fn vlan_ports(&self, vid: Vid) -> impl Iterator<Item = &Port> {
        self.ports.values().filter(move |p| p.has_vlan(vid))
    }
    #[must_use]
    pub fn has_vips(&self) -> bool {
        self.vlans.values().any(Vlan::has_vips)
    }
}
