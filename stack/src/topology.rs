// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The stack as seen from one datapath: the graph of all stack links, the root, and the local
//! stack ports.

use crate::errors::StackError;
use crate::graph::{LinkEnd, NodeLinkData, StackGraph, StackLink};
use crate::port::{StackPort, StackPortState, StateChange, Timestamp};
use config::internal::Dp;
use net::openflow::PortNo;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Role of a datapath in the stack
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Root,
    /// No other datapath reaches the root through this one
    Edge,
    Transit,
    /// No path to the root at the moment
    Pending,
}

impl Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Placement::Root => "ROOT",
            Placement::Edge => "EDGE",
            Placement::Transit => "TRANSIT",
            Placement::Pending => "PENDING",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug)]
pub struct Stack {
    name: String,
    priority: Option<u32>,
    root_down_time_multiple: u32,
    route_learning: bool,
    roots_names: Vec<String>,
    root_name: String,
    root_flood_reflection: bool,
    graph: StackGraph,
    links: BTreeMap<(String, PortNo), StackLink>,
    ports: BTreeMap<PortNo, StackPort>,
}

impl Stack {
    /// Resolve the stack of datapath `name` out of all the datapaths of a configuration.
    /// Returns `None` if that datapath has no stack ports.
    ///
    /// # Errors
    ///
    /// Fails if a link is declared from one end only, if stack ports exist without any root
    /// candidate, or if some stacked datapath cannot reach the root.
    pub fn resolve(
        dps: &[Dp],
        name: &str,
        root_hint: Option<&str>,
    ) -> Result<Option<Stack>, StackError> {
        let dp = find_dp(dps, name)?;
        let stacked: Vec<&Dp> = dps.iter().filter(|d| d.has_stack_ports()).collect();

        let mut candidates: Vec<(u32, &str)> = dps
            .iter()
            .filter_map(|d| d.stack_priority().map(|p| (p, d.name.as_str())))
            .collect();
        candidates.sort_unstable();
        let Some(&(_, first)) = candidates.first() else {
            if stacked.is_empty() && dps.iter().all(|d| d.stack.is_none()) {
                return Ok(None);
            }
            return Err(StackError::NoRootConfigured);
        };
        if !dp.has_stack_ports() {
            return Ok(None);
        }
        let roots_names: Vec<String> = candidates.iter().map(|(_, n)| (*n).to_owned()).collect();
        let root_name = root_hint
            .filter(|hint| roots_names.iter().any(|r| r.as_str() == *hint))
            .unwrap_or(first)
            .to_owned();

        let mut graph = StackGraph::new();
        let mut links = BTreeMap::new();
        let mut declared: BTreeMap<String, usize> = BTreeMap::new();
        for sdp in &stacked {
            graph.add_node(&sdp.name);
            for port in sdp.stack_ports() {
                let Some(peer) = &port.stack else { continue };
                let local = LinkEnd::new(&sdp.name, port.number, &port.name);
                let Some(peer_port) = dps
                    .iter()
                    .find(|d| d.name == peer.dp)
                    .and_then(|d| d.port(peer.port))
                else {
                    return Err(StackError::OneWayLink(format!(
                        "{}:{}-{}:{}",
                        sdp.name, port.name, peer.dp, peer.port
                    )));
                };
                let link = StackLink::new(
                    local,
                    LinkEnd::new(&peer.dp, peer.port, &peer_port.name),
                );
                *declared.entry(link.key()).or_default() += 1;
                links.insert((sdp.name.clone(), port.number), link.clone());
                graph.add_link(link);
            }
        }
        if let Some((key, _)) = declared.iter().find(|(_, count)| **count != 2) {
            return Err(StackError::OneWayLink(key.clone()));
        }
        for node in graph.nodes() {
            if graph.shortest_path(node, &root_name).is_empty() {
                return Err(StackError::NotConnected(node.to_owned(), root_name));
            }
        }

        let mut ports = BTreeMap::new();
        for port in dp.stack_ports() {
            let Some(peer) = &port.stack else { continue };
            let peer_dp = find_dp(dps, &peer.dp)?;
            if let Some(sport) = StackPort::new(dp, port, peer_dp.dp_id) {
                ports.insert(port.number, sport);
            }
        }

        let stack = Stack {
            name: dp.name.clone(),
            priority: dp.stack_priority(),
            root_down_time_multiple: dp.stack.map_or(3, |s| s.root_down_time_multiple),
            route_learning: dp.stack.is_some_and(|s| s.route_learning)
                || stacked.iter().any(|d| d.has_vips()),
            roots_names,
            root_name,
            root_flood_reflection: false,
            graph,
            links,
            ports,
        };
        let stack = Stack {
            root_flood_reflection: stack.longest_path_to_root_len() > 2,
            ..stack
        };
        info!(
            "DP {}: stack root {} ({} links), {}",
            stack.name,
            stack.root_name,
            stack.graph.num_links(),
            stack.placement()
        );
        Ok(Some(stack))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn root_name(&self) -> &str {
        &self.root_name
    }
    /// Root candidates, most preferred first
    #[must_use]
    pub fn roots_names(&self) -> &[String] {
        &self.roots_names
    }
    #[must_use]
    pub fn priority(&self) -> Option<u32> {
        self.priority
    }
    #[must_use]
    pub fn root_down_time_multiple(&self) -> u32 {
        self.root_down_time_multiple
    }
    #[must_use]
    pub fn route_learning(&self) -> bool {
        self.route_learning
    }
    #[must_use]
    pub fn root_flood_reflection(&self) -> bool {
        self.root_flood_reflection
    }
    #[must_use]
    pub fn graph(&self) -> &StackGraph {
        &self.graph
    }
    pub fn ports(&self) -> impl Iterator<Item = &StackPort> {
        self.ports.values()
    }
    #[must_use]
    pub fn port(&self, number: PortNo) -> Option<&StackPort> {
        self.ports.get(&number)
    }
    pub fn port_mut(&mut self, number: PortNo) -> Option<&mut StackPort> {
        self.ports.get_mut(&number)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.name == self.root_name
    }
    #[must_use]
    pub fn is_root_candidate(&self) -> bool {
        self.priority.is_some()
    }

    /// The lexicographically first shortest path from `src` (this datapath by default) to `dst`
    #[must_use]
    pub fn shortest_path(&self, dst: &str, src: Option<&str>) -> Vec<String> {
        self.graph.shortest_path(src.unwrap_or(&self.name), dst)
    }

    #[must_use]
    pub fn shortest_path_to_root(&self, src: Option<&str>) -> Vec<String> {
        self.shortest_path(&self.root_name, src)
    }

    /// Number of nodes of the longest of the shortest paths to the root
    #[must_use]
    pub fn longest_path_to_root_len(&self) -> usize {
        self.graph
            .nodes()
            .map(|n| self.shortest_path_to_root(Some(n)).len())
            .max()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_edge(&self) -> bool {
        !self.is_root() && self.longest_path_to_root_len() == self.shortest_path_to_root(None).len()
    }

    #[must_use]
    pub fn placement(&self) -> Placement {
        if self.is_root() {
            Placement::Root
        } else if self.shortest_path_to_root(None).is_empty() {
            Placement::Pending
        } else if self.is_edge() {
            Placement::Edge
        } else {
            Placement::Transit
        }
    }

    /// Whether this datapath is on the shortest path from `src` to `dst`
    #[must_use]
    pub fn is_in_path(&self, src: &str, dst: &str) -> bool {
        self.shortest_path(dst, Some(src)).contains(&self.name)
    }

    /// Up stack ports, in port number order
    #[must_use]
    pub fn canonical_up_ports(&self) -> Vec<&StackPort> {
        self.ports.values().filter(|p| p.is_up()).collect()
    }

    #[must_use]
    pub fn any_port_up(&self) -> bool {
        self.ports.values().any(StackPort::is_up)
    }

    /// Up stack ports towards the given datapath
    #[must_use]
    pub fn peer_up_ports(&self, peer_dp: &str) -> Vec<&StackPort> {
        self.ports
            .values()
            .filter(|p| p.is_up() && p.peer().dp == peer_dp)
            .collect()
    }

    /// The peer's ends of our up links to it, in port order
    #[must_use]
    pub fn peer_symmetric_up_ports(&self, peer_dp: &str) -> Vec<PortNo> {
        let mut ports: Vec<PortNo> = self
            .peer_up_ports(peer_dp)
            .into_iter()
            .map(|p| p.peer().port)
            .collect();
        ports.sort_unstable();
        ports
    }

    /// The first up port on the shortest path to `dst`
    #[must_use]
    pub fn shortest_path_port(&self, dst: &str) -> Option<PortNo> {
        let path = self.shortest_path(dst, None);
        let next = path.get(1)?;
        self.peer_up_ports(next).first().map(|p| p.number())
    }

    /// The port the adjacent datapath `peer_dp` would pick to reach us, seen from our side
    #[must_use]
    pub fn shortest_symmetric_path_port(&self, peer_dp: &str) -> Option<PortNo> {
        if self.shortest_path(&self.name, Some(peer_dp)).len() != 2 {
            return None;
        }
        self.peer_up_ports(peer_dp)
            .into_iter()
            .min_by_key(|p| p.peer().port)
            .map(StackPort::number)
    }

    #[must_use]
    pub fn topology_hash(&self) -> u64 {
        self.graph.topology_hash()
    }

    #[must_use]
    pub fn node_link_data(&self) -> NodeLinkData {
        self.graph.node_link_data()
    }

    /// Add or remove the link of a port of any datapath in the stack. Returns whether the graph
    /// changed.
    ///
    /// # Errors
    ///
    /// Fails if the port is not a stack port.
    pub fn modify_link(&mut self, dp: &str, port: PortNo, up: bool) -> Result<bool, StackError> {
        let link = self
            .links
            .get(&(dp.to_owned(), port))
            .ok_or_else(|| StackError::UnknownPort(dp.to_owned(), port.as_u32()))?;
        let changed = if up {
            self.graph.add_link(link.clone())
        } else {
            self.graph.remove_link(&link.key()).is_some()
        };
        if changed {
            debug!(
                "DP {}: stack link {} {}",
                self.name,
                link.key(),
                if up { "added" } else { "removed" }
            );
        }
        Ok(changed)
    }

    /// Re-evaluate every local stack port. New ports move to INIT.
    pub fn fast_state_expire(&mut self, now: Timestamp) -> Vec<StateChange> {
        self.ports
            .values_mut()
            .filter_map(|p| p.update(now))
            .collect()
    }

    /// Feed an LLDP beacon received on a local stack port
    ///
    /// # Errors
    ///
    /// Fails if the port is not a local stack port.
    pub fn verify_lldp(
        &mut self,
        now: Timestamp,
        port: PortNo,
        remote_dp_id: u64,
        remote_dp_name: &str,
        remote_port: u32,
        remote_state: StackPortState,
    ) -> Result<Option<StateChange>, StackError> {
        let name = self.name.clone();
        let sport = self
            .ports
            .get_mut(&port)
            .ok_or_else(|| StackError::UnknownPort(name, port.as_u32()))?;
        let change = sport.verify_lldp(now, remote_dp_id, remote_dp_name, remote_port, remote_state);
        if sport.state() == StackPortState::Bad {
            warn!("DP {}: stack port {port} is miscabled", self.name);
        }
        Ok(change)
    }
}

fn find_dp<'a>(dps: &'a [Dp], name: &str) -> Result<&'a Dp, StackError> {
    dps.iter()
        .find(|d| d.name == name)
        .ok_or_else(|| StackError::UnknownDp(name.to_owned()))
}
