// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-datapath forwarding decisions over the stack: which local ports lead towards the root,
//! which lead away from it, and where to send traffic for a given datapath.

use crate::election::DpLiveness;
use crate::errors::StackError;
use crate::port::StackPort;
use crate::topology::Stack;
use config::internal::Dp;
use net::openflow::PortNo;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct StackManager {
    stack: Stack,
    towards_root_ports: BTreeSet<PortNo>,
    chosen_towards_ports: BTreeSet<PortNo>,
    chosen_towards_port: Option<PortNo>,
    away_ports: BTreeSet<PortNo>,
    inactive_away_ports: BTreeSet<PortNo>,
    pruned_away_ports: BTreeSet<PortNo>,
}

impl StackManager {
    #[must_use]
    pub fn new(stack: Stack) -> Self {
        let mut manager = Self {
            stack,
            towards_root_ports: BTreeSet::new(),
            chosen_towards_ports: BTreeSet::new(),
            chosen_towards_port: None,
            away_ports: BTreeSet::new(),
            inactive_away_ports: BTreeSet::new(),
            pruned_away_ports: BTreeSet::new(),
        };
        manager.reset_peer_distances();
        manager
    }

    /// Resolve the stack of `name` and manage it. `None` if the datapath is not stacked.
    ///
    /// # Errors
    ///
    /// Fails if the stack does not resolve, see [`Stack::resolve`].
    pub fn resolve(
        dps: &[Dp],
        name: &str,
        root_hint: Option<&str>,
    ) -> Result<Option<Self>, StackError> {
        Ok(Stack::resolve(dps, name, root_hint)?.map(Self::new))
    }

    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }
    /// Mutable access to the stack, e.g. to feed LLDP. Call
    /// [`StackManager::reset_peer_distances`] once port states have changed.
    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }
    #[must_use]
    pub fn towards_root_ports(&self) -> &BTreeSet<PortNo> {
        &self.towards_root_ports
    }
    #[must_use]
    pub fn chosen_towards_ports(&self) -> &BTreeSet<PortNo> {
        &self.chosen_towards_ports
    }
    #[must_use]
    pub fn chosen_towards_port(&self) -> Option<PortNo> {
        self.chosen_towards_port
    }
    #[must_use]
    pub fn away_ports(&self) -> &BTreeSet<PortNo> {
        &self.away_ports
    }
    #[must_use]
    pub fn inactive_away_ports(&self) -> &BTreeSet<PortNo> {
        &self.inactive_away_ports
    }
    #[must_use]
    pub fn pruned_away_ports(&self) -> &BTreeSet<PortNo> {
        &self.pruned_away_ports
    }

    fn port_peer(&self, number: PortNo) -> Option<&str> {
        self.stack.port(number).map(|p| p.peer().dp.as_str())
    }

    /// Recompute the port roles from the up ports and the current graph. Returns the chosen
    /// towards-root ports.
    pub fn reset_peer_distances(&mut self) -> &BTreeSet<PortNo> {
        let stack = &self.stack;
        let up: Vec<&StackPort> = stack.canonical_up_ports();
        let all_up: BTreeSet<PortNo> = up.iter().map(|p| p.number()).collect();

        let mut towards = BTreeSet::new();
        let mut chosen = BTreeSet::new();
        if !stack.is_root() {
            let distances: BTreeMap<PortNo, usize> = up
                .iter()
                .filter_map(|p| {
                    let len = stack.shortest_path_to_root(Some(&p.peer().dp)).len();
                    (len > 0).then_some((p.number(), len))
                })
                .collect();
            if let Some(shortest) = distances.values().min().copied() {
                towards = distances
                    .iter()
                    .filter(|(_, d)| **d == shortest)
                    .map(|(p, _)| *p)
                    .collect();
            }
            let path = stack.shortest_path_to_root(None);
            let chosen_peer = path
                .get(1)
                .map(String::as_str)
                .or_else(|| towards.first().and_then(|p| self.port_peer(*p)));
            if let Some(chosen_peer) = chosen_peer {
                chosen = towards
                    .iter()
                    .copied()
                    .filter(|p| self.port_peer(*p) == Some(chosen_peer))
                    .collect();
            }
        }
        let away: BTreeSet<PortNo> = all_up.difference(&towards).copied().collect();

        // the root floods on every away port
        if stack.is_root() {
            self.commit(towards, chosen, away, BTreeSet::new(), BTreeSet::new());
            return &self.chosen_towards_ports;
        }

        let root = stack.root_name();
        let inactive_away = away
            .iter()
            .copied()
            .filter(|p| {
                self.port_peer(*p)
                    .is_some_and(|peer| !stack.is_in_path(peer, root))
            })
            .collect();

        // of several away links to the same datapath, only the one with the lowest remote port
        // floods
        let mut by_peer: BTreeMap<&str, Vec<(PortNo, PortNo)>> = BTreeMap::new();
        for port in away.iter().filter_map(|p| stack.port(*p)) {
            by_peer
                .entry(port.peer().dp.as_str())
                .or_default()
                .push((port.peer().port, port.number()));
        }
        let pruned_away = by_peer
            .into_values()
            .flat_map(|mut ports| {
                ports.sort_unstable();
                ports.into_iter().skip(1).map(|(_, local)| local)
            })
            .collect();

        self.commit(towards, chosen, away, inactive_away, pruned_away);
        &self.chosen_towards_ports
    }

    fn commit(
        &mut self,
        towards: BTreeSet<PortNo>,
        chosen: BTreeSet<PortNo>,
        away: BTreeSet<PortNo>,
        inactive_away: BTreeSet<PortNo>,
        pruned_away: BTreeSet<PortNo>,
    ) {
        debug!(
            "DP {}: towards {:?} chosen {:?} away {:?}",
            self.stack.name(),
            towards,
            chosen,
            away
        );
        self.chosen_towards_port = chosen.first().copied();
        self.towards_root_ports = towards;
        self.chosen_towards_ports = chosen;
        self.away_ports = away;
        self.inactive_away_ports = inactive_away;
        self.pruned_away_ports = pruned_away;
    }

    /// A stack port of datapath `dp` changed state: update the graph and, if it changed, the
    /// port roles. Returns whether the graph changed.
    ///
    /// # Errors
    ///
    /// Fails if the port is not a stack port.
    pub fn update_stack_topo(&mut self, up: bool, dp: &str, port: PortNo) -> Result<bool, StackError> {
        let changed = self.stack.modify_link(dp, port, up)?;
        if changed {
            self.reset_peer_distances();
        }
        Ok(changed)
    }

    /// The port on the shortest path to `dp`
    #[must_use]
    pub fn default_port_towards(&self, dp: &str) -> Option<PortNo> {
        self.stack.shortest_path_port(dp)
    }

    /// The port towards `dp` going through the root: away from the root if `dp` sits below us,
    /// towards the root otherwise.
    #[must_use]
    pub fn relative_port_towards(&self, dp: &str) -> Option<PortNo> {
        if self.stack.shortest_path_to_root(None).is_empty() || dp == self.stack.name() {
            return self.default_port_towards(dp);
        }
        let path_to_root = self.stack.shortest_path_to_root(Some(dp));
        if let Some(idx) = path_to_root.iter().position(|n| n == self.stack.name()) {
            let away_dp = path_to_root.get(idx.checked_sub(1)?)?;
            return self
                .away_ports
                .iter()
                .copied()
                .find(|p| self.port_peer(*p) == Some(away_dp.as_str()));
        }
        self.chosen_towards_ports
            .iter()
            .copied()
            .find(|p| self.stack.port(*p).is_some_and(StackPort::is_up))
    }

    /// Where to learn hosts of the edge datapath `edge_dp` on a VLAN
    #[must_use]
    pub fn edge_learn_port_towards(&self, edge_learn_stack_root: bool, edge_dp: &str) -> Option<PortNo> {
        if edge_learn_stack_root {
            self.relative_port_towards(edge_dp)
        } else {
            self.default_port_towards(edge_dp)
        }
    }

    /// Output port for tunnelled traffic from `src` to port `dst_port` of `dst`, if this datapath
    /// is on the way.
    #[must_use]
    pub fn tunnel_outport(&self, src: &str, dst: &str, dst_port: PortNo) -> Option<PortNo> {
        if !self.stack.is_in_path(src, dst) {
            return None;
        }
        if dst == self.stack.name() {
            return Some(dst_port);
        }
        self.stack.shortest_path_port(dst)
    }

    /// Liveness report of this datapath for root election
    #[must_use]
    pub fn liveness(&self, running: bool) -> DpLiveness {
        DpLiveness {
            name: self.stack.name().to_owned(),
            priority: self.stack.priority(),
            running,
            any_port_up: self.stack.any_port_up(),
            root_down_time_multiple: self.stack.root_down_time_multiple(),
            root_name: Some(self.stack.root_name().to_owned()),
        }
    }
}
