// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The plan that builds an emulated network of OVS bridges and host namespaces for a
//! validated config, and the plan that tears it down.

use config::Dp;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::bridge::{Bridge, PatchPort, patch_ports};
use crate::builder::{CommandPlan, MARKER, Render};
use crate::errors::RenderError;
use crate::host::{Host, HostAddressing, is_host_port};
use crate::params::PlanParams;

/// Everything to provision for a set of datapaths
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkPlan {
    pub bridges: Vec<Bridge>,
    pub patches: Vec<PatchPort>,
    pub hosts: Vec<Host>,
}

impl NetworkPlan {
    pub fn new(dps: &[Dp]) -> Result<Self, RenderError> {
        let mut plan = NetworkPlan::default();
        let mut addressing = HostAddressing::new(dps)?;
        let mut names = BTreeSet::new();
        for dp in dps {
            plan.bridges.push(Bridge::new(dp)?);
            plan.patches.extend(patch_ports(dp, dps)?);
            for port in dp.ports.values() {
                if !is_host_port(port) {
                    debug!("DP {}: no host on port {}", dp.name, port.number);
                    continue;
                }
                let host = Host::new(dp, port, &mut addressing)?;
                if !names.insert(host.name.clone()) {
                    return Err(RenderError::DuplicateHost(host.name));
                }
                plan.hosts.push(host);
            }
        }
        info!(
            "Planned {} bridges, {} patch ports and {} hosts",
            plan.bridges.len(),
            plan.patches.len(),
            plan.hosts.len()
        );
        Ok(plan)
    }

    /// Commands removing whatever this plan creates
    #[must_use]
    pub fn cleanup(&self) -> CommandPlan {
        let mut plan = CommandPlan::new();
        plan += MARKER;
        plan.comment("cleanup");
        for host in &self.hosts {
            plan += format!("ip netns del {} 2>/dev/null || true", host.name);
            plan += format!("ip link del dev {} 2>/dev/null || true", host.veth);
        }
        for bridge in &self.bridges {
            plan += format!("ovs-vsctl --if-exists del-br {}", bridge.name);
        }
        plan
    }
}

impl Render for NetworkPlan {
    type Context = PlanParams;
    type Output = CommandPlan;
    fn render(&self, params: &PlanParams) -> CommandPlan {
        let mut plan = CommandPlan::new();
        for bridge in &self.bridges {
            plan += bridge.render(params);
            for patch in self.patches.iter().filter(|p| p.bridge == bridge.name) {
                plan += patch.render(&());
            }
        }
        for host in &self.hosts {
            plan += host.render(&());
        }
        plan += MARKER;
        plan
    }
}
