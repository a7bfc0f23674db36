// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Plan renderer: OVS bridges and the patch ports standing in for stack links

use config::Dp;
use net::interface::InterfaceName;
use net::openflow::{DpId, PortNo};
use tracing::debug;

use crate::builder::{CommandPlan, MARKER, Render};
use crate::errors::RenderError;
use crate::params::PlanParams;

/// Patch ports between two bridges are told apart by a letter
pub const MAX_PATCHES: usize = 26;

pub(crate) fn interface_name(dp: &Dp, name: String) -> Result<InterfaceName, RenderError> {
    InterfaceName::try_from(name).map_err(|e| RenderError::InterfaceName(dp.name.clone(), e))
}

/// The OVS bridge of a datapath
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bridge {
    pub name: InterfaceName,
    pub dp_name: String,
    pub dp_id: DpId,
}

impl Bridge {
    pub fn new(dp: &Dp) -> Result<Self, RenderError> {
        Ok(Self {
            name: bridge_name(dp)?,
            dp_name: dp.name.clone(),
            dp_id: dp.dp_id,
        })
    }
}

pub(crate) fn bridge_name(dp: &Dp) -> Result<InterfaceName, RenderError> {
    interface_name(dp, format!("br{}", dp.dp_id))
}

impl Render for Bridge {
    type Context = PlanParams;
    type Output = CommandPlan;
    fn render(&self, params: &PlanParams) -> CommandPlan {
        let br = &self.name;
        let mut plan = CommandPlan::new();
        plan += MARKER;
        plan.comment(format_args!("bridge {br} for DP {}", self.dp_name));
        plan += format!(
            "ovs-vsctl --may-exist add-br {br} -- set bridge {br} other-config:datapath-id={}",
            self.dp_id.to_hex()
        );
        plan += format!("ovs-vsctl set bridge {br} protocols={}", params.protocols);
        plan += format!("ovs-vsctl set-fail-mode {br} {}", params.fail_mode);
        plan += format!(
            "ovs-vsctl set-controller {br} {}",
            params.controller_target()
        );
        plan
    }
}

/// One end of a stack link, as an OVS patch port
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchPort {
    pub bridge: InterfaceName,
    pub name: InterfaceName,
    /// The patch port at the other end of the link
    pub peer: InterfaceName,
    pub ofport: PortNo,
}

/// Key identifying a link between two DPs regardless of the side it is seen from
fn canonical(dp_id: DpId, port: PortNo, peer_id: DpId, peer_port: PortNo) -> (PortNo, PortNo) {
    if dp_id < peer_id {
        (port, peer_port)
    } else {
        (peer_port, port)
    }
}

fn patch_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| usize::from(*i) < MAX_PATCHES)
        .map(|i| char::from(b'a' + i))
}

/// The patch ports of the stack ports of `dp`. Both ends of a link get the same letter, so
/// that patch `<dpid>_<peerid><x>` peers with `<peerid>_<dpid><x>`.
pub fn patch_ports(dp: &Dp, dps: &[Dp]) -> Result<Vec<PatchPort>, RenderError> {
    let bridge = bridge_name(dp)?;
    let mut patches = vec![];
    for port in dp.stack_ports() {
        let Some(peer) = &port.stack else {
            continue;
        };
        let Some(peer_dp) = dps.iter().find(|d| d.name == peer.dp) else {
            return Err(RenderError::NoSuchPeer {
                dp: dp.name.clone(),
                port: port.number.as_u32(),
                peer: peer.dp.clone(),
            });
        };
        if peer_dp.dp_id == dp.dp_id {
            return Err(RenderError::SelfLink(dp.name.clone(), port.number.as_u32()));
        }
        let mut links: Vec<(PortNo, PortNo)> = dp
            .stack_ports()
            .filter_map(|p| p.stack.as_ref().map(|s| (p.number, s)))
            .filter(|(_, s)| s.dp == peer.dp)
            .map(|(n, s)| canonical(dp.dp_id, n, peer_dp.dp_id, s.port))
            .collect();
        links.sort_unstable();
        let key = canonical(dp.dp_id, port.number, peer_dp.dp_id, peer.port);
        let letter = links
            .iter()
            .position(|l| *l == key)
            .and_then(patch_letter)
            .ok_or_else(|| RenderError::TooManyPatches(dp.name.clone(), peer.dp.clone()))?;
        let name = interface_name(dp, format!("{}_{}{letter}", dp.dp_id, peer_dp.dp_id))?;
        let peer_name = interface_name(dp, format!("{}_{}{letter}", peer_dp.dp_id, dp.dp_id))?;
        debug!("DP {}: port {} patched as {name} <-> {peer_name}", dp.name, port.number);
        patches.push(PatchPort {
            bridge: bridge.clone(),
            name,
            peer: peer_name,
            ofport: port.number,
        });
    }
    Ok(patches)
}

impl Render for PatchPort {
    type Context = ();
    type Output = CommandPlan;
    fn render(&self, _ctx: &Self::Context) -> CommandPlan {
        let mut plan = CommandPlan::new();
        plan += format!(
            "ovs-vsctl add-port {} {} -- set interface {} type=patch options:peer={} ofport_request={}",
            self.bridge, self.name, self.name, self.peer, self.ofport
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::parse_str;
    use pretty_assertions::assert_eq;

    const PAIR: &str = r"
dps:
  sw1:
    dp_id: 1
    stack: {priority: 1}
    interfaces:
      1: {native_vlan: 100}
      7: {stack: {dp: sw2, port: 3}}
      8: {stack: {dp: sw2, port: 2}}
  sw2:
    dp_id: 2
    interfaces:
      1: {native_vlan: 100}
      2: {stack: {dp: sw1, port: 8}}
      3: {stack: {dp: sw1, port: 7}}
";

    #[test]
    fn test_bridge() {
        let dps = parse_str(PAIR).unwrap();
        let bridge = Bridge::new(&dps[1]).unwrap();
        assert_eq!(bridge.name.as_ref(), "br2");
        let plan = bridge.render(&PlanParams::default());
        assert_eq!(
            plan.commands().collect::<Vec<_>>(),
            vec![
                "ovs-vsctl --may-exist add-br br2 -- set bridge br2 other-config:datapath-id=0000000000000002",
                "ovs-vsctl set bridge br2 protocols=OpenFlow13",
                "ovs-vsctl set-fail-mode br2 secure",
                "ovs-vsctl set-controller br2 tcp:127.0.0.1:6653",
            ]
        );
    }

    #[test]
    fn test_patch_letters_agree() {
        let dps = parse_str(PAIR).unwrap();
        let sw1 = patch_ports(&dps[0], &dps).unwrap();
        let sw2 = patch_ports(&dps[1], &dps).unwrap();
        let names = |p: &[PatchPort]| -> Vec<(String, String, u32)> {
            p.iter()
                .map(|p| (p.name.to_string(), p.peer.to_string(), p.ofport.as_u32()))
                .collect()
        };
        // sw1:7 <-> sw2:3 sorts first from both sides
        assert_eq!(
            names(&sw1),
            vec![
                ("1_2a".to_owned(), "2_1a".to_owned(), 7),
                ("1_2b".to_owned(), "2_1b".to_owned(), 8)
            ]
        );
        assert_eq!(
            names(&sw2),
            vec![
                ("2_1b".to_owned(), "1_2b".to_owned(), 2),
                ("2_1a".to_owned(), "1_2a".to_owned(), 3)
            ]
        );
        assert_eq!(
            sw1[0].render(&()).to_string(),
            "ovs-vsctl add-port br1 1_2a -- set interface 1_2a type=patch options:peer=2_1a ofport_request=7\n"
        );
    }

    #[test]
    fn test_long_dp_ids_are_rejected() {
        let yaml = PAIR.replace("dp_id: 2", "dp_id: 12345678901234");
        let dps = parse_str(&yaml).unwrap();
        assert!(matches!(
            Bridge::new(&dps[1]),
            Err(RenderError::InterfaceName(dp, _)) if dp == "sw2"
        ));
    }

    #[test]
    fn test_patch_letter() {
        assert_eq!(patch_letter(0), Some('a'));
        assert_eq!(patch_letter(25), Some('z'));
        assert_eq!(patch_letter(26), None);
    }
}
