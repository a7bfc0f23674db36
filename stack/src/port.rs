// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Stack port states, driven by the LLDP beacons received from the peer.

use config::internal::{Dp, Port, StackPeer};
use net::openflow::{DpId, PortNo};
use std::fmt::Display;
use tracing::{debug, error, info};

/// Seconds, on whatever monotonic clock the caller uses
pub type Timestamp = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StackPortState {
    #[default]
    None,
    AdminDown,
    Init,
    Bad,
    Up,
    Gone,
}

impl Display for StackPortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StackPortState::None => "NONE",
            StackPortState::AdminDown => "ADMIN_DOWN",
            StackPortState::Init => "INIT",
            StackPortState::Bad => "BAD",
            StackPortState::Up => "UP",
            StackPortState::Gone => "GONE",
        };
        write!(f, "{s}")
    }
}

/// What the last LLDP beacon from the peer told us
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LldpProbe {
    pub last_seen: Timestamp,
    pub correct: bool,
    pub remote_dp_id: u64,
    pub remote_dp_name: String,
    pub remote_port: u32,
    pub remote_state: StackPortState,
}

/// A transition of a stack port
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateChange {
    pub port: PortNo,
    pub from: StackPortState,
    pub to: StackPortState,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackPort {
    number: PortNo,
    name: String,
    enabled: bool,
    peer: StackPeer,
    peer_dp_id: DpId,
    max_lldp_lost: u32,
    lldp_interval: u32,
    state: StackPortState,
    probe: Option<LldpProbe>,
}

impl StackPort {
    /// The stack port state of a configured port, or `None` if it is not a stack port.
    #[must_use]
    pub fn new(dp: &Dp, port: &Port, peer_dp_id: DpId) -> Option<Self> {
        let peer = port.stack.clone()?;
        Some(Self {
            number: port.number,
            name: port.name.clone(),
            enabled: port.enabled,
            peer,
            peer_dp_id,
            max_lldp_lost: port.max_lldp_lost,
            lldp_interval: dp.lldp_beacon.send_interval.max(1),
            state: StackPortState::None,
            probe: None,
        })
    }

    #[must_use]
    pub fn number(&self) -> PortNo {
        self.number
    }
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn peer(&self) -> &StackPeer {
        &self.peer
    }
    #[must_use]
    pub fn state(&self) -> StackPortState {
        self.state
    }
    #[must_use]
    pub fn probe(&self) -> Option<&LldpProbe> {
        self.probe.as_ref()
    }
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.state == StackPortState::Up
    }

    /// Whether the link this port is an end of may carry traffic: the port is up, or it is
    /// initializing while its peer already reports up.
    #[must_use]
    pub fn link_up(&self) -> bool {
        match self.state {
            StackPortState::Up => true,
            StackPortState::Init => self
                .probe
                .as_ref()
                .is_some_and(|p| p.remote_state == StackPortState::Up),
            _ => false,
        }
    }

    /// Force a state, bypassing LLDP. Returns the change, if any.
    pub fn set_state(&mut self, state: StackPortState, reason: &str) -> Option<StateChange> {
        if self.state == state {
            return None;
        }
        let change = StateChange {
            port: self.number,
            from: self.state,
            to: state,
            reason: reason.to_owned(),
        };
        info!(
            "Stack port {} ({}) {} -> {}: {}",
            self.number, self.name, change.from, change.to, reason
        );
        self.state = state;
        Some(change)
    }

    /// Record an LLDP beacon received on this port and re-evaluate the state.
    /// A beacon from a datapath or port other than the configured peer marks the port miscabled.
    pub fn verify_lldp(
        &mut self,
        now: Timestamp,
        remote_dp_id: u64,
        remote_dp_name: &str,
        remote_port: u32,
        remote_state: StackPortState,
    ) -> Option<StateChange> {
        let correct = remote_dp_id == self.peer_dp_id.as_u64()
            && remote_dp_name == self.peer.dp
            && remote_port == self.peer.port.as_u32();
        if !correct {
            error!(
                "Stack port {} cabling incorrect: expected {}:{} (dp_id {}), got {}:{} (dp_id {})",
                self.number,
                self.peer.dp,
                self.peer.port,
                self.peer_dp_id,
                remote_dp_name,
                remote_port,
                remote_dp_id
            );
        }
        self.probe = Some(LldpProbe {
            last_seen: now,
            correct,
            remote_dp_id,
            remote_dp_name: remote_dp_name.to_owned(),
            remote_port,
            remote_state,
        });
        self.update(now)
    }

    /// Re-evaluate the state from the last probe
    pub fn update(&mut self, now: Timestamp) -> Option<StateChange> {
        if !self.enabled {
            return self.set_state(StackPortState::AdminDown, "port administratively down");
        }
        let Some(probe) = &self.probe else {
            if matches!(self.state, StackPortState::None | StackPortState::AdminDown) {
                return self.set_state(StackPortState::Init, "new stack port");
            }
            return None;
        };
        let lost = now.saturating_sub(probe.last_seen) / u64::from(self.lldp_interval);
        let (next, reason) = if lost > u64::from(self.max_lldp_lost) {
            (
                StackPortState::Gone,
                format!("too many ({lost}) LLDP packets lost"),
            )
        } else if !probe.correct {
            (StackPortState::Bad, "remote DP/port incorrect".to_owned())
        } else if matches!(
            probe.remote_state,
            StackPortState::Up | StackPortState::Init
        ) {
            (StackPortState::Up, "port is up".to_owned())
        } else {
            (StackPortState::Init, "remote port not up".to_owned())
        };
        debug!("Stack port {}: {lost} beacons lost", self.number);
        self.set_state(next, &reason)
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
    lldp_beacon: {send_interval: 5}
    interfaces:
      1: {stack: {dp: sw2, port: 2}, max_lldp_lost: 3}
  sw2:
    dp_id: 2
    interfaces:
      2: {stack: {dp: sw1, port: 1}}
";

    fn stack_port() -> StackPort {
        let dps = parse_str(PAIR).unwrap();
        let sw1 = &dps[0];
        let port = sw1.port(PortNo::new(1).unwrap()).unwrap();
        StackPort::new(sw1, port, dps[1].dp_id).unwrap()
    }

    #[test]
    fn test_new_port_initializes() {
        let mut port = stack_port();
        assert_eq!(port.state(), StackPortState::None);
        let change = port.update(0).unwrap();
        assert_eq!(change.to, StackPortState::Init);
        assert!(port.update(100).is_none());
        assert!(!port.link_up());
    }

    #[test]
    fn test_lldp_brings_port_up_and_down() {
        let mut port = stack_port();
        port.update(0);
        port.verify_lldp(10, 2, "sw2", 2, StackPortState::None);
        assert_eq!(port.state(), StackPortState::Init);
        port.verify_lldp(15, 2, "sw2", 2, StackPortState::Init);
        assert_eq!(port.state(), StackPortState::Up);
        assert!(port.link_up());

        // three beacons lost is tolerated, the fourth is not
        assert!(port.update(15 + 19).is_none());
        let change = port.update(15 + 20).unwrap();
        assert_eq!(change.to, StackPortState::Gone);
        assert!(!port.link_up());
    }

    #[test]
    fn test_miscabled_port_is_bad() {
        let mut port = stack_port();
        port.verify_lldp(1, 2, "sw2", 3, StackPortState::Up);
        assert_eq!(port.state(), StackPortState::Bad);
        assert!(!port.probe().unwrap().correct);
        port.verify_lldp(2, 2, "sw2", 2, StackPortState::Up);
        assert_eq!(port.state(), StackPortState::Up);
    }

    #[test]
    fn test_init_port_with_up_peer_carries_traffic() {
        let mut port = stack_port();
        port.verify_lldp(1, 2, "sw2", 2, StackPortState::Up);
        port.set_state(StackPortState::Init, "test");
        assert!(port.link_up());
    }

    #[test]
    fn test_disabled_port() {
        let dps = parse_str(&PAIR.replace("max_lldp_lost: 3", "max_lldp_lost: 3, enabled: false")).unwrap();
        let sw1 = &dps[0];
        let mut port = StackPort::new(sw1, sw1.port(PortNo::new(1).unwrap()).unwrap(), dps[1].dp_id).unwrap();
        port.verify_lldp(1, 2, "sw2", 2, StackPortState::Up);
        assert_eq!(port.state(), StackPortState::AdminDown);
    }
}
