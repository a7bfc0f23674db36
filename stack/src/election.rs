// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Stack root election among the root candidates, based on how recently each datapath was seen
//! running and whether it has any stack port up.

use crate::port::Timestamp;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Interval between root health checks, in seconds
pub const STACK_ROOT_STATE_UPDATE_TIME: Timestamp = 10;

/// What the election needs to know about a datapath
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DpLiveness {
    pub name: String,
    pub priority: Option<u32>,
    pub running: bool,
    pub any_port_up: bool,
    pub root_down_time_multiple: u32,
    /// The root this datapath currently resolves, if stacked
    pub root_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RootChange {
    Unchanged,
    Changed { from: Option<String>, to: String },
    /// The root did not change, but these datapaths resolved a different one
    Inconsistent(Vec<String>),
}

#[derive(Clone, Debug, Default)]
pub struct RootElection {
    root: Option<String>,
    last_live: BTreeMap<String, Timestamp>,
}

impl RootElection {
    #[must_use]
    pub fn new(root: Option<&str>) -> Self {
        Self {
            root: root.map(str::to_owned),
            last_live: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    #[must_use]
    pub fn last_live(&self, name: &str) -> Option<Timestamp> {
        self.last_live.get(name).copied()
    }

    fn is_healthy(&self, now: Timestamp, dp: &DpLiveness) -> bool {
        let timeout = u64::from(dp.root_down_time_multiple) * STACK_ROOT_STATE_UPDATE_TIME;
        let live = self
            .last_live
            .get(&dp.name)
            .is_some_and(|last| now.saturating_sub(*last) <= timeout);
        live && dp.any_port_up
    }

    /// Record which datapaths are running and pick the root.
    pub fn maintain(&mut self, now: Timestamp, dps: &[DpLiveness]) -> RootChange {
        for dp in dps.iter().filter(|d| d.running) {
            self.last_live.insert(dp.name.clone(), now);
        }
        let mut candidates: Vec<&DpLiveness> = dps.iter().filter(|d| d.priority.is_some()).collect();
        candidates.sort_by(|a, b| (a.priority, &a.name).cmp(&(b.priority, &b.name)));
        let Some(first) = candidates.first() else {
            return RootChange::Unchanged;
        };
        let healthy: Vec<&str> = candidates
            .iter()
            .filter(|d| self.is_healthy(now, d))
            .map(|d| d.name.as_str())
            .collect();

        let new_root = match (healthy.first(), self.root.as_deref()) {
            (None, _) => {
                warn!("No healthy stack root candidates, using {}", first.name);
                first.name.as_str()
            }
            (Some(_), Some(current)) if healthy.contains(&current) => current,
            (Some(best), _) => *best,
        }
        .to_owned();

        if self.root.as_deref() != Some(new_root.as_str()) {
            info!(
                "Stack root changed from {} to {new_root}",
                self.root.as_deref().unwrap_or("none")
            );
            let from = self.root.replace(new_root.clone());
            return RootChange::Changed { from, to: new_root };
        }
        let inconsistent: Vec<String> = dps
            .iter()
            .filter(|d| d.root_name.as_ref().is_some_and(|r| *r != new_root))
            .map(|d| d.name.clone())
            .collect();
        if inconsistent.is_empty() {
            RootChange::Unchanged
        } else {
            warn!("Inconsistent stack roots on {}", inconsistent.join(", "));
            RootChange::Inconsistent(inconsistent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dp(name: &str, priority: Option<u32>, running: bool, up: bool) -> DpLiveness {
        DpLiveness {
            name: name.to_owned(),
            priority,
            running,
            any_port_up: up,
            root_down_time_multiple: 3,
            root_name: None,
        }
    }

    #[test]
    fn test_first_healthy_candidate_wins() {
        let mut election = RootElection::default();
        let dps = [
            dp("s1", Some(1), true, true),
            dp("s2", Some(2), true, true),
            dp("s3", None, true, true),
        ];
        assert_eq!(
            election.maintain(0, &dps),
            RootChange::Changed {
                from: None,
                to: "s1".to_owned()
            }
        );
        assert_eq!(election.maintain(10, &dps), RootChange::Unchanged);
        assert_eq!(election.last_live("s3"), Some(10));
    }

    #[test]
    fn test_failover_and_stickiness() {
        let mut election = RootElection::new(Some("s1"));
        let mut dps = vec![dp("s1", Some(1), true, true), dp("s2", Some(2), true, true)];
        election.maintain(0, &dps);

        // s1 stops running: healthy until the timeout of 3 * 10s expires
        dps[0].running = false;
        assert_eq!(election.maintain(30, &dps), RootChange::Unchanged);
        assert_eq!(
            election.maintain(31, &dps),
            RootChange::Changed {
                from: Some("s1".to_owned()),
                to: "s2".to_owned()
            }
        );

        // s1 comes back but s2 stays root while healthy
        dps[0].running = true;
        assert_eq!(election.maintain(40, &dps), RootChange::Unchanged);
        assert_eq!(election.root(), Some("s2"));
    }

    #[test]
    fn test_no_healthy_candidate() {
        let mut election = RootElection::new(Some("s2"));
        let dps = [dp("s1", Some(1), true, false), dp("s2", Some(2), true, false)];
        assert_eq!(
            election.maintain(0, &dps),
            RootChange::Changed {
                from: Some("s2".to_owned()),
                to: "s1".to_owned()
            }
        );
    }

    #[test]
    fn test_inconsistent_roots() {
        let mut election = RootElection::new(Some("s1"));
        let mut stale = dp("s3", None, true, true);
        stale.root_name = Some("s2".to_owned());
        let dps = [dp("s1", Some(1), true, true), stale];
        assert_eq!(
            election.maintain(0, &dps),
            RootChange::Inconsistent(vec!["s3".to_owned()])
        );
    }
}
