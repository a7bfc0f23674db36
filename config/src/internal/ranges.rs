// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Parsing of interface range keys such as `1-4` or `1,3,5-7`

use std::collections::BTreeSet;

/// Upper bound on the number of ports a single range key may expand to
pub const MAX_RANGE_PORTS: usize = 4096;

/// Upper bound on the number of ports of a datapath
pub const MAX_DP_PORTS: usize = 4 * MAX_RANGE_PORTS;

/// Expand an interface range key into the set of port numbers it denotes.
/// Returns `None` if the key is malformed, a range is reversed, or the expansion is too large.
#[must_use]
pub fn parse_port_range(key: &str) -> Option<BTreeSet<u32>> {
    let mut ports = BTreeSet::new();
    for item in key.split(',').map(str::trim) {
        let (first, last) = match item.split_once('-') {
            Some((a, b)) => (a.trim().parse::<u32>().ok()?, b.trim().parse::<u32>().ok()?),
            None => {
                let n = item.parse::<u32>().ok()?;
                (n, n)
            }
        };
        if first > last || (last - first) as usize >= MAX_RANGE_PORTS {
            return None;
        }
        ports.extend(first..=last);
        if ports.len() > MAX_RANGE_PORTS {
            return None;
        }
    }
    Some(ports)
}
