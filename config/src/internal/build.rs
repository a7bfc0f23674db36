// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Validation of the external document and construction of the internal [`Dp`] model.

use net::openflow::{DpId, PortNo};
use net::vlan::Vid;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::external::dp::{DpConf, InterfaceConf, PortRef, StackLinkConf};
use crate::external::vlan::{VlanConf, VlanRef};
use crate::external::FaucetConfig;
use crate::internal::acl::{Acl, check_acl};
use crate::internal::ranges::{MAX_DP_PORTS, parse_port_range};
use crate::internal::{Dp, DpStack, LldpBeacon, Port, Router, StackPeer, Vlan};
use crate::{ConfigError, ConfigResult};

/// Hardware types a datapath may declare
pub const SUPPORTED_HARDWARE: [&str; 9] = [
    "Open vSwitch",
    "Allied-Telesis",
    "Aruba",
    "GenericTFM",
    "Lagopus",
    "Netronome",
    "NoviFlow",
    "ZodiacFX",
    "ZodiacGX",
];

/// Declared VLANs, indexed by name and by vid
struct VlanTable {
    by_name: BTreeMap<String, Vlan>,
    by_vid: BTreeMap<Vid, String>,
}

impl VlanTable {
    fn new(conf: &FaucetConfig) -> Result<Self, ConfigError> {
        let mut table = VlanTable {
            by_name: BTreeMap::new(),
            by_vid: BTreeMap::new(),
        };
        for (name, vconf) in &conf.vlans {
            let vlan = build_vlan(name, vconf, conf)?;
            if let Some(other) = table.by_vid.insert(vlan.vid, name.clone()) {
                return Err(ConfigError::DuplicateVid(other, name.clone(), vlan.vid.as_u16()));
            }
            table.by_name.insert(name.clone(), vlan);
        }
        Ok(table)
    }

    /// Resolve a VLAN reference. A vid with no declared VLAN is legal and denotes an implicit
    /// VLAN.
    fn resolve(&self, referrer: &str, vref: &VlanRef) -> Result<Vid, ConfigError> {
        match vref {
            VlanRef::Name(name) => self
                .by_name
                .get(name)
                .map(|v| v.vid)
                .ok_or_else(|| ConfigError::NoSuchVlan(referrer.to_owned(), name.clone())),
            VlanRef::Vid(raw) => {
                Vid::new(*raw).map_err(|e| ConfigError::InvalidVid(referrer.to_owned(), e))
            }
        }
    }

    fn get(&self, vid: Vid) -> Vlan {
        self.by_vid
            .get(&vid)
            .and_then(|name| self.by_name.get(name))
            .cloned()
            .unwrap_or_else(|| Vlan::implicit(vid))
    }
}

fn acl_refs(single: Option<&String>, many: &[String]) -> Vec<String> {
    single.iter().copied().chain(many.iter()).cloned().collect()
}

fn check_acl_refs(referrer: &str, acls: &[String], conf: &FaucetConfig) -> ConfigResult {
    match acls.iter().find(|acl| !conf.acls.contains_key(*acl)) {
        Some(missing) => Err(ConfigError::NoSuchAcl(referrer.to_owned(), missing.clone())),
        None => Ok(()),
    }
}

fn build_vlan(name: &str, vconf: &VlanConf, conf: &FaucetConfig) -> Result<Vlan, ConfigError> {
    let vid = Vid::new(vconf.vid).map_err(|e| ConfigError::InvalidVid(name.to_owned(), e))?;
    if let Some(mac) = vconf.faucet_mac
        && mac.valid_unicast_dst().is_err()
    {
        return Err(ConfigError::InvalidFaucetMac(name.to_owned(), mac));
    }
    let acls_in = acl_refs(vconf.acl_in.as_ref(), &vconf.acls_in);
    check_acl_refs(&format!("VLAN {name}"), &acls_in, conf)?;
    Ok(Vlan {
        name: name.to_owned(),
        vid,
        description: vconf.description.clone(),
        faucet_vips: vconf.faucet_vips.clone(),
        faucet_mac: vconf.faucet_mac,
        acls_in,
        max_hosts: vconf.max_hosts,
        unicast_flood: vconf.unicast_flood,
        edge_learn_stack_root: vconf.edge_learn_stack_root,
        implicit: false,
    })
}

fn build_routers(
    conf: &FaucetConfig,
    vlans: &VlanTable,
) -> Result<BTreeMap<String, Router>, ConfigError> {
    let mut routers = BTreeMap::new();
    for (name, rconf) in &conf.routers {
        if rconf.vlans.is_empty() {
            return Err(ConfigError::EmptyRouter(name.clone()));
        }
        let referrer = format!("router {name}");
        let vids = rconf
            .vlans
            .iter()
            .map(|v| vlans.resolve(&referrer, v))
            .collect::<Result<Vec<_>, _>>()?;
        routers.insert(
            name.clone(),
            Router {
                name: name.clone(),
                vlans: vids,
            },
        );
    }
    Ok(routers)
}

/// A stack link as written, resolved once all datapaths are built
struct PendingLink {
    dp: String,
    port: PortNo,
    link: StackLinkConf,
}

fn build_port(
    dp: &str,
    number: u32,
    name: String,
    iface: &InterfaceConf,
    vlans: &VlanTable,
    conf: &FaucetConfig,
) -> Result<Port, ConfigError> {
    let number = PortNo::new(number).map_err(|e| ConfigError::InvalidPortNo(dp.to_owned(), e))?;
    let referrer = format!("DP {dp} port {number}");

    let native_vlan = iface
        .native_vlan
        .as_ref()
        .map(|v| vlans.resolve(&referrer, v))
        .transpose()?;
    let mut tagged_vlans = Vec::with_capacity(iface.tagged_vlans.len());
    for vref in &iface.tagged_vlans {
        let vid = vlans.resolve(&referrer, vref)?;
        if native_vlan == Some(vid) {
            return Err(ConfigError::NativeVlanTagged {
                dp: dp.to_owned(),
                port: number.as_u32(),
                vid: vid.as_u16(),
            });
        }
        if tagged_vlans.contains(&vid) {
            return Err(ConfigError::DuplicateTaggedVlan {
                dp: dp.to_owned(),
                port: number.as_u32(),
                vid: vid.as_u16(),
            });
        }
        tagged_vlans.push(vid);
    }
    if iface.stack.is_some() && (native_vlan.is_some() || !tagged_vlans.is_empty()) {
        return Err(ConfigError::StackPortWithVlans {
            dp: dp.to_owned(),
            port: number.as_u32(),
        });
    }
    let acls_in = acl_refs(iface.acl_in.as_ref(), &iface.acls_in);
    check_acl_refs(&referrer, &acls_in, conf)?;

    Ok(Port {
        number,
        name,
        description: iface.description.clone(),
        enabled: iface.enabled,
        native_vlan,
        tagged_vlans,
        acls_in,
        stack: None,
        output_only: iface.output_only,
        max_lldp_lost: iface.max_lldp_lost,
    })
}

fn build_ports(
    dp: &str,
    dconf: &DpConf,
    vlans: &VlanTable,
    conf: &FaucetConfig,
    pending: &mut Vec<PendingLink>,
) -> Result<BTreeMap<PortNo, Port>, ConfigError> {
    let mut ports: BTreeMap<PortNo, Port> = BTreeMap::new();
    let mut links = vec![];

    for (key, iface) in &dconf.interfaces {
        let (number, default_name) = match key {
            PortRef::Number(n) => {
                if let Some(declared) = iface.number
                    && declared != *n
                {
                    return Err(ConfigError::PortNumberMismatch {
                        dp: dp.to_owned(),
                        key: *n,
                        number: declared,
                    });
                }
                (*n, n.to_string())
            }
            PortRef::Name(name) => {
                let number = iface.number.ok_or_else(|| ConfigError::MissingPortNumber {
                    dp: dp.to_owned(),
                    port: name.clone(),
                })?;
                (number, name.clone())
            }
        };
        let name = iface.name.clone().unwrap_or(default_name);
        let port = build_port(dp, number, name, iface, vlans, conf)?;
        if ports.contains_key(&port.number) {
            return Err(ConfigError::DuplicatePortNumber(dp.to_owned(), number));
        }
        if let Some(link) = &iface.stack {
            links.push((port.number, link.clone()));
        }
        ports.insert(port.number, port);
    }

    for (key, iface) in &dconf.interface_ranges {
        if iface.name.is_some() || iface.number.is_some() {
            return Err(ConfigError::NamedPortRange(dp.to_owned(), key.clone()));
        }
        let numbers = parse_port_range(key)
            .ok_or_else(|| ConfigError::InvalidPortRange(dp.to_owned(), key.clone()))?;
        for number in numbers {
            let Ok(port_no) = PortNo::new(number) else {
                return Err(ConfigError::InvalidPortRange(dp.to_owned(), key.clone()));
            };
            if ports.contains_key(&port_no) {
                continue;
            }
            if ports.len() >= MAX_DP_PORTS {
                return Err(ConfigError::TooManyPorts(dp.to_owned(), MAX_DP_PORTS));
            }
            let port = build_port(dp, number, number.to_string(), iface, vlans, conf)?;
            if let Some(link) = &iface.stack {
                links.push((port.number, link.clone()));
            }
            ports.insert(port.number, port);
        }
    }

    let mut names = BTreeSet::new();
    for port in ports.values() {
        if !names.insert(port.name.as_str()) {
            return Err(ConfigError::DuplicatePortName(
                dp.to_owned(),
                port.name.clone(),
            ));
        }
    }
    pending.extend(links.into_iter().map(|(port, link)| PendingLink {
        dp: dp.to_owned(),
        port,
        link,
    }));
    Ok(ports)
}

fn build_dp(
    name: &str,
    dconf: &DpConf,
    vlans: &VlanTable,
    routers: &BTreeMap<String, Router>,
    conf: &FaucetConfig,
    pending: &mut Vec<PendingLink>,
) -> Result<Dp, ConfigError> {
    let dp_id = DpId::new(dconf.dp_id).map_err(|e| ConfigError::InvalidDpId(name.to_owned(), e))?;
    if !SUPPORTED_HARDWARE.contains(&dconf.hardware.as_str()) {
        return Err(ConfigError::UnsupportedHardware(
            name.to_owned(),
            dconf.hardware.clone(),
        ));
    }
    let stack = match &dconf.stack {
        Some(s) if s.priority == Some(0) => {
            return Err(ConfigError::InvalidStackPriority(name.to_owned()));
        }
        Some(s) => Some(DpStack {
            priority: s.priority,
            route_learning: s.route_learning,
            root_down_time_multiple: s.root_down_time_multiple,
        }),
        None => None,
    };
    let lldp_beacon = dconf
        .lldp_beacon
        .as_ref()
        .map_or(
            LldpBeacon {
                send_interval: 5,
                max_per_interval: 5,
            },
            |l| LldpBeacon {
                send_interval: l.send_interval,
                max_per_interval: l.max_per_interval,
            },
        );
    let ports = build_ports(name, dconf, vlans, conf, pending)?;

    // VLANs used by ports, then the VLANs of routers touching any of them
    let mut dp_vlans: BTreeMap<Vid, Vlan> = BTreeMap::new();
    for vid in ports.values().flat_map(Port::vlans) {
        dp_vlans.entry(vid).or_insert_with(|| vlans.get(vid));
    }
    let dp_routers: BTreeMap<String, Router> = routers
        .iter()
        .filter(|(_, r)| r.vlans.iter().any(|vid| dp_vlans.contains_key(vid)))
        .map(|(n, r)| (n.clone(), r.clone()))
        .collect();
    for vid in dp_routers.values().flat_map(|r| r.vlans.iter()) {
        dp_vlans.entry(*vid).or_insert_with(|| vlans.get(*vid));
    }

    // ACLs applied on this datapath, resolved against its ports
    let acl_names: BTreeSet<&String> = ports
        .values()
        .flat_map(|p| p.acls_in.iter())
        .chain(dp_vlans.values().flat_map(|v| v.acls_in.iter()))
        .collect();
    let mut acls = BTreeMap::new();
    for acl in acl_names {
        if let Some(aconf) = conf.acls.get(acl) {
            acls.insert(acl.clone(), Acl::resolve(acl, aconf, name, &ports)?);
        }
    }

    debug!(
        "Built DP {name} ({dp_id}): {} ports, {} vlans, {} acls",
        ports.len(),
        dp_vlans.len(),
        acls.len()
    );
    Ok(Dp {
        name: name.to_owned(),
        dp_id,
        hardware: dconf.hardware.clone(),
        description: dconf.description.clone(),
        stack,
        lldp_beacon,
        ports,
        vlans: dp_vlans,
        acls,
        routers: dp_routers,
    })
}

fn resolve_peer_port(peer: &Dp, port: &PortRef) -> Option<PortNo> {
    match port {
        PortRef::Number(n) => PortNo::new(*n).ok().filter(|n| peer.ports.contains_key(n)),
        PortRef::Name(name) => peer.port_by_name(name).map(|p| p.number),
    }
}

fn link_stack_ports(dps: &mut BTreeMap<String, Dp>, pending: Vec<PendingLink>) -> ConfigResult {
    for p in pending {
        let Some(peer) = dps.get(&p.link.dp) else {
            return Err(ConfigError::NoSuchStackDp {
                dp: p.dp,
                port: p.port.as_u32(),
                peer: p.link.dp,
            });
        };
        let Some(peer_port) = resolve_peer_port(peer, &p.link.port) else {
            return Err(ConfigError::NoSuchStackPort {
                dp: p.dp,
                port: p.port.as_u32(),
                peer: p.link.dp,
                peer_port: p.link.port.to_string(),
            });
        };
        if p.link.dp == p.dp && peer_port == p.port {
            return Err(ConfigError::StackPeerMismatch {
                dp: p.dp,
                port: p.port.as_u32(),
                peer: p.link.dp,
                peer_port: peer_port.as_u32(),
            });
        }
        if let Some(port) = dps.get_mut(&p.dp).and_then(|dp| dp.ports.get_mut(&p.port)) {
            port.stack = Some(StackPeer {
                dp: p.link.dp,
                port: peer_port,
            });
        }
    }

    // every stack port must be pointed back at by its peer
    for dp in dps.values() {
        for port in dp.stack_ports() {
            let Some(peer) = &port.stack else { continue };
            let reciprocated = dps
                .get(&peer.dp)
                .and_then(|d| d.port(peer.port))
                .and_then(|p| p.stack.as_ref())
                .is_some_and(|back| back.dp == dp.name && back.port == port.number);
            if !reciprocated {
                return Err(ConfigError::StackPeerMismatch {
                    dp: dp.name.clone(),
                    port: port.number.as_u32(),
                    peer: peer.dp.clone(),
                    peer_port: peer.port.as_u32(),
                });
            }
        }
    }
    Ok(())
}

/// Datapaths with stack ports must form one stack, connected to the preferred root candidate.
fn check_stack_topology(dps: &BTreeMap<String, Dp>) -> ConfigResult {
    if !dps.values().any(Dp::has_stack_ports) {
        return Ok(());
    }
    let Some(root) = dps
        .values()
        .filter_map(|dp| dp.stack_priority().map(|p| (p, dp.name.as_str())))
        .min()
        .map(|(_, name)| name)
    else {
        return Err(ConfigError::NoStackRoot);
    };

    let mut reached = BTreeSet::from([root]);
    let mut queue = vec![root];
    while let Some(name) = queue.pop() {
        let Some(dp) = dps.get(name) else { continue };
        for peer in dp.stack_ports().filter_map(|p| p.stack.as_ref()) {
            if reached.insert(peer.dp.as_str()) {
                queue.push(peer.dp.as_str());
            }
        }
    }
    match dps
        .values()
        .find(|dp| dp.has_stack_ports() && !reached.contains(dp.name.as_str()))
    {
        Some(dp) => Err(ConfigError::StackNotConnected(
            dp.name.clone(),
            root.to_owned(),
        )),
        None => Ok(()),
    }
}

/// Validate a config document and build one [`Dp`] per datapath, sorted by name.
pub fn build_dps(conf: &FaucetConfig) -> Result<Vec<Dp>, ConfigError> {
    if conf.dps.is_empty() {
        return Err(ConfigError::NoDatapaths);
    }
    for (name, aconf) in &conf.acls {
        check_acl(name, aconf)?;
    }
    let vlans = VlanTable::new(conf)?;
    let routers = build_routers(conf, &vlans)?;

    let mut dp_ids: BTreeMap<u64, &String> = BTreeMap::new();
    let mut pending = vec![];
    let mut dps = BTreeMap::new();
    for (name, dconf) in &conf.dps {
        if let Some(other) = dp_ids.insert(dconf.dp_id, name) {
            return Err(ConfigError::DuplicateDpId(
                other.clone(),
                name.clone(),
                dconf.dp_id,
            ));
        }
        let dp = build_dp(name, dconf, &vlans, &routers, conf, &mut pending)?;
        dps.insert(name.clone(), dp);
    }
    link_stack_ports(&mut dps, pending)?;
    check_stack_topology(&dps)?;

    let unused = conf
        .vlans
        .keys()
        .filter(|v| {
            !dps.values()
                .any(|dp| dp.vlans.values().any(|vlan| &vlan.name == *v))
        })
        .count();
    if unused > 0 {
        warn!("{unused} VLANs are not used by any datapath");
    }
    Ok(dps.into_values().collect())
}
