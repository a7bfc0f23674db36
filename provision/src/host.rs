// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Plan renderer: hosts, as network namespaces plugged into the bridges

use config::{Dp, Port, Vlan};
use ipnet::{IpNet, Ipv6Net};
use net::interface::InterfaceName;
use net::openflow::PortNo;
use net::vlan::Vid;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::net::Ipv6Addr;

use crate::bridge::{bridge_name, interface_name};
use crate::builder::{CommandPlan, MARKER, Render};
use crate::errors::RenderError;

/// Interface of a host inside its namespace
pub const HOST_INTERFACE: &str = "veth0";

/// Hosts of a VLAN are numbered from 1 up to this
pub const MAX_HOSTS_PER_VLAN: usize = 0xffff;

/// VLANs are numbered from 1 up to this
pub const MAX_ADDRESSED_VLANS: usize = 0xff;

/// An address of a host on one of its VLANs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostAddress {
    pub vid: Vid,
    pub address: Ipv6Net,
    /// The VLAN's first IPv6 VIP
    pub gateway: Option<Ipv6Addr>,
}

/// Hands out host addresses `fc<vlan#>::1:<host#>/64`, where VLANs are numbered by vid
/// and hosts in the order they are assigned.
#[derive(Debug, Default)]
pub struct HostAddressing {
    vlan_numbers: BTreeMap<Vid, u16>,
    next_host: BTreeMap<Vid, u16>,
}

impl HostAddressing {
    pub fn new(dps: &[Dp]) -> Result<Self, RenderError> {
        let mut vids: Vec<Vid> = dps.iter().flat_map(|dp| dp.vlans.keys().copied()).collect();
        vids.sort_unstable();
        vids.dedup();
        if vids.len() > MAX_ADDRESSED_VLANS {
            return Err(RenderError::TooManyVlans(MAX_ADDRESSED_VLANS));
        }
        let vlan_numbers = vids
            .iter()
            .zip(1u16..)
            .map(|(vid, n)| (*vid, n))
            .collect();
        Ok(Self {
            vlan_numbers,
            next_host: BTreeMap::new(),
        })
    }

    /// Give the next host of `vlan` an address
    pub fn assign(&mut self, vlan: &Vlan) -> Result<HostAddress, RenderError> {
        let Some(number) = self.vlan_numbers.get(&vlan.vid).copied() else {
            return Err(RenderError::TooManyVlans(MAX_ADDRESSED_VLANS));
        };
        let host = self.next_host.entry(vlan.vid).or_insert(1);
        if *host == 0 {
            return Err(RenderError::TooManyHosts(
                vlan.vid.as_u16(),
                MAX_HOSTS_PER_VLAN,
            ));
        }
        let ip = Ipv6Addr::new(0xfc00 | number, 0, 0, 0, 0, 0, 1, *host);
        *host = host.wrapping_add(1);
        let gateway = vlan.faucet_vips.iter().find_map(|vip| match vip {
            IpNet::V6(v6) => Some(v6.addr()),
            IpNet::V4(_) => None,
        });
        Ok(HostAddress {
            vid: vlan.vid,
            address: Ipv6Net::new_assert(ip, 64),
            gateway,
        })
    }
}

/// A host attached to a port of a bridge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub bridge: InterfaceName,
    /// The end of the veth pair left on the bridge
    pub veth: InterfaceName,
    pub ofport: PortNo,
    pub native: Option<HostAddress>,
    pub tagged: Vec<HostAddress>,
}

/// Hosts are named after their port, unless the port is only known by its number
#[must_use]
pub fn host_name(dp: &Dp, port: &Port) -> String {
    if port.name == port.number.to_string() {
        format!("h{}p{}", dp.dp_id, port.number)
    } else {
        port.name.clone()
    }
}

/// Whether a port gets a host: stack and output only ports don't, nor ports without VLANs
#[must_use]
pub fn is_host_port(port: &Port) -> bool {
    !port.is_stack() && !port.output_only && port.vlans().next().is_some()
}

impl Host {
    pub fn new(dp: &Dp, port: &Port, addressing: &mut HostAddressing) -> Result<Self, RenderError> {
        let name = host_name(dp, port);
        let veth = interface_name(dp, format!("veth-{name}"))?;
        let mut assign = |vid: Vid| -> Result<Option<HostAddress>, RenderError> {
            dp.vlans.get(&vid).map(|v| addressing.assign(v)).transpose()
        };
        let native = match port.native_vlan {
            Some(vid) => assign(vid)?,
            None => None,
        };
        let mut tagged = Vec::with_capacity(port.tagged_vlans.len());
        for vid in &port.tagged_vlans {
            if let Some(address) = assign(*vid)? {
                tagged.push(address);
            }
        }
        Ok(Self {
            name,
            bridge: bridge_name(dp)?,
            veth,
            ofport: port.number,
            native,
            tagged,
        })
    }

    /// The default route: via the native VLAN's VIP, else the first tagged VLAN with one
    #[must_use]
    pub fn gateway(&self) -> Option<(Ipv6Addr, String)> {
        if let Some(native) = &self.native {
            return native.gateway.map(|gw| (gw, HOST_INTERFACE.to_owned()));
        }
        self.tagged
            .iter()
            .find_map(|t| t.gateway.map(|gw| (gw, sub_interface(t.vid))))
    }
}

fn sub_interface(vid: Vid) -> String {
    format!("{HOST_INTERFACE}.{vid}")
}

#[repr(transparent)]
struct InNamespace<'a>(&'a str);

impl InNamespace<'_> {
    fn exec(&self, command: impl Display) -> String {
        format!("ip netns exec {} {command}", self.0)
    }
}

impl Render for Host {
    type Context = ();
    type Output = CommandPlan;
    fn render(&self, _ctx: &Self::Context) -> CommandPlan {
        let ns = InNamespace(&self.name);
        let veth = &self.veth;
        let mut plan = CommandPlan::new();
        plan += MARKER;
        plan.comment(format_args!("host {} on {} port {}", self.name, self.bridge, self.ofport));
        plan += format!("ip netns add {}", self.name);
        plan += format!(
            "ip link add dev {veth} type veth peer name {HOST_INTERFACE} netns {}",
            self.name
        );
        plan += format!("ip link set dev {veth} up");
        plan += ns.exec("ip link set dev lo up");
        plan += ns.exec(format_args!("ip link set dev {HOST_INTERFACE} up"));
        if let Some(native) = &self.native {
            plan += ns.exec(format_args!(
                "ip -6 addr add {} dev {HOST_INTERFACE}",
                native.address
            ));
        }
        for tagged in &self.tagged {
            let sub = sub_interface(tagged.vid);
            plan += ns.exec(format_args!(
                "ip link add link {HOST_INTERFACE} name {sub} type vlan id {}",
                tagged.vid
            ));
            plan += ns.exec(format_args!("ip link set dev {sub} up"));
            plan += ns.exec(format_args!("ip -6 addr add {} dev {sub}", tagged.address));
        }
        if let Some((gw, dev)) = self.gateway() {
            plan += ns.exec(format_args!("ip -6 route add default via {gw} dev {dev}"));
        }
        plan += format!(
            "ovs-vsctl add-port {} {veth} -- set interface {veth} ofport_request={}",
            self.bridge, self.ofport
        );
        plan
    }
}
