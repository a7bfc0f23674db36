// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Generation of faucet configurations from switch topologies

use config::external::{
    CONFIG_VERSION, DpConf, DpStackConf, FaucetConfig, InterfaceConf, PortRef, RouterConf,
    StackLinkConf, VlanConf, VlanRef,
};
use config::external::dp::DEFAULT_HARDWARE;
use derive_builder::Builder;
use ipnet::IpNet;
use net::eth::mac::Mac;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use tracing::debug;

use crate::errors::GenerationError;
use crate::topology::Topology;

/// Highest port number the generator hands out
const MAX_GENERATED_PORT: u64 = 0xffff_ff00;

/// VLAN vids are multiples of 100 up to this many VLANs
pub const MAX_VLANS: usize = 40;

/// How switches are linked to each other
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkKind {
    /// Stack links; switch 0 becomes the stack root candidate
    #[default]
    Stack,
    /// Links carrying every VLAN tagged
    Tagged,
    /// Links carrying the first VLAN untagged
    Untagged,
}

/// Parameters of a generated configuration. N.B. we derive a builder type
/// `GeneratorParamsBuilder` and provide defaults for each field.
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct GeneratorParams {
    /// Untagged hosts per VLAN on every switch
    #[builder(default = 1)]
    pub num_hosts: usize,

    #[builder(default = 2)]
    pub num_vlans: usize,

    /// Tagged hosts on every switch, each one on all the VLANs
    #[builder(default = 0)]
    pub tagged_hosts: usize,

    /// Number of parallel links per pair of linked switches
    #[builder(default = 2)]
    pub switch_to_switch_links: usize,

    #[builder(default = 1)]
    pub start_port: u32,

    /// Order of port indices on every switch; extended as needed
    #[builder(default)]
    pub port_order: Vec<u32>,

    #[builder(default)]
    pub links: LinkKind,

    /// Give every VLAN VIPs and a MAC, and route between them
    #[builder(default = false)]
    pub routing: bool,

    #[builder(setter(into), default = DEFAULT_HARDWARE.to_owned())]
    pub hardware: String,
}

impl GeneratorParamsBuilder {
    /// Stack links, or tagged links if `stack` is false
    pub fn stack(&mut self, stack: bool) -> &mut Self {
        self.links(if stack { LinkKind::Stack } else { LinkKind::Tagged })
    }
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            num_hosts: 1,
            num_vlans: 2,
            tagged_hosts: 0,
            switch_to_switch_links: 2,
            start_port: 1,
            port_order: vec![],
            links: LinkKind::Stack,
            routing: false,
            hardware: DEFAULT_HARDWARE.to_owned(),
        }
    }
}

impl Display for GeneratorParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Generator parameters")?;
        writeln!(f, "  hosts    : {} per vlan, {} tagged", self.num_hosts, self.tagged_hosts)?;
        writeln!(f, "  vlans    : {}", self.num_vlans)?;
        writeln!(f, "  links    : {} x {:?}", self.switch_to_switch_links, self.links)?;
        writeln!(f, "  ports    : from {} order {:?}", self.start_port, self.port_order)?;
        writeln!(f, "  hardware : {}", self.hardware)
    }
}

/// Extend a port order to at least `max_length` entries by repeating it shifted past its
/// largest value. An empty order is the identity. The order must not repeat a port.
#[must_use]
pub fn extend_port_order(port_order: &[u32], max_length: usize) -> Vec<u32> {
    let Some(max) = port_order.iter().max().copied() else {
        return (0..).take(max_length + 1).collect();
    };
    let mut order = port_order.to_vec();
    let mut shift = 0u32;
    while order.len() < max_length {
        shift = shift.saturating_add(max.saturating_add(1));
        order.extend(port_order.iter().map(|p| p.saturating_add(shift)));
    }
    order
}

/// Generates a faucet config for a topology of switches
pub struct TopoGenerator {
    params: GeneratorParams,
    topology: Topology,
}

/// Hands out port numbers of one switch
struct PortAllocator<'a> {
    switch: usize,
    start: u32,
    order: &'a [u32],
    used: usize,
}

impl PortAllocator<'_> {
    fn next(&mut self) -> Result<u32, GenerationError> {
        let index = self.order.get(self.used).copied().unwrap_or(u32::MAX);
        let port = u64::from(self.start) + u64::from(index);
        self.used += 1;
        if port == 0 || port > MAX_GENERATED_PORT {
            return Err(GenerationError::PortOverflow(self.switch, port));
        }
        u32::try_from(port).map_err(|_| GenerationError::PortOverflow(self.switch, port))
    }
}

impl TopoGenerator {
    #[must_use]
    pub fn new(params: GeneratorParams, topology: Topology) -> Self {
        Self { params, topology }
    }

    #[must_use]
    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    #[must_use]
    pub fn dp_name(index: usize) -> String {
        format!("s{}", index + 1)
    }

    #[must_use]
    pub fn dp_id(index: usize) -> u64 {
        index as u64 + 1
    }

    #[must_use]
    pub fn vlan_name(index: usize) -> String {
        format!("vlan-{}", index + 1)
    }

    #[must_use]
    pub fn vlan_vid(index: usize) -> u16 {
        u16::try_from((index + 1) * 100).unwrap_or(u16::MAX)
    }

    /// The VLAN at `index`. Routed VLANs get the VIPs hosts use as their gateway, in the
    /// `fc<nn>::/64` prefix of the n-th VLAN.
    fn vlan(&self, index: usize) -> Result<VlanConf, GenerationError> {
        let mut vlan = VlanConf::new(Self::vlan_vid(index));
        if self.params.routing {
            let n = u8::try_from(index + 1)
                .map_err(|_| GenerationError::TooManyVlans(MAX_VLANS))?;
            vlan.faucet_vips = [format!("10.{n}.0.254/24"), format!("fc{n:02x}::1:254/64")]
                .iter()
                .map(|v| {
                    v.parse::<IpNet>()
                        .map_err(|e| GenerationError::Address(v.clone(), e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            vlan.faucet_mac = Some(Mac::from([0, 0, 0, 0, 0, n]));
        }
        Ok(vlan)
    }

    fn switch_link(&self, peer: usize, peer_port: u32, link: usize) -> InterfaceConf {
        let description = Some(format!(
            "link #{} to {}:{peer_port}",
            link + 1,
            Self::dp_name(peer)
        ));
        let all_vlans = (0..self.params.num_vlans)
            .map(|v| VlanRef::Vid(Self::vlan_vid(v)))
            .collect();
        match self.params.links {
            LinkKind::Stack => InterfaceConf {
                description,
                stack: Some(StackLinkConf {
                    dp: Self::dp_name(peer),
                    port: PortRef::Number(peer_port),
                }),
                ..InterfaceConf::default()
            },
            LinkKind::Tagged => InterfaceConf {
                description,
                tagged_vlans: all_vlans,
                ..InterfaceConf::default()
            },
            LinkKind::Untagged => InterfaceConf {
                description,
                native_vlan: Some(VlanRef::Vid(Self::vlan_vid(0))),
                ..InterfaceConf::default()
            },
        }
    }

    /// Build the config document
    ///
    /// # Errors
    ///
    /// Fails if VLANs are needed but none is requested, if too many VLANs are requested, or if
    /// port numbers overflow.
    pub fn generate(&self) -> Result<FaucetConfig, GenerationError> {
        let p = &self.params;
        let needs_vlans = p.num_hosts + p.tagged_hosts > 0
            || (p.links != LinkKind::Stack && !self.topology.edges().is_empty());
        if p.num_vlans == 0 && needs_vlans {
            return Err(GenerationError::NoVlans);
        }
        if p.num_vlans > MAX_VLANS {
            return Err(GenerationError::TooManyVlans(MAX_VLANS));
        }
        let mut seen = BTreeSet::new();
        if let Some(dup) = p.port_order.iter().find(|port| !seen.insert(**port)) {
            return Err(GenerationError::DuplicatePortOrder(*dup));
        }

        let links = self.topology.multiplied(p.switch_to_switch_links);
        let max_ports = (0..self.topology.num_nodes())
            .map(|n| links.degree(n))
            .max()
            .unwrap_or_default()
            + p.num_hosts * p.num_vlans
            + p.tagged_hosts;
        let order = extend_port_order(&p.port_order, max_ports);

        let mut dps: Vec<DpConf> = (0..self.topology.num_nodes())
            .map(|i| {
                let mut dp = DpConf::new(Self::dp_id(i));
                dp.hardware.clone_from(&p.hardware);
                if i == 0 && p.links == LinkKind::Stack {
                    dp.stack = Some(DpStackConf::with_priority(1));
                }
                dp
            })
            .collect();
        let mut ports: Vec<PortAllocator> = (0..dps.len())
            .map(|switch| PortAllocator {
                switch,
                start: p.start_port,
                order: &order,
                used: 0,
            })
            .collect();

        for (link, &(u, v)) in links.edges().iter().enumerate() {
            let pu = ports[u].next()?;
            let pv = ports[v].next()?;
            dps[u]
                .interfaces
                .insert(PortRef::Number(pu), self.switch_link(v, pv, link));
            dps[v]
                .interfaces
                .insert(PortRef::Number(pv), self.switch_link(u, pu, link));
        }

        for (i, dp) in dps.iter_mut().enumerate() {
            let mut host = 0;
            for _ in 0..p.num_hosts {
                for vlan in 0..p.num_vlans {
                    host += 1;
                    let port = ports[i].next()?;
                    dp.interfaces.insert(
                        PortRef::Number(port),
                        InterfaceConf {
                            name: Some(format!("u{}h{host}", i + 1)),
                            native_vlan: Some(VlanRef::Name(Self::vlan_name(vlan))),
                            ..InterfaceConf::default()
                        },
                    );
                }
            }
            for _ in 0..p.tagged_hosts {
                host += 1;
                let port = ports[i].next()?;
                dp.interfaces.insert(
                    PortRef::Number(port),
                    InterfaceConf {
                        name: Some(format!("t{}h{host}", i + 1)),
                        tagged_vlans: (0..p.num_vlans)
                            .map(|v| VlanRef::Name(Self::vlan_name(v)))
                            .collect(),
                        ..InterfaceConf::default()
                    },
                );
            }
        }

        let vlans = (0..p.num_vlans)
            .map(|v| Ok((Self::vlan_name(v), self.vlan(v)?)))
            .collect::<Result<BTreeMap<String, VlanConf>, GenerationError>>()?;
        let mut routers = BTreeMap::new();
        if p.routing && p.num_vlans > 1 {
            routers.insert(
                "router-1".to_owned(),
                RouterConf {
                    vlans: (0..p.num_vlans)
                        .map(|v| VlanRef::Name(Self::vlan_name(v)))
                        .collect(),
                },
            );
        }

        debug!(
            "Generated {} switches, {} switch links, {} vlans",
            dps.len(),
            links.edges().len(),
            vlans.len()
        );
        Ok(FaucetConfig {
            version: Some(CONFIG_VERSION),
            vlans,
            routers,
            dps: dps
                .into_iter()
                .enumerate()
                .map(|(i, dp)| (Self::dp_name(i), dp))
                .collect(),
            ..FaucetConfig::default()
        })
    }

    /// Build the config document as YAML
    ///
    /// # Errors
    ///
    /// See [`TopoGenerator::generate`].
    pub fn generate_yaml(&self) -> Result<String, GenerationError> {
        self.generate()?
            .to_yaml()
            .map_err(|e| GenerationError::Yaml(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::parse_document;
    use pretty_assertions::assert_eq;

    fn ports_of(doc: &FaucetConfig, dp: &str) -> Vec<u32> {
        doc.dps[dp]
            .interfaces
            .keys()
            .filter_map(|k| match k {
                PortRef::Number(n) => Some(*n),
                PortRef::Name(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_extend_port_order() {
        assert_eq!(extend_port_order(&[], 3), vec![0, 1, 2, 3]);
        assert_eq!(extend_port_order(&[1, 0], 5), vec![1, 0, 3, 2, 5, 4]);
        assert_eq!(extend_port_order(&[0, 1, 2, 3], 2), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_builder_defaults() {
        let params = GeneratorParamsBuilder::default().build().unwrap();
        assert_eq!(params, GeneratorParams::default());
        let params = GeneratorParamsBuilder::default()
            .stack(false)
            .hardware("GenericTFM")
            .build()
            .unwrap();
        assert_eq!(params.links, LinkKind::Tagged);
        assert_eq!(params.hardware, "GenericTFM");
    }

    #[test]
    fn test_stack_cycle() {
        let generator = TopoGenerator::new(GeneratorParams::default(), Topology::cycle(3));
        let doc = generator.generate().unwrap();
        assert_eq!(doc.dps.len(), 3);
        assert_eq!(doc.vlans["vlan-2"].vid, 200);
        assert_eq!(doc.dps["s1"].stack, Some(DpStackConf::with_priority(1)));
        assert!(doc.dps["s2"].stack.is_none());
        // 2 neighbours x 2 links + 2 hosts
        assert_eq!(ports_of(&doc, "s1"), vec![1, 2, 3, 4, 5, 6]);
        let dps = parse_document(&doc).unwrap();
        assert_eq!(dps.iter().map(|d| d.stack_ports().count()).sum::<usize>(), 12);
    }

    #[test]
    fn test_tagged_and_routed() {
        let params = GeneratorParamsBuilder::default()
            .stack(false)
            .routing(true)
            .tagged_hosts(1)
            .start_port(10)
            .port_order(vec![1, 0])
            .build()
            .unwrap();
        let doc = TopoGenerator::new(params, Topology::path(2)).generate().unwrap();
        assert!(doc.dps["s1"].stack.is_none());
        assert_eq!(ports_of(&doc, "s1"), vec![10, 11, 12, 13, 15]);
        assert_eq!(doc.vlans["vlan-1"].faucet_vips.len(), 2);
        assert!(doc.routers.contains_key("router-1"));
        let dps = parse_document(&doc).unwrap();
        assert!(dps[0].has_vips());
        assert!(dps.iter().all(|d| !d.has_stack_ports()));
    }

    #[test]
    fn test_generation_errors() {
        let none = GeneratorParamsBuilder::default().num_vlans(0).build().unwrap();
        assert_eq!(
            TopoGenerator::new(none, Topology::path(2)).generate(),
            Err(GenerationError::NoVlans)
        );
        let many = GeneratorParamsBuilder::default().num_vlans(41).build().unwrap();
        assert_eq!(
            TopoGenerator::new(many, Topology::path(2)).generate(),
            Err(GenerationError::TooManyVlans(MAX_VLANS))
        );
        let high = GeneratorParamsBuilder::default()
            .start_port(0xffff_fff0)
            .build()
            .unwrap();
        assert!(matches!(
            TopoGenerator::new(high, Topology::path(2)).generate(),
            Err(GenerationError::PortOverflow(..))
        ));
    }

    #[test]
    fn test_routed_vlans_past_nine() {
        let params = GeneratorParamsBuilder::default()
            .num_vlans(12usize)
            .routing(true)
            .build()
            .unwrap();
        let doc = TopoGenerator::new(params, Topology::path(2)).generate().unwrap();
        let vips = |name: &str| -> Vec<String> {
            doc.vlans[name].faucet_vips.iter().map(ToString::to_string).collect()
        };
        assert_eq!(vips("vlan-9"), vec!["10.9.0.254/24", "fc09::1:254/64"]);
        assert_eq!(vips("vlan-10"), vec!["10.10.0.254/24", "fc0a::1:254/64"]);
        assert_eq!(vips("vlan-12"), vec!["10.12.0.254/24", "fc0c::1:254/64"]);
        assert_eq!(
            doc.vlans["vlan-12"].faucet_mac,
            Some(Mac::from([0, 0, 0, 0, 0, 0x0c]))
        );
    }

    #[test]
    fn test_duplicate_port_order() {
        let params = GeneratorParamsBuilder::default()
            .port_order(vec![0, 2, 0])
            .build()
            .unwrap();
        assert_eq!(
            TopoGenerator::new(params, Topology::path(2)).generate(),
            Err(GenerationError::DuplicatePortOrder(0))
        );
    }

    #[test]
    fn test_yaml_round_trips_through_parser() {
        let yaml = TopoGenerator::new(GeneratorParams::default(), Topology::star(4))
            .generate_yaml()
            .unwrap();
        assert!(yaml.contains("priority: 1"));
        let dps = config::parse_str(&yaml).unwrap();
        assert_eq!(dps.len(), 4);
    }
}
