// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Validated ACLs. Match prerequisites follow OpenFlow: transport fields need the matching IP
//! protocol, which needs an IP ethertype.

use ipnet::IpNet;
use net::eth::ethtype::EthType;
use net::eth::mac::Mac;
use net::ip::IpProto;
use net::openflow::PortNo;
use net::vlan::Vid;
use std::collections::BTreeMap;

use crate::ConfigError;
use crate::external::acl::{AclConf, MatchAddr, RuleConf};
use crate::external::dp::PortRef;
use crate::internal::Port;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleMatch {
    pub in_port: Option<PortNo>,
    pub dl_src: Option<Mac>,
    pub dl_dst: Option<Mac>,
    pub dl_type: Option<EthType>,
    pub vlan_vid: Option<Vid>,
    pub nw_proto: Option<IpProto>,
    pub nw_src: Option<IpNet>,
    pub nw_dst: Option<IpNet>,
    pub udp_src: Option<u16>,
    pub udp_dst: Option<u16>,
    pub tcp_src: Option<u16>,
    pub tcp_dst: Option<u16>,
    pub icmpv6_type: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Output {
    pub ports: Vec<PortNo>,
    pub dl_dst: Option<Mac>,
    pub vlan_vid: Option<Vid>,
    pub pop_vlans: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleActions {
    pub allow: bool,
    pub output: Option<Output>,
    pub mirror: Option<PortNo>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rule {
    pub matches: RuleMatch,
    pub actions: RuleActions,
}

/// An ACL, resolved against the ports of one datapath
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Acl {
    pub name: String,
    pub rules: Vec<Rule>,
}

/// Context used to build rule errors
struct RuleCtx<'a> {
    acl: &'a str,
    rule: usize,
}
impl RuleCtx<'_> {
    fn err(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidAclRule {
            acl: self.acl.to_owned(),
            rule: self.rule,
            reason: reason.into(),
        }
    }
}

fn pick_addr(
    ctx: &RuleCtx<'_>,
    field: &str,
    generic: Option<MatchAddr>,
    v4: Option<MatchAddr>,
    v6: Option<MatchAddr>,
) -> Result<Option<IpNet>, ConfigError> {
    match (generic, v4, v6) {
        (None, None, None) => Ok(None),
        (Some(a), None, None) => Ok(Some(a.0)),
        (None, Some(a), None) => match a.0 {
            IpNet::V4(_) => Ok(Some(a.0)),
            IpNet::V6(_) => Err(ctx.err(format!("ipv4_{field} {a} is not an IPv4 prefix"))),
        },
        (None, None, Some(a)) => match a.0 {
            IpNet::V6(_) => Ok(Some(a.0)),
            IpNet::V4(_) => Err(ctx.err(format!("ipv6_{field} {a} is not an IPv6 prefix"))),
        },
        _ => Err(ctx.err(format!("more than one {field} address match"))),
    }
}

fn check_family(ctx: &RuleCtx<'_>, addr: &IpNet, dl_type: Option<EthType>) -> Result<(), ConfigError> {
    let wanted = match addr {
        IpNet::V4(_) => EthType::IPV4,
        IpNet::V6(_) => EthType::IPV6,
    };
    match dl_type {
        Some(t) if t == wanted => Ok(()),
        Some(t) => Err(ctx.err(format!("address {addr} requires dl_type {wanted}, not {t}"))),
        None => Err(ctx.err(format!("address {addr} requires dl_type {wanted}"))),
    }
}

fn check_vid(ctx: &RuleCtx<'_>, what: &str, raw: Option<u16>) -> Result<Option<Vid>, ConfigError> {
    raw.map(|vid| Vid::new(vid).map_err(|e| ctx.err(format!("{what}: {e}"))))
        .transpose()
}

/// Validate the match fields of a rule, without any port resolution
fn build_match(ctx: &RuleCtx<'_>, rule: &RuleConf) -> Result<RuleMatch, ConfigError> {
    let dl_type = rule.dl_type.map(EthType::new);
    let nw_proto = rule.nw_proto.map(IpProto::new);

    let nw_src = pick_addr(ctx, "src", rule.nw_src, rule.ipv4_src, rule.ipv6_src)?;
    let nw_dst = pick_addr(ctx, "dst", rule.nw_dst, rule.ipv4_dst, rule.ipv6_dst)?;
    for addr in nw_src.iter().chain(nw_dst.iter()) {
        check_family(ctx, addr, dl_type)?;
    }
    if let Some(proto) = nw_proto
        && !dl_type.is_some_and(EthType::is_ip)
    {
        return Err(ctx.err(format!("nw_proto {proto} requires an IP dl_type")));
    }
    let needs_proto = |present: bool, proto: IpProto, what: &str| {
        if present && nw_proto != Some(proto) {
            Err(ctx.err(format!("{what} requires nw_proto {proto}")))
        } else {
            Ok(())
        }
    };
    needs_proto(
        rule.udp_src.is_some() || rule.udp_dst.is_some(),
        IpProto::UDP,
        "udp port match",
    )?;
    needs_proto(
        rule.tcp_src.is_some() || rule.tcp_dst.is_some(),
        IpProto::TCP,
        "tcp port match",
    )?;
    if rule.icmpv6_type.is_some() {
        if dl_type != Some(EthType::IPV6) {
            return Err(ctx.err(format!("icmpv6_type requires dl_type {}", EthType::IPV6)));
        }
        needs_proto(true, IpProto::ICMPV6, "icmpv6_type")?;
    }

    Ok(RuleMatch {
        in_port: None,
        dl_src: rule.dl_src,
        dl_dst: rule.dl_dst,
        dl_type,
        vlan_vid: check_vid(ctx, "vlan_vid", rule.vlan_vid)?,
        nw_proto,
        nw_src,
        nw_dst,
        udp_src: rule.udp_src,
        udp_dst: rule.udp_dst,
        tcp_src: rule.tcp_src,
        tcp_dst: rule.tcp_dst,
        icmpv6_type: rule.icmpv6_type,
    })
}

/// Check the datapath-independent constraints of all rules of an ACL
pub(crate) fn check_acl(name: &str, conf: &AclConf) -> Result<(), ConfigError> {
    for (idx, entry) in conf.iter().enumerate() {
        let ctx = RuleCtx {
            acl: name,
            rule: idx,
        };
        build_match(&ctx, &entry.rule)?;
        if let Some(output) = entry.rule.actions.as_ref().and_then(|a| a.output.as_ref()) {
            if let Some(mac) = output.dl_dst {
                mac.valid_unicast_dst()
                    .map_err(|_| ctx.err(format!("output dl_dst {mac} is not a unicast MAC")))?;
            }
            check_vid(&ctx, "output vlan_vid", output.vlan_vid)?;
        }
    }
    Ok(())
}

fn resolve_port(
    dp: &str,
    acl: &str,
    ports: &BTreeMap<PortNo, Port>,
    port: &PortRef,
) -> Result<PortNo, ConfigError> {
    let found = match port {
        PortRef::Number(n) => PortNo::new(*n).ok().filter(|n| ports.contains_key(n)),
        PortRef::Name(name) => ports.values().find(|p| p.name == *name).map(|p| p.number),
    };
    found.ok_or_else(|| ConfigError::NoSuchAclPort {
        acl: acl.to_owned(),
        dp: dp.to_owned(),
        port: port.to_string(),
    })
}

impl Acl {
    /// Build an ACL for the datapath `dp`, resolving port references against its ports
    pub(crate) fn resolve(
        name: &str,
        conf: &AclConf,
        dp: &str,
        ports: &BTreeMap<PortNo, Port>,
    ) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(conf.len());
        for (idx, entry) in conf.iter().enumerate() {
            let ctx = RuleCtx {
                acl: name,
                rule: idx,
            };
            let rule = &entry.rule;
            let mut matches = build_match(&ctx, rule)?;
            matches.in_port = rule
                .in_port
                .as_ref()
                .map(|p| resolve_port(dp, name, ports, p))
                .transpose()?;

            let actions = rule.actions.clone().unwrap_or_default();
            let allow = actions.allow.or(rule.allow).is_some_and(|f| f.is_set());
            let output = match &actions.output {
                None => None,
                Some(out) => {
                    let mut out_ports = vec![];
                    for p in out.port.iter().chain(out.ports.iter()) {
                        out_ports.push(resolve_port(dp, name, ports, p)?);
                    }
                    Some(Output {
                        ports: out_ports,
                        dl_dst: out.dl_dst,
                        vlan_vid: check_vid(&ctx, "output vlan_vid", out.vlan_vid)?,
                        pop_vlans: out.pop_vlans.is_some_and(|f| f.is_set()),
                    })
                }
            };
            let mirror = actions
                .mirror
                .as_ref()
                .map(|p| resolve_port(dp, name, ports, p))
                .transpose()?;
            rules.push(Rule {
                matches,
                actions: RuleActions {
                    allow,
                    output,
                    mirror,
                },
            });
        }
        Ok(Acl {
            name: name.to_owned(),
            rules,
        })
    }

    /// Ports this ACL may send packets to
    pub fn output_ports(&self) -> impl Iterator<Item = PortNo> + '_ {
        self.rules.iter().flat_map(|r| {
            r.actions
                .output
                .iter()
                .flat_map(|o| o.ports.iter().copied())
                .chain(r.actions.mirror)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::acl::RuleEntry;
    use pretty_assertions::assert_eq;

    fn acl(yaml: &str) -> AclConf {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn reason(res: Result<(), ConfigError>) -> String {
        match res {
            Err(ConfigError::InvalidAclRule { reason, .. }) => reason,
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_prerequisites_ok() {
        let conf = acl(r#"
- rule:
    dl_type: 0x800
    nw_proto: 17
    udp_src: 68
    udp_dst: 67
    actions: {allow: 1}
- rule:
    dl_type: 0x86dd
    nw_proto: 58
    icmpv6_type: 134
    actions: {allow: 0}
- rule:
    dl_type: 0x800
    ipv4_src: 10.0.200.0/24
    actions:
      output:
        dl_dst: "0e:00:00:00:02:02"
"#);
        assert_eq!(check_acl("protect", &conf), Ok(()));
    }

    #[test]
    fn test_prerequisites_missing() {
        let udp = acl("- rule: {dl_type: 0x800, udp_dst: 53}");
        assert!(reason(check_acl("a", &udp)).contains("nw_proto 17"));

        let proto = acl("- rule: {nw_proto: 6}");
        assert!(reason(check_acl("a", &proto)).contains("IP dl_type"));

        let icmp = acl("- rule: {dl_type: 0x800, nw_proto: 58, icmpv6_type: 135}");
        assert!(reason(check_acl("a", &icmp)).contains("icmpv6_type"));

        let family = acl("- rule: {dl_type: 0x86dd, nw_src: 10.0.0.0/8}");
        assert!(reason(check_acl("a", &family)).contains("requires dl_type"));

        let wrong_v4 = acl("- rule: {dl_type: 0x86dd, ipv4_dst: 'fc00::/7'}");
        assert!(reason(check_acl("a", &wrong_v4)).contains("not an IPv4 prefix"));
    }

    #[test]
    fn test_output_mac_must_be_unicast() {
        let conf = acl(r#"- rule: {actions: {output: {dl_dst: "01:00:5e:00:00:01"}}}"#);
        assert!(reason(check_acl("a", &conf)).contains("unicast"));
    }

    #[test]
    fn test_resolve_ports() {
        let mut ports = BTreeMap::new();
        let number = PortNo::new(2).unwrap();
        ports.insert(
            number,
            Port {
                number,
                name: "h2".to_owned(),
                description: None,
                enabled: true,
                native_vlan: None,
                tagged_vlans: vec![],
                acls_in: vec![],
                stack: None,
                output_only: false,
                max_lldp_lost: 3,
            },
        );
        let conf = acl("- rule: {allow: true, actions: {mirror: h2, output: {port: 2}}}");
        let resolved = Acl::resolve("m", &conf, "sw1", &ports).unwrap();
        assert!(resolved.rules[0].actions.allow);
        assert_eq!(resolved.output_ports().collect::<Vec<_>>(), vec![number, number]);

        let bad: AclConf = vec![RuleEntry::default()]
            .into_iter()
            .chain(acl("- rule: {actions: {output: {port: 9}}}"))
            .collect();
        assert_eq!(
            Acl::resolve("m", &bad, "sw1", &ports),
            Err(ConfigError::NoSuchAclPort {
                acl: "m".to_owned(),
                dp: "sw1".to_owned(),
                port: "9".to_owned()
            })
        );
    }
}
