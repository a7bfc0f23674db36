// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Display of model objects

use std::fmt::{Display, Formatter};

use crate::internal::{Acl, Dp, Output, Port, Rule, RuleMatch, Vlan};

const SEP: &str = "       ";

macro_rules! PORT_FMT {
    () => {
        " {:>6} {:<16} {:<8} {:<7} {:<20} {}"
    };
}

fn fmt_opt<T: Display>(f: &mut Formatter<'_>, name: &str, value: Option<&T>) -> std::fmt::Result {
    match value {
        Some(v) => write!(f, " {name}={v}"),
        None => Ok(()),
    }
}

impl Display for RuleMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fmt_opt(f, "in_port", self.in_port.as_ref())?;
        fmt_opt(f, "dl_src", self.dl_src.as_ref())?;
        fmt_opt(f, "dl_dst", self.dl_dst.as_ref())?;
        fmt_opt(f, "dl_type", self.dl_type.as_ref())?;
        fmt_opt(f, "vlan_vid", self.vlan_vid.as_ref())?;
        fmt_opt(f, "nw_proto", self.nw_proto.as_ref())?;
        fmt_opt(f, "nw_src", self.nw_src.as_ref())?;
        fmt_opt(f, "nw_dst", self.nw_dst.as_ref())?;
        fmt_opt(f, "udp_src", self.udp_src.as_ref())?;
        fmt_opt(f, "udp_dst", self.udp_dst.as_ref())?;
        fmt_opt(f, "tcp_src", self.tcp_src.as_ref())?;
        fmt_opt(f, "tcp_dst", self.tcp_dst.as_ref())?;
        fmt_opt(f, "icmpv6_type", self.icmpv6_type.as_ref())
    }
}

impl Display for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "output(")?;
        let ports: Vec<String> = self.ports.iter().map(ToString::to_string).collect();
        write!(f, "ports=[{}]", ports.join(","))?;
        fmt_opt(f, "dl_dst", self.dl_dst.as_ref())?;
        fmt_opt(f, "vlan_vid", self.vlan_vid.as_ref())?;
        if self.pop_vlans {
            write!(f, " pop_vlans")?;
        }
        write!(f, ")")
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "match:")?;
        if self.matches == RuleMatch::default() {
            write!(f, " any")?;
        } else {
            self.matches.fmt(f)?;
        }
        write!(f, " => ")?;
        write!(f, "{}", if self.actions.allow { "allow" } else { "deny" })?;
        if let Some(output) = &self.actions.output {
            write!(f, " {output}")?;
        }
        if let Some(mirror) = &self.actions.mirror {
            write!(f, " mirror({mirror})")?;
        }
        Ok(())
    }
}

impl Display for Acl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  ■ acl {}:", self.name)?;
        for (n, rule) in self.rules.iter().enumerate() {
            writeln!(f, "{SEP}{n:>3}: {rule}")?;
        }
        Ok(())
    }
}

impl Display for Vlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "  ■ vlan {} (vid {})", self.name, self.vid)?;
        if self.implicit {
            write!(f, " implicit")?;
        }
        writeln!(f)?;
        if !self.faucet_vips.is_empty() {
            let vips: Vec<String> = self.faucet_vips.iter().map(ToString::to_string).collect();
            writeln!(f, "{SEP}vips: {}", vips.join(" "))?;
        }
        if !self.acls_in.is_empty() {
            writeln!(f, "{SEP}acls_in: {}", self.acls_in.join(" "))?;
        }
        Ok(())
    }
}

impl Display for Port {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let native = self
            .native_vlan
            .map_or_else(|| "--".to_owned(), |v| v.to_string());
        let tagged = if self.tagged_vlans.is_empty() {
            "--".to_owned()
        } else {
            let vids: Vec<String> = self.tagged_vlans.iter().map(ToString::to_string).collect();
            vids.join(",")
        };
        let extra = match (&self.stack, self.output_only) {
            (Some(peer), _) => format!("stack to {}:{}", peer.dp, peer.port),
            (None, true) => "output only".to_owned(),
            (None, false) => self.acls_in.join(","),
        };
        write!(
            f,
            "{}",
            format_args!(
                PORT_FMT!(),
                self.number,
                self.name,
                if self.enabled { "up" } else { "down" },
                native,
                tagged,
                extra
            )
        )
    }
}

impl Display for Dp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            " ━━━━━━━━ DP {} (dp_id {}, {}) ━━━━━━━━",
            self.name,
            self.dp_id.to_hex(),
            self.hardware
        )?;
        if let Some(description) = &self.description {
            writeln!(f, " {description}")?;
        }
        if let Some(priority) = self.stack_priority() {
            writeln!(f, " stack root candidate, priority {priority}")?;
        }
        writeln!(
            f,
            "{}",
            format_args!(PORT_FMT!(), "PORT", "NAME", "STATE", "NATIVE", "TAGGED", "")
        )?;
        for port in self.ports.values() {
            writeln!(f, "{port}")?;
        }
        for vlan in self.vlans.values() {
            write!(f, "{vlan}")?;
        }
        for acl in self.acls.values() {
            write!(f, "{acl}")?;
        }
        for router in self.routers.values() {
            let vids: Vec<String> = router.vlans.iter().map(ToString::to_string).collect();
            writeln!(f, "  ■ router {}: vlans {}", router.name, vids.join(","))?;
        }
        Ok(())
    }
}
