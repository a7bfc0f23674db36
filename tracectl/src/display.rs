// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Display implementations

use crate::control::{TargetCfg, TargetCfgDb};
use std::fmt::{Display, Formatter};

macro_rules! TARGET_FMT {
    () => {
        "{:>40} │ {:>16} │ {:>6} │ {}"
    };
}
fn fmt_target_heading(f: &mut Formatter<'_>) -> std::fmt::Result {
    writeln!(
        f,
        "{}",
        format_args!(TARGET_FMT!(), "TARGET", "NAME", "LEVEL", "TAGS")
    )
}

impl Display for TargetCfg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            format_args!(
                TARGET_FMT!(),
                self.target,
                self.name,
                self.level,
                self.tags.join(",")
            )
        )
    }
}

impl Display for TargetCfgDb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "                    ──────── Tracing configuration per target ────────"
        )?;
        fmt_target_heading(f)?;
        for unit in self.targets.values() {
            writeln!(f, "{unit}")?;
        }
        write!(
            f,
            "{}",
            format_args!(TARGET_FMT!(), "(default)", "--", self.level, "--")
        )
    }
}

pub(crate) struct TargetCfgDbByTag<'a>(pub(crate) &'a TargetCfgDb);
impl Display for TargetCfgDbByTag<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "                        ──────── Tracing targets by tag ────────"
        )?;
        let db = self.0;
        let mut tags: Vec<_> = db.tags.values().collect();
        tags.sort_by_key(|t| t.tag);
        for tag in tags {
            writeln!(f, " {}:", tag.tag)?;
            for target in db
                .targets
                .values()
                .filter(|target| tag.targets.contains(target.target))
            {
                write!(f, "      {:<40} : {}", target.target, target.level)?;
                let others: Vec<_> = target.tags.iter().filter(|t| **t != tag.tag).collect();
                if !others.is_empty() {
                    write!(f, " (also:")?;
                    for other in others {
                        write!(f, " {other}")?;
                    }
                    write!(f, ")")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
