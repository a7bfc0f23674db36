// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Static registry of tracing targets, collected at link time across all linked crates

use crate::LevelFilter;
use linkme::distributed_slice;

/// A tracing target as declared by a crate, along with its default level and tags.
pub struct STarget {
    pub(crate) target: &'static str,
    pub(crate) name: &'static str,
    pub(crate) level: LevelFilter,
    pub(crate) tags: &'static [&'static str],
    pub(crate) custom: bool,
}
impl STarget {
    #[must_use]
    pub const fn new(
        target: &'static str,
        name: &'static str,
        level: LevelFilter,
        tags: &'static [&'static str],
        custom: bool,
    ) -> Self {
        Self {
            target,
            name,
            level,
            tags,
            custom,
        }
    }
}

#[distributed_slice]
pub static TRACING_TARGETS: [STarget];

#[macro_export]
macro_rules! trace_target_deps {
    () => {
        use linkme::distributed_slice;
        use $crate::LevelFilter;
        use $crate::targets::{STarget, TRACING_TARGETS};
    };
}

/// Declare the tracing target of the calling module, with a short name, default level and tags.
///
/// The target is the module path of the caller; the name is what users type to tune it.
#[macro_export]
macro_rules! trace_target {
    // Each expansion lives in its own const scope so that the static may always be called
    // TRACE_TGT and the imports never clash with the caller's.
    ($name:expr, $level:expr, $tags:expr) => {
        const _: () = {
            use $crate::trace_target_deps;
            trace_target_deps!();

            #[distributed_slice(TRACING_TARGETS)]
            static TRACE_TGT: STarget = STarget::new(module_path!(), $name, $level, $tags, false);
        };
    };
}

/// Declare a target whose name is given explicitly (e.g. for third-party crates).
#[macro_export]
macro_rules! custom_target {
    ($target:expr, $level:expr, $tags:expr) => {
        const _: () = {
            use $crate::trace_target_deps;
            trace_target_deps!();

            #[distributed_slice(TRACING_TARGETS)]
            static TRACE_TGT: STarget = STarget::new($target, $target, $level, $tags, true);
        };
    };
}
