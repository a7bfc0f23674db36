// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tracing runtime control.

use ordermap::OrderMap;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
#[allow(unused)]
use tracing::{debug, error, info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, Registry, filter::LevelFilter, prelude::*, reload};

use crate::errors::TraceCtlError;
use crate::{display::TargetCfgDbByTag, targets::TRACING_TARGETS, trace_target};

trace_target!("tracectl", LevelFilter::INFO, &[]);

/// Names with a special meaning in a tracing configuration string
const DEFAULT_KEY: &str = "default";
const ALL_KEY: &str = "all";

#[derive(Debug, Clone)]
pub struct TargetCfg {
    pub(crate) target: &'static str,
    pub(crate) name: &'static str,
    pub(crate) level: LevelFilter,
    pub(crate) tags: Vec<&'static str>,
    pub(crate) custom: bool,
}
impl TargetCfg {
    fn new(
        target: &'static str,
        name: &'static str,
        level: LevelFilter,
        tags: &'static [&'static str],
        custom: bool,
    ) -> Self {
        // a target can always be addressed by its name
        let mut tags = tags.to_vec();
        if !tags.contains(&name) {
            tags.push(name);
        }
        Self {
            target,
            name,
            level,
            tags,
            custom,
        }
    }
    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
    #[must_use]
    pub fn level(&self) -> LevelFilter {
        self.level
    }
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.custom
    }
}

#[derive(Debug, Clone)]
pub struct Tag {
    pub(crate) tag: &'static str,
    pub(crate) targets: HashSet<&'static str>,
}
impl Tag {
    fn new(tag: &'static str, target: &'static str) -> Self {
        let mut targets = HashSet::with_capacity(1);
        targets.insert(target);
        Self { tag, targets }
    }
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.tag
    }
}

#[derive(Debug)]
pub(crate) struct TargetCfgDb {
    pub(crate) level: LevelFilter,
    pub(crate) targets: OrderMap<&'static str, TargetCfg>,
    pub(crate) tags: OrderMap<&'static str, Tag>,
}

impl TargetCfgDb {
    fn new(level: LevelFilter) -> Self {
        let mut db = Self {
            level,
            targets: OrderMap::new(),
            tags: OrderMap::new(),
        };
        for target in TRACING_TARGETS {
            db.register(
                target.target,
                target.name,
                target.level,
                target.tags,
                target.custom,
            );
        }
        db
    }
    fn register(
        &mut self,
        target: &'static str,
        name: &'static str,
        level: LevelFilter,
        tags: &'static [&'static str],
        custom: bool,
    ) {
        let tconfig = TargetCfg::new(target, name, level, tags, custom);
        let tags = tconfig.tags.clone();

        if let Some(exist) = self.targets.insert(target, tconfig) {
            warn!("Target {} has been declared more than once", exist.target);
        }
        for tag in &tags {
            if let Some(tag) = self.tags.get_mut(tag) {
                tag.targets.insert(target);
            } else {
                self.tags.insert(tag, Tag::new(tag, target));
            }
        }
    }
    fn env_filter(&self) -> EnvFilter {
        let mut f = EnvFilter::new(self.level.to_string());
        for target in self.targets.values() {
            match format!("{}={}", target.target, target.level).parse::<Directive>() {
                Ok(directive) => f = f.add_directive(directive),
                Err(e) => warn!("Skipping target {}: {e}", target.target),
            }
        }
        f
    }
    /// Build a config string that reproduces the current levels. Targets are not grouped by
    /// common tags, so this is one of possibly many equivalent strings.
    pub(crate) fn as_config_string(&self) -> String {
        let mut out = format!("{DEFAULT_KEY}={}", self.level);
        for target in self.targets.values() {
            out += format!(",{}={}", target.name, target.level).as_str();
        }
        out
    }
    fn tag_targets_mut(&mut self, tag: &str) -> Vec<&mut TargetCfg> {
        match self.tags.get(tag) {
            Some(tag) => self
                .targets
                .values_mut()
                .filter(|target| tag.targets.contains(target.target))
                .collect(),
            None => vec![],
        }
    }
    fn tag_targets(&self, tag: &str) -> Vec<&TargetCfg> {
        match self.tags.get(tag) {
            Some(tag) => self
                .targets
                .values()
                .filter(|target| tag.targets.contains(target.target))
                .collect(),
            None => vec![],
        }
    }
}

/// Runtime handle over the tracing subscriber of the process.
#[derive(Debug)]
pub struct TracingControl {
    db: Mutex<TargetCfgDb>,
    reload_filter: reload::Handle<EnvFilter, Registry>,
    installed: bool,
}
impl TracingControl {
    fn new() -> Self {
        let db = TargetCfgDb::new(LevelFilter::INFO);
        let (filter, reload_filter) = reload::Layer::new(db.env_filter());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(true)
            .with_level(true)
            .with_writer(std::io::stderr);

        // another subscriber may already be set (e.g. by a test harness): we then only keep
        // the database, and level changes have no effect on the output.
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .with(ErrorLayer::default())
            .try_init()
            .is_ok();

        Self {
            db: Mutex::new(db),
            reload_filter,
            installed,
        }
    }
    fn lock(&self) -> MutexGuard<'_, TargetCfgDb> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
    fn reload(&self, filter: EnvFilter) {
        if !self.installed {
            return;
        }
        if let Err(e) = self.reload_filter.reload(filter) {
            error!("Failed to reload tracing filter: {e}");
        }
    }
    /// Private to promote the usage of macros to declare targets
    #[allow(unused)]
    fn register(
        &self,
        target: &'static str,
        name: &'static str,
        level: LevelFilter,
        tags: &'static [&'static str],
        custom: bool,
    ) {
        let mut db = self.lock();
        db.register(target, name, level, tags, custom);
        self.reload(db.env_filter());
    }
}

static TRACING_CTL: OnceLock<TracingControl> = OnceLock::new();

/// Get a reference to the process-wide [`TracingControl`], initializing it if needed
pub fn get_trace_ctl() -> &'static TracingControl {
    TRACING_CTL.get_or_init(TracingControl::new)
}

impl TracingControl {
    pub fn init() {
        get_trace_ctl();
    }

    /// Install the `color-eyre` report handler so that errors bubbling up to `main` are printed
    /// along with the span trace captured by the error layer.
    ///
    /// # Errors
    ///
    /// Fails if a report handler was already installed.
    pub fn install_error_report() -> Result<(), TraceCtlError> {
        color_eyre::install().map_err(|e| TraceCtlError::ReportHandler(e.to_string()))
    }

    /// Whether this control owns the global subscriber
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Set the level of all targets carrying the given tag. Returns the number of targets
    /// whose level changed.
    pub fn set_tag_level(&self, tag: &str, level: LevelFilter) -> usize {
        let mut db = self.lock();
        let mut changed = 0;
        for target in db.tag_targets_mut(tag) {
            if target.level != level {
                target.level = level;
                changed += 1;
            }
        }
        if changed > 0 {
            self.reload(db.env_filter());
        }
        debug!("Log level for tag '{tag}' set to {level}. Targets changed: {changed}");
        changed
    }
    pub fn set_level_all(&self, level: LevelFilter) {
        let mut db = self.lock();
        for target in db.targets.values_mut() {
            target.level = level;
        }
        self.reload(db.env_filter());
    }
    pub fn set_default_level(&self, level: LevelFilter) {
        let mut db = self.lock();
        if db.level != level {
            db.level = level;
            debug!("Default log level set to {level}");
            self.reload(db.env_filter());
        }
    }
    #[must_use]
    pub fn get_default_level(&self) -> LevelFilter {
        self.lock().level
    }

    /// Parse a string made of comma-separated tag=level, where level is one of
    /// off, error, warn, info, debug, trace
    fn parse_tracing_config(input: &str) -> Result<OrderMap<String, LevelFilter>, TraceCtlError> {
        let mut result = OrderMap::new();
        for item in input.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let Some((tag, level)) = item.split_once('=') else {
                return Err(TraceCtlError::InvalidSyntax(item.to_string()));
            };
            let (tag, level) = (tag.trim(), level.trim());
            let parsed = LevelFilter::from_str(level).map_err(|e| TraceCtlError::InvalidLevel {
                tag: tag.to_string(),
                level: level.to_string(),
                reason: e.to_string(),
            })?;
            result.insert(tag.to_string(), parsed);
        }
        Ok(result)
    }

    /// Apply a tracing configuration string such as `default=error,all=info,stack=debug`.
    ///
    /// `default` sets the level for events of unregistered targets, `all` sets the level of all
    /// registered targets, and any other key is a tag. Tags are applied after `all`, so they
    /// override it.
    ///
    /// # Errors
    ///
    /// Fails on malformed input or on an unknown tag. Nothing is changed in that case.
    pub fn setup_from_string(&self, input: &str) -> Result<(), TraceCtlError> {
        let config = Self::parse_tracing_config(input)?;
        {
            let db = self.lock();
            if let Some(unknown) = config
                .keys()
                .filter(|k| *k != DEFAULT_KEY && *k != ALL_KEY)
                .find(|k| !db.tags.contains_key(k.as_str()))
            {
                return Err(TraceCtlError::UnknownTag(unknown.clone()));
            }
        }
        if let Some(level) = config.get(DEFAULT_KEY) {
            self.set_default_level(*level);
        }
        if let Some(level) = config.get(ALL_KEY) {
            self.set_level_all(*level);
        }
        for (tag, level) in config
            .iter()
            .filter(|(k, _)| *k != DEFAULT_KEY && *k != ALL_KEY)
        {
            self.set_tag_level(tag, *level);
        }
        Ok(())
    }

    pub fn get_tags(&self) -> impl Iterator<Item = Tag> {
        self.lock().tags.clone().into_values()
    }
    #[must_use]
    pub fn get_tag(&self, tag: &str) -> Option<Tag> {
        self.lock().tags.get(tag).cloned()
    }
    #[must_use]
    pub fn get_target(&self, target: &str) -> Option<TargetCfg> {
        self.lock().targets.get(target).cloned()
    }
    pub fn get_target_all(&self) -> impl Iterator<Item = TargetCfg> {
        self.lock().targets.clone().into_values()
    }
    pub fn get_targets_by_tag(&self, tag: &str) -> impl Iterator<Item = TargetCfg> {
        let db = self.lock();
        db.tag_targets(tag)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }
    /// Text table of the targets, grouped by tag
    #[must_use]
    pub fn targets_by_tag_string(&self) -> String {
        let db = self.lock();
        TargetCfgDbByTag(&db).to_string()
    }
    /// Text table of the targets and their levels
    #[must_use]
    pub fn targets_string(&self) -> String {
        self.lock().to_string()
    }
    pub fn dump_targets_by_tag(&self) {
        info!("{}", self.targets_by_tag_string());
    }
    pub fn dump(&self) {
        info!("{}", self.targets_string());
    }
    #[must_use]
    pub fn as_config_string(&self) -> String {
        self.lock().as_config_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::control::{Tag, TracingControl, get_trace_ctl};
    use crate::errors::TraceCtlError;
    use crate::targets::TRACING_TARGETS;
    use crate::{LevelFilter, custom_target, trace_target};
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use tracing::{debug, error, info, trace, warn};

    const TARGET_1: &str = "my-target-1";
    const TARGET_2: &str = "my-target-2";

    fn log_target(target: &'static str) {
        match target {
            TARGET_1 => {
                error!(target: TARGET_1, "This is an ERROR log");
                warn!(target: TARGET_1, "This is a WARN log");
                info!(target: TARGET_1, "This is an INFO log");
                debug!(target: TARGET_1, "This is a DEBUG log");
                trace!(target: TARGET_1, "This is a TRACE log");
            }
            _ => {
                error!(target: TARGET_2, "This is an ERROR log");
                info!(target: TARGET_2, "This is an INFO log");
                trace!(target: TARGET_2, "This is a TRACE log");
            }
        }
    }

    #[test]
    #[serial]
    fn test_init() {
        TracingControl::init();
        let tctl = get_trace_ctl();
        info!(
            "The current default loglevel is {}",
            tctl.get_default_level()
        );
        assert!(tctl.get_target(module_path!()).is_some());
    }

    #[test]
    #[serial]
    fn test_target_levels() {
        let tctl = get_trace_ctl();
        tctl.register(TARGET_1, TARGET_1, LevelFilter::TRACE, &[], true);
        tctl.register(TARGET_2, TARGET_2, LevelFilter::DEBUG, &[], true);
        log_target(TARGET_1);
        log_target(TARGET_2);

        assert_eq!(tctl.set_tag_level(TARGET_1, LevelFilter::OFF), 1);
        assert_eq!(tctl.set_tag_level(TARGET_1, LevelFilter::OFF), 0);
        tctl.set_tag_level(TARGET_2, LevelFilter::WARN);
        log_target(TARGET_1);
        log_target(TARGET_2);

        assert_eq!(tctl.get_target(TARGET_1).map(|t| t.level()), Some(LevelFilter::OFF));
        assert_eq!(tctl.get_target(TARGET_2).map(|t| t.level()), Some(LevelFilter::WARN));
    }

    #[allow(unused)]
    fn some_function() {
        custom_target!("func1", LevelFilter::ERROR, &["function1"]);
    }

    #[test]
    #[serial]
    fn test_auto_register_macro() {
        trace_target!("macro-auto", LevelFilter::ERROR, &[]);
        custom_target!("target-1", LevelFilter::ERROR, &[]);

        // linkme collects targets declared anywhere, including later in this function
        let static_targets: Vec<&str> = TRACING_TARGETS.iter().map(|t| t.target).collect();
        assert!(static_targets.contains(&module_path!()));
        assert!(static_targets.contains(&"target-1"));
        assert!(static_targets.contains(&"target-late"));
        assert!(static_targets.contains(&"func1"));
        assert_eq!(static_targets.len(), TRACING_TARGETS.len());

        let tctl = get_trace_ctl();
        assert!(tctl.get_target("target-late").is_some());
        assert!(tctl.get_target("func1").is_some_and(|t| t.is_custom()));
        custom_target!("target-late", LevelFilter::OFF, &["late"]);

        let tags: Vec<Tag> = tctl.get_tags().collect();
        assert!(tags.iter().any(|t| t.name() == "late"));
        assert!(tctl.targets_by_tag_string().contains("late:"));
        assert!(tctl.targets_string().contains("(default)"));
    }

    #[test]
    #[serial]
    fn test_change_tag_level() {
        let tctl = get_trace_ctl();

        const TAG: &str = "common-tag";
        const T1: &str = "t1";
        const T2: &str = "t2";
        const T3: &str = "t3";

        custom_target!(T1, LevelFilter::DEBUG, &[TAG]);
        custom_target!(T2, LevelFilter::ERROR, &[TAG]);
        custom_target!(T3, LevelFilter::WARN, &[TAG]);

        let mut targets: Vec<_> = tctl.get_targets_by_tag(TAG).map(|t| t.target()).collect();
        targets.sort_unstable();
        assert_eq!(targets, vec![T1, T2, T3]);

        tctl.set_tag_level(TAG, LevelFilter::OFF);
        for t in [T1, T2, T3] {
            assert_eq!(tctl.get_target(t).map(|t| t.level()), Some(LevelFilter::OFF));
        }
    }

    #[test]
    #[serial]
    fn test_setup_from_string() {
        const TAG: &str = "setup-tag";
        custom_target!("setup-1", LevelFilter::INFO, &[TAG]);
        custom_target!("setup-2", LevelFilter::INFO, &[]);

        let tctl = get_trace_ctl();
        tctl.setup_from_string("default=warn, setup-tag=off,setup-2=debug")
            .unwrap();
        assert_eq!(tctl.get_default_level(), LevelFilter::WARN);
        assert_eq!(tctl.get_target("setup-1").unwrap().level(), LevelFilter::OFF);
        assert_eq!(tctl.get_target("setup-2").unwrap().level(), LevelFilter::DEBUG);

        // tags override all
        tctl.setup_from_string("all=error,setup-2=trace").unwrap();
        assert_eq!(tctl.get_target("setup-1").unwrap().level(), LevelFilter::ERROR);
        assert_eq!(tctl.get_target("setup-2").unwrap().level(), LevelFilter::TRACE);

        let config = tctl.as_config_string();
        assert!(config.starts_with("default=warn"));
        assert!(config.contains("setup-2=trace"));

        assert!(matches!(
            tctl.setup_from_string("setup-tag=bad"),
            Err(TraceCtlError::InvalidLevel { .. })
        ));
        assert!(matches!(
            tctl.setup_from_string("setup-tag=error, foo"),
            Err(TraceCtlError::InvalidSyntax(_))
        ));
        assert_eq!(
            tctl.setup_from_string("no-such-tag=info"),
            Err(TraceCtlError::UnknownTag("no-such-tag".to_string()))
        );
        // a rejected string changes nothing
        assert_eq!(tctl.get_target("setup-2").unwrap().level(), LevelFilter::TRACE);
        tctl.set_default_level(LevelFilter::INFO);
    }
}
