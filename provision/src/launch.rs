// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Plan renderer: launching the controller container and fuzzing campaigns

use std::path::{Path, PathBuf};

use crate::builder::{CommandPlan, MARKER, Render, shell_word};
use crate::params::{ContainerParams, FuzzDriver, FuzzParams};

/// Where the controller looks for its config inside the container
pub const CONTAINER_CONFIG: &str = "/etc/faucet/faucet.yaml";

/// Where the controller writes its logs inside the container
pub const CONTAINER_LOGDIR: &str = "/var/log/faucet";

/// Environment needed by AFL on hosts that were not tuned for it
pub const AFL_ENVIRONMENT: [(&str, &str); 2] = [
    ("AFL_SKIP_CPUFREQ", "1"),
    ("AFL_I_DONT_CARE_ABOUT_MISSING_CRASHES", "1"),
];

/// Host paths mounted into the controller container
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchPaths {
    pub config: PathBuf,
    pub logdir: PathBuf,
}

fn word(path: &Path) -> String {
    shell_word(&path.to_string_lossy())
}

impl Render for ContainerParams {
    type Context = LaunchPaths;
    type Output = CommandPlan;
    fn render(&self, paths: &LaunchPaths) -> CommandPlan {
        let mut plan = CommandPlan::new();
        plan += MARKER;
        plan.comment(format_args!("controller container {}", self.name));
        plan += format!("mkdir -p {}", word(&paths.logdir));
        plan += format!("docker rm --force {} 2>/dev/null || true", self.name);
        plan += format!(
            "docker run --detach --name {} --restart always -v {}:{CONTAINER_CONFIG}:ro -v {}:{CONTAINER_LOGDIR} -p {of}:{of} -p {prom}:{prom} {}",
            self.name,
            word(&paths.config),
            word(&paths.logdir),
            self.image,
            of = self.openflow_port,
            prom = self.prometheus_port,
        );
        plan
    }
}

impl Render for FuzzParams {
    type Context = ();
    type Output = CommandPlan;
    fn render(&self, _ctx: &Self::Context) -> CommandPlan {
        let mut plan = CommandPlan::new();
        plan += MARKER;
        match self.driver {
            FuzzDriver::Afl => {
                plan.comment("fuzz the config parser with afl");
                for (var, value) in AFL_ENVIRONMENT {
                    plan += format!("export {var}={value}");
                }
                plan += format!(
                    "afl-fuzz -m {} -x {} -i {} -o {} -- {}",
                    self.memory_mb,
                    word(&self.dictionary),
                    word(&self.corpus),
                    word(&self.findings),
                    self.target
                );
            }
            FuzzDriver::LibFuzzer => {
                plan.comment("fuzz the config parser with libFuzzer");
                plan += format!(
                    "cargo fuzz run {} {} -- -dict={} -rss_limit_mb={}",
                    self.target,
                    word(&self.corpus),
                    word(&self.dictionary),
                    self.memory_mb
                );
            }
        }
        plan
    }
}
