// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Parameters of the rendered plans

use derive_builder::Builder;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Default OpenFlow controller port
pub const OPENFLOW_PORT: u16 = 6653;

/// Default port of the controller's prometheus exporter
pub const PROMETHEUS_PORT: u16 = 9302;

/// What a bridge does when it loses its controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailMode {
    #[default]
    Secure,
    Standalone,
}

impl Display for FailMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailMode::Secure => write!(f, "secure"),
            FailMode::Standalone => write!(f, "standalone"),
        }
    }
}

/// Parameters of the network plan. N.B. we derive a builder type `PlanParamsBuilder`
/// and provide defaults for each field.
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct PlanParams {
    /// Address the bridges connect to
    #[builder(setter(into), default = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub controller: IpAddr,

    #[builder(default = OPENFLOW_PORT)]
    pub controller_port: u16,

    #[builder(setter(into), default = "OpenFlow13".to_owned())]
    pub protocols: String,

    #[builder(default)]
    pub fail_mode: FailMode,
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            controller: IpAddr::V4(Ipv4Addr::LOCALHOST),
            controller_port: OPENFLOW_PORT,
            protocols: "OpenFlow13".to_owned(),
            fail_mode: FailMode::Secure,
        }
    }
}

impl PlanParams {
    /// The controller target of `ovs-vsctl set-controller`
    #[must_use]
    pub fn controller_target(&self) -> String {
        match self.controller {
            IpAddr::V4(a) => format!("tcp:{a}:{}", self.controller_port),
            IpAddr::V6(a) => format!("tcp:[{a}]:{}", self.controller_port),
        }
    }
}

/// Parameters of the controller container. N.B. we derive a builder type
/// `ContainerParamsBuilder` and provide defaults for each field.
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct ContainerParams {
    #[builder(setter(into), default = "faucet".to_owned())]
    pub name: String,

    #[builder(setter(into), default = "faucet/faucet:latest".to_owned())]
    pub image: String,

    #[builder(default = OPENFLOW_PORT)]
    pub openflow_port: u16,

    #[builder(default = PROMETHEUS_PORT)]
    pub prometheus_port: u16,
}

impl Default for ContainerParams {
    fn default() -> Self {
        Self {
            name: "faucet".to_owned(),
            image: "faucet/faucet:latest".to_owned(),
            openflow_port: OPENFLOW_PORT,
            prometheus_port: PROMETHEUS_PORT,
        }
    }
}

/// Which fuzzer drives a fuzzing campaign
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FuzzDriver {
    /// `afl-fuzz` running a target that reads the file named by `@@`
    #[default]
    Afl,
    /// `cargo fuzz` running one of the libFuzzer targets
    LibFuzzer,
}

/// Parameters of a fuzzing campaign. N.B. we derive a builder type `FuzzParamsBuilder`
/// and provide defaults for each field.
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct FuzzParams {
    #[builder(default)]
    pub driver: FuzzDriver,

    #[builder(setter(into), default = PathBuf::from("config.dict"))]
    pub dictionary: PathBuf,

    #[builder(setter(into), default = PathBuf::from("corpus"))]
    pub corpus: PathBuf,

    /// Where AFL stores its findings
    #[builder(setter(into), default = PathBuf::from("findings"))]
    pub findings: PathBuf,

    /// Memory cap of the fuzzed process
    #[builder(default = 4096)]
    pub memory_mb: u32,

    /// The target command for AFL, or the target name for libFuzzer
    #[builder(setter(into), default = "faucet check @@".to_owned())]
    pub target: String,
}

impl Default for FuzzParams {
    fn default() -> Self {
        Self {
            driver: FuzzDriver::Afl,
            dictionary: PathBuf::from("config.dict"),
            corpus: PathBuf::from("corpus"),
            findings: PathBuf::from("findings"),
            memory_mb: 4096,
            target: "faucet check @@".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv6Addr;

    #[test]
    fn test_builder_defaults() {
        assert_eq!(PlanParamsBuilder::default().build().unwrap(), PlanParams::default());
        assert_eq!(
            ContainerParamsBuilder::default().build().unwrap(),
            ContainerParams::default()
        );
        assert_eq!(FuzzParamsBuilder::default().build().unwrap(), FuzzParams::default());
    }

    #[test]
    fn test_controller_target() {
        let params = PlanParamsBuilder::default()
            .controller(Ipv6Addr::LOCALHOST)
            .controller_port(6654u16)
            .build()
            .unwrap();
        assert_eq!(params.controller_target(), "tcp:[::1]:6654");
        assert_eq!(PlanParams::default().controller_target(), "tcp:127.0.0.1:6653");
    }
}
