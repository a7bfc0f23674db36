// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Command line of the faucet tool

pub use clap::Parser;
use clap::{Subcommand, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Address of the OpenFlow controller, as `ADDR` or `ADDR:PORT` (`[ADDR]:PORT` for IPv6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerArg {
    pub address: IpAddr,
    pub port: Option<u16>,
}
impl FromStr for ControllerArg {
    type Err = String;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if let Ok(address) = input.parse::<IpAddr>() {
            return Ok(ControllerArg {
                address,
                port: None,
            });
        }
        let sock = input
            .parse::<SocketAddr>()
            .map_err(|e| format!("Bad controller address '{input}': {e}"))?;
        debug!("Controller at {sock}");
        Ok(ControllerArg {
            address: sock.ip(),
            port: Some(sock.port()),
        })
    }
}

/// Shapes of generated switch topologies
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphKind {
    Cycle,
    Path,
    Complete,
    Star,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FuzzerArg {
    #[default]
    Afl,
    Libfuzzer,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Parse and validate a config, and print a summary of it
    Check {
        file: PathBuf,
        /// Also print the hashes of the config files read
        #[arg(long, default_value_t = false)]
        hashes: bool,
    },
    /// Print the validated model of a config
    Show { file: PathBuf },
    /// Validate a config again whenever one of its files changes
    Watch {
        file: PathBuf,
        /// Seconds between checks
        #[arg(long, value_name = "SECS", default_value_t = 5)]
        interval: u64,
        /// Stop after this many checks
        #[arg(long, value_name = "N")]
        rounds: Option<u64>,
    },
    /// Print the stack placement, root and paths of the datapaths of a config
    Stack {
        file: PathBuf,
        /// Only this datapath
        #[arg(long, value_name = "NAME")]
        dp: Option<String>,
        /// Print the stack graph as node-link YAML
        #[arg(long, default_value_t = false)]
        graph: bool,
    },
    /// Generate the config of a switch topology and print it as YAML
    Generate {
        #[arg(long, value_enum, default_value_t = GraphKind::Cycle)]
        graph: GraphKind,
        #[arg(
            long,
            value_name = "N",
            default_value_t = 3,
            value_parser = clap::value_parser!(u16).range(1..=256)
        )]
        nodes: u16,
        /// Link switches with tagged links instead of stack links
        #[arg(long, default_value_t = false)]
        no_stack: bool,
        /// Untagged hosts per VLAN on every switch
        #[arg(long, value_name = "N", default_value_t = 1)]
        hosts: usize,
        #[arg(long, value_name = "N", default_value_t = 0)]
        tagged_hosts: usize,
        #[arg(long, value_name = "N", default_value_t = 2)]
        vlans: usize,
        /// Parallel links between linked switches
        #[arg(long, value_name = "N", default_value_t = 2)]
        links: usize,
        /// Give VLANs VIPs and route between them
        #[arg(long, default_value_t = false)]
        routing: bool,
    },
    /// Write the dictionary used to fuzz the config parser
    FuzzDict { out: PathBuf },
    /// Write a seed corpus of configs to fuzz the config parser with
    FuzzCorpus {
        dir: PathBuf,
        #[arg(long, value_name = "N", default_value_t = 4)]
        max_nodes: usize,
    },
    /// Print the commands launching a fuzzing campaign
    Fuzz {
        #[arg(long, value_enum, default_value_t = FuzzerArg::Afl)]
        driver: FuzzerArg,
        #[arg(long, value_name = "FILE", default_value = "config.dict")]
        dict: PathBuf,
        #[arg(long, value_name = "DIR", default_value = "corpus")]
        corpus: PathBuf,
        #[arg(long, value_name = "DIR", default_value = "findings")]
        findings: PathBuf,
        #[arg(long, value_name = "MB", default_value_t = 4096)]
        memory: u32,
        /// Fuzzed command (afl) or fuzz target (libfuzzer)
        #[arg(long, value_name = "TARGET")]
        target: Option<String>,
    },
    /// Print the commands emulating the network of a config with OVS and namespaces
    Plan {
        file: PathBuf,
        #[arg(
            long,
            value_name = "ADDR",
            value_parser = ControllerArg::from_str,
            help = "Controller address the bridges connect to, as ADDR or ADDR:PORT.
E.g. --controller 192.0.2.1 or --controller [2001:db8::1]:6653"
        )]
        controller: Option<ControllerArg>,
        /// Print the commands removing the network instead
        #[arg(long, default_value_t = false)]
        cleanup: bool,
    },
    /// Print the commands launching the controller container for a config
    Launch {
        file: PathBuf,
        #[arg(long, value_name = "DIR")]
        logdir: PathBuf,
        #[arg(long, value_name = "IMAGE")]
        image: Option<String>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "faucet")]
#[command(version)]
#[command(about = "Validate, generate and emulate faucet switch configurations", long_about = None)]
pub struct CmdArgs {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(
        long,
        default_value_t = false,
        help = "Show the available tracing tags and exit"
    )]
    show_tracing_tags: bool,

    #[arg(
        long,
        default_value_t = false,
        help = "Show configurable tracing targets and exit"
    )]
    show_tracing_targets: bool,

    #[arg(long, help = "generate tracing configuration as a string and exit")]
    tracing_config_generate: bool,

    #[arg(
        long,
        global = true,
        value_name = "tracing configuration",
        help = "Tracing config string as comma-separated sequence of tag=level, with level one in [off,error,warn,info,debug,trace].
Passing default=level sets the default log-level.
Passing all=level allows setting the log-level of all targets to level.
E.g. default=error,all=info,stack=debug will set the default target to error, and all the registered targets to info, but enable debug for stack"
    )]
    tracing: Option<String>,
}

impl CmdArgs {
    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }
    pub fn show_tracing_tags(&self) -> bool {
        self.show_tracing_tags
    }
    pub fn show_tracing_targets(&self) -> bool {
        self.show_tracing_targets
    }
    pub fn tracing_config_generate(&self) -> bool {
        self.tracing_config_generate
    }
    pub fn tracing(&self) -> Option<&String> {
        self.tracing.as_ref()
    }
}
