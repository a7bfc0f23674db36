// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration models for faucet switches. The external model mirrors the YAML document users
//! write. The internal model is what a document validates into: one [`Dp`] per datapath, with
//! every VLAN, ACL and port reference resolved.

#![deny(
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]

pub mod display;
pub mod errors;
pub mod external;
pub mod internal;
pub mod parser;
pub mod watcher;

pub use errors::{ConfigError, ConfigResult, stringify}; // re-export
pub use external::FaucetConfig; // re-export
pub use internal::{Dp, Port, StackPeer, Vlan}; // re-export
pub use parser::{ConfigHashes, dp_parser, load_document, parse_document, parse_str}; // re-export
pub use watcher::ConfigWatcher; // re-export

/// A complete configuration exercising ACLs, VLANs, routers and a datapath
pub const EXAMPLE_CONFIG: &str = include_str!("../fixtures/example.yaml");

use tracectl::trace_target;
trace_target!("config", LevelFilter::INFO, &["faucet"]);
