// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Generation of switch topologies and of the faucet configs that describe them, and of the
//! inputs used to fuzz the config parser.

#![deny(
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod atlas;
pub mod errors;
pub mod fuzz;
pub mod generator;
pub mod topology;

pub use atlas::{ATLAS_MAX_NODES, atlas}; // re-export
pub use errors::GenerationError; // re-export
pub use fuzz::{dictionary, seed_corpus, write_dictionary, write_seed_corpus}; // re-export
pub use generator::{
    GeneratorParams, GeneratorParamsBuilder, LinkKind, MAX_VLANS, TopoGenerator,
}; // re-export
pub use topology::Topology; // re-export

use tracectl::trace_target;
trace_target!("topogen", LevelFilter::INFO, &["faucet"]);
