// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Rendering of the shell commands that emulate a faucet network with OVS bridges and network
//! namespaces, and that launch the controller or a fuzzing campaign. Plans are only text: running
//! them is up to the user.

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

pub mod bridge;
pub mod builder;
pub mod errors;
pub mod host;
pub mod launch;
pub mod params;
pub mod plan;

pub use builder::{CommandPlan, Render}; // re-export
pub use errors::RenderError; // re-export
pub use launch::LaunchPaths; // re-export
pub use params::{
    ContainerParams, ContainerParamsBuilder, FailMode, FuzzDriver, FuzzParams, FuzzParamsBuilder,
    PlanParams, PlanParamsBuilder,
}; // re-export
pub use plan::NetworkPlan; // re-export

use tracectl::trace_target;
trace_target!("provision", LevelFilter::INFO, &["faucet"]);
