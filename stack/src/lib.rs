// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Stacking of faucet datapaths: the stack graph and its root, the state of stack ports as
//! driven by LLDP, the forwarding roles of each stack port and the election of the root.

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
#![allow(clippy::must_use_candidate)]

pub mod election;
pub mod errors;
pub mod graph;
pub mod manager;
pub mod port;
pub mod topology;

pub use election::{DpLiveness, RootChange, RootElection, STACK_ROOT_STATE_UPDATE_TIME}; // re-export
pub use errors::StackError; // re-export
pub use manager::StackManager; // re-export
pub use port::{StackPort, StackPortState, StateChange, Timestamp}; // re-export
pub use topology::{Placement, Stack}; // re-export

use tracectl::trace_target;
trace_target!("stack", LevelFilter::INFO, &["faucet"]);
