// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Crate to control tracing dynamically at runtime.
//!
//! Every crate in the workspace declares the targets it logs to with [`trace_target!`] or
//! [`custom_target!`]. Targets are collected at link time and can be tuned by name or by tag
//! from a single string such as `default=info,config=debug,stack=trace`.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod control;
pub mod display;
pub mod errors;
pub mod targets;

// re-exports
pub use control::TracingControl;
pub use control::get_trace_ctl;
pub use errors::TraceCtlError;
pub use tracing_subscriber::filter::LevelFilter;
