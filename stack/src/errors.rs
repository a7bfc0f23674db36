// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors resolving a stack topology

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error("Stack link {0} is defined only in one direction")]
    OneWayLink(String),
    #[error("Stack ports are configured but no DP has a stack priority")]
    NoRootConfigured,
    #[error("DP '{0}' is not connected to the stack root '{1}'")]
    NotConnected(String, String),
    #[error("Unknown DP '{0}'")]
    UnknownDp(String),
    #[error("DP '{0}' has no stack port {1}")]
    UnknownPort(String, u32),
}
