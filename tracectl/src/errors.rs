// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors raised when configuring tracing

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceCtlError {
    #[error("Invalid syntax '{0}': it should be tag=loglevel")]
    InvalidSyntax(String),
    #[error("Invalid level '{level}' for tag '{tag}': {reason}")]
    InvalidLevel {
        tag: String,
        level: String,
        reason: String,
    },
    #[error("Unknown tag or target '{0}'")]
    UnknownTag(String),
    #[error("Failed to install error report handler: {0}")]
    ReportHandler(String),
}
