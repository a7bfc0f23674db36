// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors generating topologies and configurations

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Link {0}-{1} refers to a switch outside of the topology")]
    UnknownSwitch(usize, usize),
    #[error("Link {0}-{0} loops on itself")]
    SelfLoop(usize),
    #[error("The graph atlas stops at {max} nodes, {requested} requested")]
    AtlasTooLarge { requested: usize, max: usize },
    #[error("Hosts or non-stack links need at least one VLAN")]
    NoVlans,
    #[error("At most {0} VLANs can be generated")]
    TooManyVlans(usize),
    #[error("Switch {0} would need port number {1}, which is not a legal port")]
    PortOverflow(usize, u64),
    #[error("Port {0} appears more than once in the port order")]
    DuplicatePortOrder(u32),
    #[error("Invalid address {0}: {1}")]
    Address(String, String),
    #[error("Invalid generator parameters: {0}")]
    Params(String),
    #[error("Failed to write {}: {}", .0.display(), .1)]
    Io(PathBuf, String),
    #[error("Failed to serialize config: {0}")]
    Yaml(String),
}

#[cfg(test)]
mod tests {
    use super::GenerationError;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_io_error_names_the_path() {
        let err = GenerationError::Io(PathBuf::from("corpus/ex0"), "denied".to_owned());
        assert_eq!(err.to_string(), "Failed to write corpus/ex0: denied");
    }
}
