// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Detection of changes to the set of files a config was loaded from

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::parser::{ConfigHashes, config_hash};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FileStat {
    modified: Option<SystemTime>,
    len: u64,
}

fn stat(path: &Path) -> Option<FileStat> {
    std::fs::metadata(path).ok().map(|m| FileStat {
        modified: m.modified().ok(),
        len: m.len(),
    })
}

fn current_hash(path: &Path) -> Option<String> {
    std::fs::read(path).ok().map(|c| config_hash(&c))
}

/// Remembers the files of the last loaded config and tells whether they changed since
#[derive(Debug, Default)]
pub struct ConfigWatcher {
    config_file: Option<PathBuf>,
    hashes: ConfigHashes,
    stats: BTreeMap<PathBuf, Option<FileStat>>,
}

impl ConfigWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly loaded config: its main file and the hashes of all the files read
    pub fn update(&mut self, config_file: &Path, hashes: ConfigHashes) {
        self.stats = hashes.keys().map(|p| (p.clone(), stat(p))).collect();
        self.config_file = Some(config_file.to_owned());
        self.hashes = hashes;
        debug!(
            "Watching {} files of {}",
            self.hashes.len(),
            config_file.display()
        );
    }

    #[must_use]
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// True if any watched file was created, removed, or had its content modified
    #[must_use]
    pub fn files_changed(&self) -> bool {
        self.hashes.iter().any(|(path, hash)| {
            let now = stat(path);
            if self.stats.get(path).is_some_and(|before| *before == now) {
                return false;
            }
            let changed = current_hash(path) != *hash;
            if changed {
                debug!("Config file {} changed", path.display());
            }
            changed
        })
    }

    /// True if loading `new_config_file` would yield a different config than the last one:
    /// either it is another file, or some file content differs.
    #[must_use]
    pub fn content_changed(&self, new_config_file: &Path) -> bool {
        if self.config_file.as_deref() != Some(new_config_file) {
            return true;
        }
        self.hashes
            .iter()
            .any(|(path, hash)| current_hash(path) != *hash)
    }
}
