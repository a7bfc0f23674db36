// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Entry points to parse config documents, from files (with includes) or from strings.

use serde_yaml_ng::{Mapping, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::ConfigError;
use crate::external::{CONFIG_VERSION, FaucetConfig};
use crate::internal::{Dp, build_dps};

/// Content hash of every file read to build a config, keyed by path.
/// Optional includes that were absent map to `None`.
pub type ConfigHashes = BTreeMap<PathBuf, Option<String>>;

/// Sections whose entries are merged across included files
const MERGED_SECTIONS: [&str; 4] = ["acls", "vlans", "routers", "dps"];

/// Hex encoded SHA-256 of some content
#[must_use]
pub fn config_hash(content: &[u8]) -> String {
    Sha256::digest(content)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_owned(), e.to_string()))
}

fn yaml_to_mapping(path: &Path, content: &str) -> Result<Mapping, ConfigError> {
    let value: Value =
        serde_yaml_ng::from_str(content).map_err(|e| ConfigError::from_yaml(&e))?;
    match value {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::NotAMapping(path.to_owned())),
    }
}

fn take_includes(doc: &mut Mapping, key: &str) -> Result<Vec<String>, ConfigError> {
    match doc.remove(key) {
        None | Some(Value::Null) => Ok(vec![]),
        Some(v) => serde_yaml_ng::from_value(v).map_err(|e| ConfigError::from_yaml(&e)),
    }
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml_ng::to_string(other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

/// Merge the top level of `from` into `into`. Entries of the merged sections are combined;
/// any key defined twice is an error, except an identical `version`.
fn merge_top_level(into: &mut Mapping, from: Mapping) -> Result<(), ConfigError> {
    for (key, value) in from {
        let name = key_name(&key);
        let Some(existing) = into.get_mut(&key) else {
            into.insert(key, value);
            continue;
        };
        match (existing, value) {
            (Value::Mapping(dst), Value::Mapping(src))
                if MERGED_SECTIONS.contains(&name.as_str()) =>
            {
                for (k, v) in src {
                    if dst.contains_key(&k) {
                        return Err(ConfigError::DuplicateKey {
                            section: name,
                            key: key_name(&k),
                        });
                    }
                    dst.insert(k, v);
                }
            }
            (dst, src) if name == "version" && *dst == src => {}
            _ => {
                return Err(ConfigError::DuplicateKey {
                    section: "(top level)".to_owned(),
                    key: name,
                });
            }
        }
    }
    Ok(())
}

/// Loads a file and, recursively, the files it includes
struct Loader {
    hashes: ConfigHashes,
    chain: Vec<PathBuf>,
}

impl Loader {
    fn load(&mut self, path: &Path, optional: bool) -> Result<Option<Mapping>, ConfigError> {
        let canonical = match std::fs::canonicalize(path) {
            Ok(p) => p,
            Err(e) if optional && e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Optional include {} is absent", path.display());
                self.hashes.insert(path.to_owned(), None);
                return Ok(None);
            }
            Err(e) => return Err(ConfigError::Io(path.to_owned(), e.to_string())),
        };
        if self.chain.contains(&canonical) {
            return Err(ConfigError::IncludeCycle(path.to_owned()));
        }
        let content = read_config(&canonical)?;
        self.hashes
            .insert(path.to_owned(), Some(config_hash(content.as_bytes())));
        let mut doc = yaml_to_mapping(path, &content)?;

        let includes = take_includes(&mut doc, "include")?;
        let optional_includes = take_includes(&mut doc, "include_optional")?;
        let base = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

        self.chain.push(canonical);
        let mut merged = Mapping::new();
        let children = includes
            .iter()
            .map(|i| (i, false))
            .chain(optional_includes.iter().map(|i| (i, true)));
        for (include, optional) in children {
            debug!("{} includes {include}", path.display());
            if let Some(child) = self.load(&base.join(include), optional)? {
                merge_top_level(&mut merged, child)?;
            }
        }
        self.chain.pop();

        merge_top_level(&mut merged, doc)?;
        Ok(Some(merged))
    }
}

/// Load a config file with its includes, returning the merged document and the file hashes.
pub fn load_document(path: &Path) -> Result<(ConfigHashes, FaucetConfig), ConfigError> {
    let mut loader = Loader {
        hashes: ConfigHashes::new(),
        chain: vec![],
    };
    let merged = loader.load(path, false)?.unwrap_or_default();
    let doc: FaucetConfig = serde_yaml_ng::from_value(Value::Mapping(merged))
        .map_err(|e| ConfigError::from_yaml(&e))?;
    Ok((loader.hashes, doc))
}

/// Validate a document whose includes, if any, have already been resolved.
pub fn parse_document(doc: &FaucetConfig) -> Result<Vec<Dp>, ConfigError> {
    if let Some(version) = doc.version
        && version != CONFIG_VERSION
    {
        return Err(ConfigError::UnsupportedVersion(version));
    }
    build_dps(doc)
}

/// Parse and validate a config document held in memory. Includes are not supported.
pub fn parse_str(yaml: &str) -> Result<Vec<Dp>, ConfigError> {
    let doc: FaucetConfig = serde_yaml_ng::from_str(yaml).map_err(|e| ConfigError::from_yaml(&e))?;
    if !doc.include.is_empty() || !doc.include_optional.is_empty() {
        return Err(ConfigError::IncludeWithoutFile);
    }
    parse_document(&doc)
}

/// Parse a config file, resolving includes, and validate it.
/// `logname` identifies the caller in logs.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn dp_parser(path: &Path, logname: &str) -> Result<(ConfigHashes, Vec<Dp>), ConfigError> {
    let (hashes, doc) = load_document(path)?;
    match parse_document(&doc) {
        Ok(dps) => {
            info!(
                "{logname}: loaded {} DPs from {} files",
                dps.len(),
                hashes.len()
            );
            Ok((hashes, dps))
        }
        Err(e) => {
            warn!("{logname}: invalid config {}: {e}", path.display());
            Err(e)
        }
    }
}
