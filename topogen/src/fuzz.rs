// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Inputs for fuzzing the config parser: a dictionary of config keywords and a seed corpus of
//! valid configurations.

use config::EXAMPLE_CONFIG;
use config::external::{
    ACTION_FIELDS, DP_KEYS, INTERFACE_KEYS, MATCH_FIELDS, STACK_KEYS, TOP_LEVEL_KEYS, VLAN_KEYS,
};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use crate::atlas::atlas;
use crate::errors::GenerationError;
use crate::generator::{GeneratorParamsBuilder, TopoGenerator};

/// Characters combined with every keyword in the dictionary
pub const SEPARATORS: [&str; 9] = [":", " ", "-", "{", "}", "[", "]", ",", "\n"];

/// Other words worth knowing for the fuzzer
const EXTRA_WORDS: [&str; 6] = ["rule", "0x86dd", "0x0800", "true", "false", "Open vSwitch"];

/// All the keywords of the config document
#[must_use]
pub fn keywords() -> BTreeSet<&'static str> {
    TOP_LEVEL_KEYS
        .iter()
        .chain(VLAN_KEYS.iter())
        .chain(DP_KEYS.iter())
        .chain(INTERFACE_KEYS.iter())
        .chain(STACK_KEYS.iter())
        .chain(MATCH_FIELDS.iter())
        .chain(ACTION_FIELDS.iter())
        .chain(EXTRA_WORDS.iter())
        .copied()
        .collect()
}

/// The dictionary tokens: every keyword, every separator, and every keyword with a separator
/// appended and prepended.
#[must_use]
pub fn dictionary() -> Vec<String> {
    let mut tokens = BTreeSet::new();
    for sep in SEPARATORS {
        tokens.insert(sep.to_owned());
    }
    for word in keywords() {
        tokens.insert(word.to_owned());
        for sep in SEPARATORS {
            tokens.insert(format!("{word}{sep}"));
            tokens.insert(format!("{sep}{word}"));
        }
    }
    tokens.into_iter().collect()
}

/// Quote a token for a fuzzer dictionary file
fn quote(token: &str) -> String {
    let mut out = String::from("\"");
    for b in token.bytes() {
        match b {
            b'"' | b'\\' => {
                out.push('\\');
                out.push(char::from(b));
            }
            0x20..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out.push('"');
    out
}

/// The dictionary in fuzzer dictionary format, one quoted token per line
#[must_use]
pub fn dictionary_text() -> String {
    dictionary()
        .iter()
        .map(|t| quote(t) + "\n")
        .collect()
}

/// Write the dictionary to a file. Returns the number of tokens written.
///
/// # Errors
///
/// Fails if the file cannot be written.
pub fn write_dictionary(path: &Path) -> Result<usize, GenerationError> {
    let tokens = dictionary().len();
    std::fs::write(path, dictionary_text())
        .map_err(|e| GenerationError::Io(path.to_path_buf(), e.to_string()))?;
    info!("Wrote {tokens} dictionary tokens to {}", path.display());
    Ok(tokens)
}

/// One config per connected graph of up to `max_nodes` switches, with and without stacking,
/// followed by the example config.
///
/// # Errors
///
/// Fails if the atlas does not go up to `max_nodes` or a config cannot be generated.
pub fn seed_corpus(max_nodes: usize) -> Result<Vec<String>, GenerationError> {
    let mut corpus = vec![];
    for topology in atlas(max_nodes)? {
        for stack in [true, false] {
            let params = GeneratorParamsBuilder::default()
                .stack(stack)
                .build()
                .map_err(|e| GenerationError::Params(e.to_string()))?;
            corpus.push(TopoGenerator::new(params, topology.clone()).generate_yaml()?);
        }
    }
    corpus.push(EXAMPLE_CONFIG.to_owned());
    Ok(corpus)
}

/// Write the seed corpus to `dir` as `ex0`, `ex1`, ... Returns the number of files written.
///
/// # Errors
///
/// Fails if the corpus cannot be generated or a file cannot be written.
pub fn write_seed_corpus(dir: &Path, max_nodes: usize) -> Result<usize, GenerationError> {
    let corpus = seed_corpus(max_nodes)?;
    std::fs::create_dir_all(dir).map_err(|e| GenerationError::Io(dir.to_path_buf(), e.to_string()))?;
    for (n, config) in corpus.iter().enumerate() {
        let path = dir.join(format!("ex{n}"));
        std::fs::write(&path, config).map_err(|e| GenerationError::Io(path, e.to_string()))?;
    }
    info!("Wrote {} seed configs to {}", corpus.len(), dir.display());
    Ok(corpus.len())
}
