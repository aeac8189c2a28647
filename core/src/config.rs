// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loader configuration

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default nesting limit for SGF documents; each variation level costs a
/// handful of rule frames.
pub const DEFAULT_LOADER_DEPTH: usize = 512;

/// Grammar rule names used to map a parse tree onto SGF structures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyRules {
    pub game_tree: String,
    pub node: String,
    pub property: String,
    /// Rule matching the property identifier
    pub ident: String,
    /// Rule matching the text between brackets
    pub value: String,
}

impl Default for PropertyRules {
    fn default() -> Self {
        Self {
            game_tree: "game_tree".to_string(),
            node: "node".to_string(),
            property: "property".to_string(),
            ident: "ident".to_string(),
            value: "VALUE".to_string(),
        }
    }
}

/// How the SGF loader finds and runs its grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// EBNF grammar file; the bundled SGF grammar when unset
    pub grammar_path: Option<PathBuf>,
    /// Rule to start from instead of the grammar's start rule
    pub start_rule: Option<String>,
    pub max_depth: usize,
    pub rules: PropertyRules,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            grammar_path: None,
            start_rule: None,
            max_depth: DEFAULT_LOADER_DEPTH,
            rules: PropertyRules::default(),
        }
    }
}

impl LoaderConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| LoadError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
