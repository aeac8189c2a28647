// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot SGF loading: grammar + document in, parse tree out

use crate::config::LoaderConfig;
use crate::engine::Engine;
use crate::error::LoadError;
use crate::grammar::Grammar;
use crate::parse_tree::ParseTree;
use crate::property::Property;
use crate::sgf::{self, GameTree, SGF_GRAMMAR};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Compiles a grammar once and parses SGF documents with it
pub struct SgfLoader {
    grammar: Grammar,
    config: LoaderConfig,
}

impl SgfLoader {
    /// Build a loader from config, reading the grammar file if one is set
    pub fn new(config: LoaderConfig) -> Result<Self, LoadError> {
        let grammar = match &config.grammar_path {
            Some(path) => {
                let text = read(path)?;
                debug!(path = %path.display(), "compiling grammar");
                Grammar::parse(&text)?
            }
            None => Grammar::parse(SGF_GRAMMAR)?,
        };
        Ok(Self { grammar, config })
    }

    /// Loader over the bundled SGF grammar with default settings
    pub fn bundled() -> Result<Self, LoadError> {
        Self::new(LoaderConfig::default())
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Parse SGF text
    pub fn parse_str(&self, text: &str) -> Result<ParseTree, LoadError> {
        let engine = Engine::new(&self.grammar).with_max_depth(self.config.max_depth);
        let tree = match &self.config.start_rule {
            Some(rule) => engine.parse_rule(rule, text)?,
            None => engine.parse(text)?,
        };
        Ok(tree)
    }

    /// Read and parse an SGF file
    pub fn load_file(&self, path: &Path) -> Result<ParseTree, LoadError> {
        let text = read(path)?;
        let tree = self.parse_str(&text)?;
        info!(path = %path.display(), bytes = text.len(), "loaded SGF document");
        Ok(tree)
    }

    /// Write the compiled grammar back out as canonical EBNF
    pub fn emit_grammar(&self, path: &Path) -> Result<(), LoadError> {
        fs::write(path, self.grammar.to_string()).map_err(|source| LoadError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "wrote grammar source");
        Ok(())
    }

    /// Properties found in `tree`, using the configured rule names
    pub fn properties(&self, tree: &ParseTree) -> Vec<Property> {
        sgf::properties(tree, &self.config.rules)
    }

    /// Typed game trees found in `tree`
    pub fn game_trees(&self, tree: &ParseTree) -> Vec<GameTree> {
        sgf::game_trees(tree, &self.config.rules)
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}
