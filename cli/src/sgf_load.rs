// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sgf-load`: parse an SGF document and print what came out

use anyhow::{Context, Result};
use clap::Parser;
use gotrain_core::{LoaderConfig, SgfLoader};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[clap(
    name = "sgf-load",
    version,
    about = "Parse an SGF document with an EBNF grammar and print the parse tree"
)]
pub struct SgfLoadArgs {
    /// SGF document to parse
    pub document: PathBuf,

    /// EBNF grammar to use instead of the bundled SGF grammar
    #[clap(long)]
    pub grammar: Option<PathBuf>,

    /// Rule to start parsing from
    #[clap(long)]
    pub start_rule: Option<String>,

    /// Write the compiled grammar as canonical EBNF to this path
    #[clap(long)]
    pub emit_grammar: Option<PathBuf>,

    /// Print the extracted properties instead of the parse tree
    #[clap(long)]
    pub properties: bool,

    /// Print JSON instead of text
    #[clap(long)]
    pub json: bool,

    /// JSON loader config; flags take precedence over its values
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[clap(short, long)]
    pub verbose: bool,
}

impl SgfLoadArgs {
    /// Loader config from `--config`, with command-line overrides applied
    pub fn loader_config(&self) -> Result<LoaderConfig> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_json_file(path)?,
            None => LoaderConfig::default(),
        };
        if let Some(grammar) = &self.grammar {
            config.grammar_path = Some(grammar.clone());
        }
        if let Some(rule) = &self.start_rule {
            config.start_rule = Some(rule.clone());
        }
        Ok(config)
    }
}

/// Load the document named in `args` and write the result to `out`
pub fn run(args: &SgfLoadArgs, out: &mut impl Write) -> Result<()> {
    let loader = SgfLoader::new(args.loader_config()?).context("failed to prepare grammar")?;
    info!(
        grammar = loader.grammar().name().unwrap_or("unnamed"),
        rules = loader.grammar().rules().len(),
        "grammar compiled"
    );

    // Only a successful parse leaves the grammar artifact behind
    let tree = loader.load_file(&args.document)?;
    if let Some(path) = &args.emit_grammar {
        loader.emit_grammar(path)?;
    }

    if args.properties {
        let properties = loader.properties(&tree);
        info!(count = properties.len(), "extracted properties");
        if args.json {
            serde_json::to_writer_pretty(&mut *out, &properties)?;
            writeln!(out)?;
        } else {
            for property in &properties {
                writeln!(out, "{property}")?;
            }
        }
    } else if args.json {
        serde_json::to_writer_pretty(&mut *out, &tree)?;
        writeln!(out)?;
    } else {
        write!(out, "{tree}")?;
    }
    Ok(())
}
