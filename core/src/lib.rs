// SPDX-License-Identifier: MIT OR Apache-2.0

//! go-training core: SGF data model and grammar-driven loading
//!
//! This crate provides:
//! - The SGF [`Property`] model
//! - An EBNF grammar compiler and PEG interpreter producing [`ParseTree`]s
//! - The SGF loader, plus typed game-tree views over its parse trees

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod loader;
pub mod parse_tree;
pub mod property;
pub mod sgf;

pub use config::{LoaderConfig, PropertyRules};
pub use engine::Engine;
pub use error::{GrammarError, LoadError, ParseError, Position};
pub use grammar::Grammar;
pub use loader::SgfLoader;
pub use parse_tree::ParseTree;
pub use property::{Property, DEFAULT_PATTERN};
pub use sgf::{GameTree, SgfNode};
