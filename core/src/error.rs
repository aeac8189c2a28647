// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for grammar compilation, parsing and loading

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Line/column location inside a text, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Byte offset from the start of the text
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Locate a byte offset inside `text`
    pub fn locate(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors raised while compiling an EBNF grammar
#[derive(Debug, Error)]
pub enum GrammarError {
    /// The grammar text is not well formed
    #[error("grammar syntax error at {position}: {message}")]
    Syntax { position: Position, message: String },

    /// A literal, pattern or comment runs off the end of the grammar
    #[error("unterminated {what} starting at {position}")]
    Unterminated { what: &'static str, position: Position },

    /// The grammar defines no rules
    #[error("grammar defines no rules")]
    Empty,

    /// The same rule name is defined twice
    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),

    /// A rule refers to a name that isn't defined
    #[error("rule `{rule}` refers to undefined rule `{reference}`")]
    UndefinedRule { rule: String, reference: String },

    /// A `/pattern/` failed to compile
    #[error("invalid pattern /{pattern}/ in rule `{rule}`: {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while parsing text against a grammar
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The text doesn't match the grammar
    #[error("parse error at {position}: expected {}, found {}", format_expected(.expected), format_found(.found))]
    Mismatch {
        /// Farthest position any alternative reached
        position: Position,
        /// What would have been accepted there
        expected: Vec<String>,
        /// Character at that position, `None` at end of input
        found: Option<char>,
    },

    /// The start rule wasn't found in the grammar
    #[error("unknown start rule `{0}`")]
    UnknownRule(String),

    /// Rule nesting got deeper than the configured limit
    #[error("recursion limit of {limit} exceeded in rule `{rule}` at {position}")]
    RecursionLimit {
        rule: String,
        limit: usize,
        position: Position,
    },

    /// The parser thread could not be started
    #[error("failed to start parser thread: {0}")]
    Thread(String),
}

fn format_expected(expected: &[String]) -> String {
    match expected {
        [] => "nothing".to_string(),
        [one] => one.clone(),
        many => format!("one of {}", many.join(", ")),
    }
}

fn format_found(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("{:?}", c),
        None => "end of input".to_string(),
    }
}

/// Errors surfaced by the SGF loader
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid loader config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_counts_lines_and_columns() {
        let text = "ab\ncd\nef";
        assert_eq!(Position::locate(text, 0).to_string(), "1:1");
        assert_eq!(Position::locate(text, 4).to_string(), "2:2");
        assert_eq!(Position::locate(text, 100).offset, text.len());
    }

    #[test]
    fn mismatch_message_lists_expectations() {
        let err = ParseError::Mismatch {
            position: Position::locate("(;", 2),
            expected: vec!["')'".into(), "';'".into()],
            found: None,
        };
        assert_eq!(
            err.to_string(),
            "parse error at 1:3: expected one of ')', ';', found end of input"
        );
    }
}
