// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parse trees produced by the grammar engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of running a grammar over some text.
///
/// Every rule invocation becomes a [`ParseTree::Node`] named after the rule;
/// matched literals and patterns become [`ParseTree::Leaf`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTree {
    /// Matched source text
    Leaf(String),
    /// A rule match and everything it matched
    Node {
        /// Name of the rule that matched
        rule: String,
        /// Children in document order
        children: Vec<ParseTree>,
    },
}

impl ParseTree {
    pub fn leaf(text: impl Into<String>) -> Self {
        ParseTree::Leaf(text.into())
    }

    pub fn node(rule: impl Into<String>, children: Vec<ParseTree>) -> Self {
        ParseTree::Node {
            rule: rule.into(),
            children,
        }
    }

    /// Rule name for nodes, `None` for leaves
    pub fn rule(&self) -> Option<&str> {
        match self {
            ParseTree::Leaf(_) => None,
            ParseTree::Node { rule, .. } => Some(rule),
        }
    }

    pub fn children(&self) -> &[ParseTree] {
        match self {
            ParseTree::Leaf(_) => &[],
            ParseTree::Node { children, .. } => children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ParseTree::Leaf(_))
    }

    /// Concatenation of every leaf below this tree
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            ParseTree::Leaf(text) => out.push_str(text),
            ParseTree::Node { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Pre-order search for nodes named `rule`.
    ///
    /// A matching node is yielded but not descended into, so nested matches
    /// (e.g. game trees inside game trees) are left to the caller.
    pub fn find_all<'a>(&'a self, rule: &'a str) -> FindAll<'a> {
        FindAll {
            rule,
            stack: vec![self],
        }
    }

    /// First direct or indirect child node named `rule`
    pub fn find_first<'a>(&'a self, rule: &'a str) -> Option<&'a ParseTree> {
        self.children()
            .iter()
            .find_map(|child| child.find_all(rule).next())
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = depth * 2;
        match self {
            ParseTree::Leaf(text) => writeln!(f, "{:indent$}{:?}", "", text),
            ParseTree::Node { rule, children } if children.is_empty() => {
                writeln!(f, "{:indent$}{}: []", "", rule)
            }
            ParseTree::Node { rule, children } => {
                writeln!(f, "{:indent$}{}:", "", rule)?;
                for child in children {
                    child.fmt_indented(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Iterator returned by [`ParseTree::find_all`]
pub struct FindAll<'a> {
    rule: &'a str,
    stack: Vec<&'a ParseTree>,
}

impl<'a> Iterator for FindAll<'a> {
    type Item = &'a ParseTree;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(tree) = self.stack.pop() {
            if tree.rule() == Some(self.rule) {
                return Some(tree);
            }
            self.stack.extend(tree.children().iter().rev());
        }
        None
    }
}
