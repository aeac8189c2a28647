// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed SGF views over a parse tree
//!
//! The grammar engine only produces a generic [`ParseTree`]; the functions
//! here pick out game trees, nodes and properties by rule name (see
//! [`PropertyRules`]) and turn bracketed values into [`Property`]s.

use crate::config::PropertyRules;
use crate::parse_tree::ParseTree;
use crate::property::{unescape_value, Property};
use std::fmt;

/// The bundled SGF grammar
pub const SGF_GRAMMAR: &str = include_str!("../resources/sgf.ebnf");

/// One `;`-introduced node of a game record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SgfNode {
    pub properties: Vec<Property>,
}

impl SgfNode {
    /// First property with the given key
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.key() == key)
    }

    /// All values recorded under `key`, e.g. every stone in `AB[aa][bb]`
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.key() == key)
            .map(|p| p.value())
    }
}

impl fmt::Display for SgfNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(";")?;
        let mut previous: Option<&str> = None;
        for prop in &self.properties {
            // Consecutive values of one key share the identifier: AB[aa][bb]
            if previous == Some(prop.key()) {
                write!(f, "[{}]", crate::property::escape_value(prop.value()))?;
            } else {
                write!(f, "{}", prop)?;
            }
            previous = Some(prop.key());
        }
        Ok(())
    }
}

/// A parenthesised sequence of nodes plus its variations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameTree {
    pub nodes: Vec<SgfNode>,
    pub variations: Vec<GameTree>,
}

impl GameTree {
    /// Root node holding the game info (`SZ`, `KM`, ...)
    pub fn root(&self) -> Option<&SgfNode> {
        self.nodes.first()
    }

    /// Nodes along the main line, following the first variation at each fork
    pub fn main_line(&self) -> Vec<&SgfNode> {
        let mut line = Vec::new();
        let mut tree = Some(self);
        while let Some(current) = tree {
            line.extend(current.nodes.iter());
            tree = current.variations.first();
        }
        line
    }

    /// Total number of nodes including every variation
    pub fn node_count(&self) -> usize {
        self.nodes.len() + self.variations.iter().map(GameTree::node_count).sum::<usize>()
    }
}

impl fmt::Display for GameTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for node in &self.nodes {
            write!(f, "{}", node)?;
        }
        for variation in &self.variations {
            write!(f, "{}", variation)?;
        }
        f.write_str(")")
    }
}

/// Every property below `tree`, in document order.
///
/// Each bracketed value yields its own [`Property`] carrying the identifier
/// of the enclosing property, so `AB[aa][bb]` becomes two properties keyed
/// `AB`. Values are unescaped.
pub fn properties(tree: &ParseTree, rules: &PropertyRules) -> Vec<Property> {
    let mut out = Vec::new();
    for prop in tree.find_all(&rules.property) {
        let key = match prop.find_first(&rules.ident) {
            Some(ident) => ident.text(),
            None => continue,
        };
        for value in prop.find_all(&rules.value) {
            out.push(Property::new(key.as_str(), unescape_value(&value.text())));
        }
    }
    out
}

/// Typed game trees for every top-level game tree in the collection
pub fn game_trees(tree: &ParseTree, rules: &PropertyRules) -> Vec<GameTree> {
    tree.find_all(&rules.game_tree)
        .map(|game_tree| build_game_tree(game_tree, rules))
        .collect()
}

fn build_game_tree(tree: &ParseTree, rules: &PropertyRules) -> GameTree {
    let mut game = GameTree::default();
    for child in tree.children() {
        collect_structure(child, rules, &mut game);
    }
    game
}

fn collect_structure(tree: &ParseTree, rules: &PropertyRules, game: &mut GameTree) {
    match tree.rule() {
        Some(rule) if rule == rules.game_tree => {
            game.variations.push(build_game_tree(tree, rules));
        }
        Some(rule) if rule == rules.node => {
            game.nodes.push(SgfNode {
                properties: properties(tree, rules),
            });
        }
        Some(_) => {
            for child in tree.children() {
                collect_structure(child, rules, game);
            }
        }
        None => {}
    }
}
