// SPDX-License-Identifier: MIT OR Apache-2.0

//! EBNF grammar compilation
//!
//! Grammars use a small EBNF dialect:
//!
//! ```text
//! @@grammar :: SGF
//! collection = { game_tree }+ $ ;
//! game_tree  = '(' sequence { game_tree } ')' ;
//! ident      = /[A-Z]+/ ;
//! ```
//!
//! Rules are `name = expression ;`. Expressions support ordered choice (`|`),
//! sequences, grouping `( )`, optionals `[ ]` / `e?`, repetition `{ }`,
//! `{ }*`, `{ }+`, `e*`, `e+`, literals `'x'` / `"x"`, regex patterns `/re/`
//! and the end-of-input marker `$`. Comments are `# ...` and `(* ... *)`.

use crate::error::{GrammarError, Position};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use tracing::debug;

/// Whitespace skipped between tokens unless the grammar overrides it
pub const DEFAULT_WHITESPACE: &str = r"\s+";

/// Deepest `( )`, `[ ]` or `{ }` nesting accepted in a rule
pub const MAX_NESTING: usize = 64;

/// A compiled regex terminal
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn compile(source: &str, rule: &str) -> Result<Self, GrammarError> {
        let regex = Regex::new(&format!("^(?:{})", source)).map_err(|e| {
            GrammarError::InvalidPattern {
                rule: rule.to_string(),
                pattern: source.to_string(),
                source: e,
            }
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Pattern text as written in the grammar
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Length of the match at the start of `input`, if any
    pub fn match_len(&self, input: &str) -> Option<usize> {
        self.regex.find(input).map(|m| m.end())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

/// Right-hand side of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Pattern(Pattern),
    /// Reference to another rule by name
    Rule(String),
    /// All items in order; an empty sequence always matches
    Sequence(Vec<Expr>),
    /// First alternative that matches
    Choice(Vec<Expr>),
    Optional(Box<Expr>),
    Repeat {
        expr: Box<Expr>,
        at_least_one: bool,
    },
    EndOfInput,
}

impl Expr {
    /// Levels of nested expressions, counting this one
    pub fn depth(&self) -> usize {
        match self {
            Expr::Sequence(items) | Expr::Choice(items) => {
                1 + items.iter().map(Expr::depth).max().unwrap_or(0)
            }
            Expr::Optional(expr) | Expr::Repeat { expr, .. } => 1 + expr.depth(),
            Expr::Literal(_) | Expr::Pattern(_) | Expr::Rule(_) | Expr::EndOfInput => 1,
        }
    }

    fn for_each_reference<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Expr::Rule(name) => f(name),
            Expr::Sequence(items) | Expr::Choice(items) => {
                for item in items {
                    item.for_each_reference(f);
                }
            }
            Expr::Optional(expr) | Expr::Repeat { expr, .. } => expr.for_each_reference(f),
            Expr::Literal(_) | Expr::Pattern(_) | Expr::EndOfInput => {}
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Choice(_) => write!(f, "( {} )", self),
            Expr::Sequence(items) if items.len() > 1 => write!(f, "( {} )", self),
            _ => write!(f, "{}", self),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(text) => write!(f, "'{}'", escape_literal(text)),
            Expr::Pattern(pattern) => write!(f, "/{}/", pattern.source.replace('/', "\\/")),
            Expr::Rule(name) => f.write_str(name),
            Expr::Sequence(items) if items.is_empty() => f.write_str("()"),
            Expr::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    item.fmt_nested(f)?;
                }
                Ok(())
            }
            Expr::Choice(alternatives) => {
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    match alt {
                        Expr::Choice(_) => write!(f, "( {} )", alt)?,
                        _ => write!(f, "{}", alt)?,
                    }
                }
                Ok(())
            }
            Expr::Optional(expr) => write!(f, "[ {} ]", expr),
            Expr::Repeat { expr, at_least_one } => {
                write!(f, "{{ {} }}{}", expr, if *at_least_one { "+" } else { "*" })
            }
            Expr::EndOfInput => f.write_str("$"),
        }
    }
}

fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// A named grammar rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub expr: Expr,
}

impl Rule {
    /// Lexical rules (no lowercase letters in the name, e.g. `VALUE`) match
    /// their terminals without skipping whitespace.
    pub fn is_lexical(&self) -> bool {
        is_lexical_name(&self.name)
    }
}

pub(crate) fn is_lexical_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase()) && !name.chars().any(|c| c.is_ascii_lowercase())
}

/// A compiled grammar, ready to be handed to [`crate::engine::Engine`]
#[derive(Debug, Clone)]
pub struct Grammar {
    name: Option<String>,
    directives: Vec<(String, String)>,
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
    whitespace: Option<Pattern>,
}

impl Grammar {
    /// Compile grammar text
    pub fn parse(text: &str) -> Result<Self, GrammarError> {
        let mut reader = GrammarReader::new(text);
        let mut grammar = Grammar {
            name: None,
            directives: Vec::new(),
            rules: Vec::new(),
            index: HashMap::new(),
            whitespace: Some(Pattern::compile(DEFAULT_WHITESPACE, "@@whitespace")?),
        };

        loop {
            reader.skip_trivia()?;
            if reader.peek().is_none() {
                break;
            }
            if reader.starts_with("@@") {
                let (name, value) = reader.directive()?;
                grammar.apply_directive(name, value)?;
            } else {
                let rule = reader.rule()?;
                if grammar.index.contains_key(&rule.name) {
                    return Err(GrammarError::DuplicateRule(rule.name));
                }
                grammar.index.insert(rule.name.clone(), grammar.rules.len());
                grammar.rules.push(rule);
            }
        }

        if grammar.rules.is_empty() {
            return Err(GrammarError::Empty);
        }
        grammar.check_references()?;

        debug!(
            name = grammar.name.as_deref().unwrap_or("<unnamed>"),
            rules = grammar.rules.len(),
            "compiled grammar"
        );
        Ok(grammar)
    }

    fn apply_directive(&mut self, name: String, value: String) -> Result<(), GrammarError> {
        match name.as_str() {
            "grammar" => self.name = Some(value.clone()),
            "whitespace" => {
                let source = value
                    .strip_prefix('/')
                    .and_then(|v| v.strip_suffix('/'))
                    .unwrap_or(&value);
                self.whitespace = if source.is_empty() || source == "None" {
                    None
                } else {
                    Some(Pattern::compile(&source.replace("\\/", "/"), "@@whitespace")?)
                };
            }
            _ => {}
        }
        self.directives.push((name, value));
        Ok(())
    }

    fn check_references(&self) -> Result<(), GrammarError> {
        for rule in &self.rules {
            let mut missing = None;
            rule.expr.for_each_reference(&mut |reference| {
                if missing.is_none() && !self.index.contains_key(reference) {
                    missing = Some(reference.to_string());
                }
            });
            if let Some(reference) = missing {
                return Err(GrammarError::UndefinedRule {
                    rule: rule.name.clone(),
                    reference,
                });
            }
        }
        Ok(())
    }

    /// Value of `@@grammar`, if given
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&i| &self.rules[i])
    }

    /// `start` when defined, otherwise the first rule
    pub fn start_rule(&self) -> &Rule {
        self.rule("start").unwrap_or(&self.rules[0])
    }

    /// Deepest expression nesting of any rule
    pub fn expression_depth(&self) -> usize {
        self.rules.iter().map(|r| r.expr.depth()).max().unwrap_or(0)
    }

    /// Whitespace skipped before terminals, `None` when disabled
    pub fn whitespace(&self) -> Option<&Pattern> {
        self.whitespace.as_ref()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.directives {
            writeln!(f, "@@{} :: {}", name, value)?;
        }
        if !self.directives.is_empty() {
            writeln!(f)?;
        }
        for rule in &self.rules {
            writeln!(f, "{} = {} ;", rule.name, rule.expr)?;
        }
        Ok(())
    }
}

/// Hand-written reader over grammar text
struct GrammarReader<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current_rule: String,
    nesting: usize,
}

impl<'a> GrammarReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
            current_rule: String::new(),
            nesting: 0,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.text.len())
    }

    fn position(&mut self) -> Position {
        let offset = self.offset();
        Position::locate(self.text, offset)
    }

    fn starts_with(&mut self, prefix: &str) -> bool {
        let offset = self.offset();
        self.text[offset..].starts_with(prefix)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn syntax_error(&mut self, message: impl Into<String>) -> GrammarError {
        GrammarError::Syntax {
            position: self.position(),
            message: message.into(),
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), GrammarError> {
        self.skip_trivia()?;
        if !self.starts_with(token) {
            let found = match self.peek() {
                Some(c) => format!("{:?}", c),
                None => "end of grammar".to_string(),
            };
            return Err(self.syntax_error(format!("expected `{}`, found {}", token, found)));
        }
        for _ in token.chars() {
            self.bump();
        }
        Ok(())
    }

    /// Skip whitespace, `#` line comments and `(* *)` block comments
    fn skip_trivia(&mut self) -> Result<(), GrammarError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('(') if self.starts_with("(*") => {
                    let start = self.position();
                    self.bump();
                    self.bump();
                    loop {
                        if self.starts_with("*)") {
                            self.bump();
                            self.bump();
                            break;
                        }
                        if self.bump().is_none() {
                            return Err(GrammarError::Unterminated {
                                what: "comment",
                                position: start,
                            });
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn identifier(&mut self) -> Result<String, GrammarError> {
        let mut name = String::new();
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(self.syntax_error("expected a rule name")),
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Ok(name)
    }

    fn directive(&mut self) -> Result<(String, String), GrammarError> {
        self.bump();
        self.bump();
        let name = self.identifier()?;
        self.expect("::")?;
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }

        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            value.push(c);
            self.bump();
        }
        Ok((name, value.trim().to_string()))
    }

    fn rule(&mut self) -> Result<Rule, GrammarError> {
        let name = self.identifier()?;
        self.current_rule = name.clone();
        self.expect("=")?;
        let expr = self.choice()?;
        self.expect(";")?;
        Ok(Rule { name, expr })
    }

    fn choice(&mut self) -> Result<Expr, GrammarError> {
        self.skip_trivia()?;
        if self.peek() == Some('|') {
            self.bump();
        }

        let mut alternatives = vec![self.sequence()?];
        loop {
            self.skip_trivia()?;
            if self.peek() != Some('|') {
                break;
            }
            self.bump();
            alternatives.push(self.sequence()?);
        }

        if alternatives.len() == 1 {
            Ok(alternatives.remove(0))
        } else {
            Ok(Expr::Choice(alternatives))
        }
    }

    fn sequence(&mut self) -> Result<Expr, GrammarError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None | Some(';') | Some('|') | Some(')') | Some(']') | Some('}') => break,
                _ => items.push(self.postfix()?),
            }
        }

        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Expr::Sequence(items))
        }
    }

    fn postfix(&mut self) -> Result<Expr, GrammarError> {
        let (expr, braced) = self.atom()?;
        self.skip_trivia()?;

        let expr = match (self.peek(), expr) {
            (Some('+'), Expr::Repeat { expr, .. }) if braced => {
                self.bump();
                Expr::Repeat {
                    expr,
                    at_least_one: true,
                }
            }
            (Some('*'), repeat @ Expr::Repeat { .. }) if braced => {
                self.bump();
                repeat
            }
            (Some('+'), expr) => {
                self.bump();
                Expr::Repeat {
                    expr: Box::new(expr),
                    at_least_one: true,
                }
            }
            (Some('*'), expr) => {
                self.bump();
                Expr::Repeat {
                    expr: Box::new(expr),
                    at_least_one: false,
                }
            }
            (Some('?'), expr) => {
                self.bump();
                Expr::Optional(Box::new(expr))
            }
            (_, expr) => expr,
        };
        Ok(expr)
    }

    /// Returns the expression and whether it was written with `{ }`
    fn atom(&mut self) -> Result<(Expr, bool), GrammarError> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => Ok((Expr::Literal(self.literal(quote)?), false)),
            Some('/') => {
                let source = self.pattern_source()?;
                let pattern = Pattern::compile(&source, &self.current_rule)?;
                Ok((Expr::Pattern(pattern), false))
            }
            Some('(') => {
                self.bump();
                self.skip_trivia()?;
                if self.peek() == Some(')') {
                    self.bump();
                    return Ok((Expr::Sequence(Vec::new()), false));
                }
                let expr = self.nested(")")?;
                Ok((expr, false))
            }
            Some('[') => {
                self.bump();
                let expr = self.nested("]")?;
                Ok((Expr::Optional(Box::new(expr)), false))
            }
            Some('{') => {
                self.bump();
                let expr = self.nested("}")?;
                let repeat = Expr::Repeat {
                    expr: Box::new(expr),
                    at_least_one: false,
                };
                Ok((repeat, true))
            }
            Some('$') => {
                self.bump();
                Ok((Expr::EndOfInput, false))
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                Ok((Expr::Rule(self.identifier()?), false))
            }
            Some(c) => Err(self.syntax_error(format!("unexpected character {:?}", c))),
            None => Err(self.syntax_error("unexpected end of grammar")),
        }
    }

    /// Bracketed choice up to `close`, bounded by [`MAX_NESTING`]
    fn nested(&mut self, close: &str) -> Result<Expr, GrammarError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.syntax_error(format!(
                "expressions nested deeper than {} levels",
                MAX_NESTING
            )));
        }
        self.nesting += 1;
        let expr = self.choice();
        self.nesting -= 1;
        let expr = expr?;
        self.expect(close)?;
        Ok(expr)
    }

    fn literal(&mut self, quote: char) -> Result<String, GrammarError> {
        let start = self.position();
        self.bump();

        let mut text = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some(other) => text.push(other),
                    None => break,
                },
                Some(c) => text.push(c),
                None => break,
            }
        }

        Err(GrammarError::Unterminated {
            what: "literal",
            position: start,
        })
    }

    fn pattern_source(&mut self) -> Result<String, GrammarError> {
        let start = self.position();
        self.bump();

        let mut source = String::new();
        loop {
            match self.bump() {
                Some('/') => return Ok(source),
                Some('\\') => match self.bump() {
                    Some('/') => source.push('/'),
                    Some(other) => {
                        source.push('\\');
                        source.push(other);
                    }
                    None => break,
                },
                Some('\n') | None => break,
                Some(c) => source.push(c),
            }
        }

        Err(GrammarError::Unterminated {
            what: "pattern",
            position: start,
        })
    }
}
