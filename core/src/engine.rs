// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grammar interpreter
//!
//! Runs a compiled [`Grammar`] over input text with PEG semantics: ordered
//! choice, greedy repetition and backtracking on failed sequences. Errors
//! report the farthest position any alternative reached.

use crate::error::{ParseError, Position};
use crate::grammar::{Expr, Grammar};
use crate::parse_tree::ParseTree;
use std::collections::BTreeSet;
use std::{panic, thread};
use tracing::{debug, trace};

/// Default limit on nested rule invocations
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Stack reserved for each nested evaluation frame
const FRAME_STACK: usize = 8 * 1024;
/// Headroom on top of the per-frame reservation
const BASE_STACK: usize = 1024 * 1024;
const MAX_STACK: usize = 1024 * 1024 * 1024;

/// Interprets a grammar against input text
pub struct Engine<'g> {
    grammar: &'g Grammar,
    max_depth: usize,
}

/// Per-parse bookkeeping
struct State<'t> {
    text: &'t str,
    depth: usize,
    farthest: usize,
    expected: BTreeSet<String>,
}

impl<'t> State<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            depth: 0,
            farthest: 0,
            expected: BTreeSet::new(),
        }
    }

    fn fail(&mut self, pos: usize, expected: String) {
        if pos > self.farthest {
            self.farthest = pos;
            self.expected.clear();
        }
        if pos == self.farthest {
            self.expected.insert(expected);
        }
    }

    fn mismatch(self) -> ParseError {
        ParseError::Mismatch {
            position: Position::locate(self.text, self.farthest),
            found: self.text[self.farthest..].chars().next(),
            expected: self.expected.into_iter().collect(),
        }
    }
}

type Step = Result<Option<usize>, ParseError>;

impl<'g> Engine<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit rule nesting; left-recursive grammars hit this instead of
    /// overflowing the stack.
    ///
    /// Parsing runs on its own thread whose stack is sized from this limit
    /// and the grammar's deepest expression, so the limit holds whatever
    /// stack the calling thread has.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse `text` starting from the grammar's start rule
    pub fn parse(&self, text: &str) -> Result<ParseTree, ParseError> {
        let start = self.grammar.start_rule().name.clone();
        self.parse_rule(&start, text)
    }

    /// Parse `text` starting from `rule`. The whole input must be consumed,
    /// apart from trailing whitespace.
    pub fn parse_rule(&self, rule: &str, text: &str) -> Result<ParseTree, ParseError> {
        if self.grammar.rule(rule).is_none() {
            return Err(ParseError::UnknownRule(rule.to_string()));
        }
        let stack_size = self.stack_size();
        debug!(rule, bytes = text.len(), stack_size, "parsing");

        thread::scope(|scope| {
            let worker = thread::Builder::new()
                .name("grammar-parse".to_string())
                .stack_size(stack_size)
                .spawn_scoped(scope, || self.run(rule, text))
                .map_err(|e| ParseError::Thread(e.to_string()))?;
            worker
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload))
        })
    }

    /// Every rule frame evaluates at most `expression_depth` nested
    /// expressions before the next rule frame.
    fn stack_size(&self) -> usize {
        let frames = self
            .max_depth
            .saturating_mul(self.grammar.expression_depth() + 1);
        frames
            .saturating_mul(FRAME_STACK)
            .saturating_add(BASE_STACK)
            .min(MAX_STACK)
    }

    fn run(&self, rule: &str, text: &str) -> Result<ParseTree, ParseError> {
        let mut state = State::new(text);
        let mut out = Vec::with_capacity(1);

        let end = match self.invoke(rule, 0, false, &mut state, &mut out)? {
            Some(end) => self.skip_whitespace(text, end, false),
            None => return Err(state.mismatch()),
        };
        if end < text.len() {
            state.fail(end, "end of input".to_string());
            return Err(state.mismatch());
        }

        match out.pop() {
            Some(tree) => Ok(tree),
            None => Err(state.mismatch()),
        }
    }

    fn skip_whitespace(&self, text: &str, mut pos: usize, lexical: bool) -> usize {
        if lexical {
            return pos;
        }
        if let Some(ws) = self.grammar.whitespace() {
            while let Some(len) = ws.match_len(&text[pos..]) {
                if len == 0 {
                    break;
                }
                pos += len;
            }
        }
        pos
    }

    fn invoke(
        &self,
        name: &str,
        pos: usize,
        lexical: bool,
        state: &mut State<'_>,
        out: &mut Vec<ParseTree>,
    ) -> Step {
        let rule = self
            .grammar
            .rule(name)
            .ok_or_else(|| ParseError::UnknownRule(name.to_string()))?;

        if state.depth >= self.max_depth {
            return Err(ParseError::RecursionLimit {
                rule: name.to_string(),
                limit: self.max_depth,
                position: Position::locate(state.text, pos),
            });
        }

        trace!(rule = name, pos, "enter");
        state.depth += 1;
        let mut children = Vec::new();
        let result = self.eval(
            &rule.expr,
            pos,
            lexical || rule.is_lexical(),
            state,
            &mut children,
        );
        state.depth -= 1;

        let end = result?;
        if end.is_some() {
            out.push(ParseTree::node(name, children));
        }
        Ok(end)
    }

    /// Match `expr` at `pos`. On failure nothing is left in `out`.
    fn eval(
        &self,
        expr: &Expr,
        pos: usize,
        lexical: bool,
        state: &mut State<'_>,
        out: &mut Vec<ParseTree>,
    ) -> Step {
        let text = state.text;
        match expr {
            Expr::Literal(literal) => {
                let at = self.skip_whitespace(text, pos, lexical);
                if text[at..].starts_with(literal.as_str()) {
                    out.push(ParseTree::leaf(literal.as_str()));
                    Ok(Some(at + literal.len()))
                } else {
                    state.fail(at, format!("'{}'", literal));
                    Ok(None)
                }
            }
            Expr::Pattern(pattern) => {
                let at = self.skip_whitespace(text, pos, lexical);
                match pattern.match_len(&text[at..]) {
                    Some(len) => {
                        out.push(ParseTree::leaf(&text[at..at + len]));
                        Ok(Some(at + len))
                    }
                    None => {
                        state.fail(at, format!("/{}/", pattern.source()));
                        Ok(None)
                    }
                }
            }
            Expr::EndOfInput => {
                let at = self.skip_whitespace(text, pos, lexical);
                if at == text.len() {
                    Ok(Some(at))
                } else {
                    state.fail(at, "end of input".to_string());
                    Ok(None)
                }
            }
            Expr::Rule(name) => self.invoke(name, pos, lexical, state, out),
            Expr::Sequence(items) => {
                let mark = out.len();
                let mut at = pos;
                for item in items {
                    match self.eval(item, at, lexical, state, out)? {
                        Some(next) => at = next,
                        None => {
                            out.truncate(mark);
                            return Ok(None);
                        }
                    }
                }
                Ok(Some(at))
            }
            Expr::Choice(alternatives) => {
                for alternative in alternatives {
                    if let Some(next) = self.eval(alternative, pos, lexical, state, out)? {
                        return Ok(Some(next));
                    }
                }
                Ok(None)
            }
            Expr::Optional(inner) => {
                Ok(self.eval(inner, pos, lexical, state, out)?.or(Some(pos)))
            }
            Expr::Repeat { expr, at_least_one } => {
                let mut at = pos;
                let mut matched = 0usize;
                while let Some(next) = self.eval(expr, at, lexical, state, out)? {
                    matched += 1;
                    if next == at {
                        break;
                    }
                    at = next;
                }
                if *at_least_one && matched == 0 {
                    Ok(None)
                } else {
                    Ok(Some(at))
                }
            }
        }
    }
}
