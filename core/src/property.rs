// SPDX-License-Identifier: MIT OR Apache-2.0

//! A single SGF key/value property

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Marker for SGF's list/compose value syntax, shared by every property
/// that doesn't override it.
pub const DEFAULT_PATTERN: &str = "()[]";

/// One SGF key/value pair as found in a game record, e.g. `B[pd]`.
///
/// Properties are built once and never mutated; any string is accepted for
/// every field, including the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    key: String,
    value: String,
    pattern: Cow<'static, str>,
}

impl Property {
    /// Create a property carrying the default `()[]` pattern
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            pattern: Cow::Borrowed(DEFAULT_PATTERN),
        }
    }

    /// Create a property with an explicit pattern
    pub fn with_pattern(
        key: impl Into<String>,
        value: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            pattern: Cow::Owned(pattern.into()),
        }
    }

    /// Property identifier (e.g. `B`, `SZ`)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw payload, unescaped
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether this property still carries [`DEFAULT_PATTERN`]
    pub fn is_default_pattern(&self) -> bool {
        self.pattern == DEFAULT_PATTERN
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.key, escape_value(&self.value))
    }
}

/// Escape a value for inclusion between SGF brackets
pub fn escape_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', ']']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if c == '\\' || c == ']' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

/// Undo SGF value escaping: `\x` becomes `x` and an escaped line break
/// (soft line break) is dropped entirely.
pub fn unescape_value(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') => {
                if chars.peek() == Some(&'\r') {
                    chars.next();
                }
            }
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some(other) => value.push(other),
            None => {}
        }
    }

    value
}
