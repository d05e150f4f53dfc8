//! Token types produced by the line tokenizer

use crate::utils::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Token label such as `comment` or `jcl-delimiter`
///
/// Labels are interned per grammar so tokens clone without allocating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenKind(Arc<str>);

impl TokenKind {
    pub fn new(label: &str) -> Self {
        Self(Arc::from(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for TokenKind {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for TokenKind {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketKind {
    Open,
    Close,
}

/// One classified span of a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket: Option<BracketKind>,
}

impl Token {
    pub fn new(span: Span, kind: TokenKind) -> Self {
        Self {
            span,
            kind,
            bracket: None,
        }
    }

    pub fn with_bracket(mut self, bracket: Option<BracketKind>) -> Self {
        self.bracket = bracket;
        self
    }

    /// Byte range within the line
    pub fn range(&self) -> std::ops::Range<usize> {
        self.span.start.offset..self.span.end.offset
    }

    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        self.span.slice(line)
    }

    pub fn is_kind(&self, label: &str) -> bool {
        self.kind == label
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.span, self.kind)
    }
}
