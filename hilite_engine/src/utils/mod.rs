//! Shared location types used by the tokenizer and diagnostics

pub mod span;

pub use span::{Position, SourceMap, Span, Spanned};
