//! Grammar configuration errors
//!
//! Every variant is raised while loading or compiling a grammar. A grammar
//! that loads successfully never fails during tokenization.

use crate::logging::codes;
use crate::logging::Code;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("Failed to parse {format} grammar: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("Initial state '{initial}' is not defined")]
    MissingInitialState { initial: String },

    #[error("Rule {rule} of state '{state}' pushes undefined state '{target}'")]
    UnknownTransitionTarget {
        state: String,
        rule: usize,
        target: String,
    },

    #[error("State '{state}' is reachable but has no rules")]
    EmptyState { state: String },

    #[error("Rule {rule} of state '{state}' has an invalid pattern /{pattern}/: {source}")]
    InvalidPattern {
        state: String,
        rule: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule {rule} of state '{state}' must set exactly one of `token` or `brackets`")]
    InvalidTokenAction { state: String, rule: usize },

    #[error("Rule {rule} of state '{state}' has an empty token label")]
    EmptyTokenLabel { state: String, rule: usize },

    #[error("Grammar default token label is empty")]
    EmptyDefaultToken,

    #[error("Rule {rule} of state '{state}' classifies brackets but the grammar defines none")]
    MissingBrackets { state: String, rule: usize },

    #[error("Bracket pair {index} is malformed: {reason}")]
    InvalidBracket { index: usize, reason: &'static str },

    #[error("Grammar defines {count} states (max: {limit})")]
    TooManyStates { count: usize, limit: usize },

    #[error("State '{state}' defines {count} rules (max: {limit})")]
    TooManyRules {
        state: String,
        count: usize,
        limit: usize,
    },

    #[error("Rule {rule} of state '{state}' has a {length}-byte pattern (max: {limit})")]
    PatternTooLong {
        state: String,
        rule: usize,
        length: usize,
        limit: usize,
    },

    #[error("Unsupported grammar file format: {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to read grammar file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown language '{name}'")]
    UnknownLanguage { name: String },
}

impl GrammarError {
    pub fn error_code(&self) -> Code {
        match self {
            GrammarError::Parse { .. } => codes::grammar::PARSE_ERROR,
            GrammarError::MissingInitialState { .. } => codes::grammar::MISSING_INITIAL_STATE,
            GrammarError::UnknownTransitionTarget { .. } => {
                codes::grammar::UNKNOWN_TRANSITION_TARGET
            }
            GrammarError::EmptyState { .. } => codes::grammar::EMPTY_STATE,
            GrammarError::InvalidPattern { .. } => codes::grammar::INVALID_PATTERN,
            GrammarError::InvalidTokenAction { .. } => codes::grammar::INVALID_TOKEN_ACTION,
            GrammarError::EmptyTokenLabel { .. } | GrammarError::EmptyDefaultToken => {
                codes::grammar::EMPTY_TOKEN_LABEL
            }
            GrammarError::MissingBrackets { .. } => codes::grammar::MISSING_BRACKETS,
            GrammarError::InvalidBracket { .. } => codes::grammar::INVALID_BRACKET,
            GrammarError::TooManyStates { .. }
            | GrammarError::TooManyRules { .. }
            | GrammarError::PatternTooLong { .. } => codes::grammar::LIMIT_EXCEEDED,
            GrammarError::UnsupportedFormat { .. } => codes::grammar::UNSUPPORTED_FORMAT,
            GrammarError::Io { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => codes::file_processing::FILE_NOT_FOUND,
                std::io::ErrorKind::PermissionDenied => codes::file_processing::PERMISSION_DENIED,
                std::io::ErrorKind::InvalidData => codes::file_processing::INVALID_ENCODING,
                _ => codes::file_processing::IO_ERROR,
            },
            GrammarError::UnknownLanguage { .. } => codes::grammar::UNKNOWN_LANGUAGE,
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_errors_share_code() {
        let states = GrammarError::TooManyStates {
            count: 9,
            limit: 8,
        };
        let pattern = GrammarError::PatternTooLong {
            state: "root".into(),
            rule: 0,
            length: 9000,
            limit: 4096,
        };
        assert_eq!(states.error_code(), codes::grammar::LIMIT_EXCEEDED);
        assert_eq!(pattern.error_code(), codes::grammar::LIMIT_EXCEEDED);
        assert!(states.requires_halt());
    }

    #[test]
    fn test_io_error_maps_by_kind() {
        let error = GrammarError::Io {
            path: PathBuf::from("missing.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(error.error_code(), codes::file_processing::FILE_NOT_FOUND);
        assert!(error.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_messages_name_the_offending_rule() {
        let error = GrammarError::UnknownTransitionTarget {
            state: "root".into(),
            rule: 2,
            target: "operandz".into(),
        };
        assert_eq!(
            error.to_string(),
            "Rule 2 of state 'root' pushes undefined state 'operandz'"
        );
    }
}
