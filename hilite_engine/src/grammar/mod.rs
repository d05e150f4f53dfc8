//! Grammar definitions, load-time validation and built-in languages
//!
//! A grammar document (TOML or JSON) is compiled once into an immutable
//! [`Grammar`]. Every configuration error surfaces here, so tokenizing with a
//! compiled grammar cannot fail because of the grammar itself.

pub mod builtin;
pub mod compiled;
pub mod compiler;
pub mod definition;
pub mod error;
pub mod loader;
pub mod registry;

use crate::config::runtime::GrammarPreferences;
use std::sync::OnceLock;

pub use builtin::{builtin, BUILTIN_LANGUAGES};
pub use compiled::{
    BracketPair, Grammar, GrammarSummary, Rule, State, StateId, StateSummary, TokenAction,
    Transition,
};
pub use definition::{
    BracketDefinition, GrammarDocument, RuleDefinition, TransitionDefinition,
    DEFAULT_INITIAL_STATE, DEFAULT_UNMATCHED_TOKEN,
};
pub use error::GrammarError;
pub use loader::load_grammar_file;
pub use registry::GrammarRegistry;

static PREFERENCES: OnceLock<GrammarPreferences> = OnceLock::new();

/// Set grammar preferences before the first grammar is compiled.
/// Returns false if preferences were already fixed.
pub fn init_preferences(preferences: GrammarPreferences) -> bool {
    PREFERENCES.set(preferences).is_ok()
}

pub fn preferences() -> &'static GrammarPreferences {
    PREFERENCES.get_or_init(GrammarPreferences::default)
}

/// Check that every grammar error code is registered
pub fn init_grammar_logging() -> Result<(), String> {
    use crate::logging::codes;

    let grammar_codes = [
        codes::grammar::PARSE_ERROR,
        codes::grammar::MISSING_INITIAL_STATE,
        codes::grammar::UNKNOWN_TRANSITION_TARGET,
        codes::grammar::EMPTY_STATE,
        codes::grammar::INVALID_PATTERN,
        codes::grammar::INVALID_TOKEN_ACTION,
        codes::grammar::EMPTY_TOKEN_LABEL,
        codes::grammar::MISSING_BRACKETS,
        codes::grammar::INVALID_BRACKET,
        codes::grammar::LIMIT_EXCEEDED,
        codes::grammar::UNSUPPORTED_FORMAT,
        codes::grammar::UNKNOWN_LANGUAGE,
        codes::grammar::UNREACHABLE_STATE,
    ];

    for code in &grammar_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Grammar code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    Ok(())
}
