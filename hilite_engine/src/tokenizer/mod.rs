//! Line tokenization with file processing integration
//!
//! [`tokenize_line`] is the pure core: grammar, stack and line in, tokens and
//! next stack out. [`TokenizerSession`] and [`TokenizedDocument`] keep the
//! stack between lines for callers that stream or edit a document.

pub mod document;
pub mod engine;
pub mod error;
pub mod session;
pub mod stack;
pub mod token;

use crate::config::runtime::TokenizerPreferences;
use crate::file_processor::FileProcessingResult;
use crate::grammar::Grammar;
use crate::log_debug;
use std::sync::{Arc, OnceLock};

pub use document::{DocumentLine, TokenizationMetrics, TokenizedDocument};
pub use engine::{tokenize_line, tokenize_line_at, LineTokens};
pub use error::TokenizeError;
pub use session::TokenizerSession;
pub use stack::StateStack;
pub use token::{BracketKind, Token, TokenKind};

static PREFERENCES: OnceLock<TokenizerPreferences> = OnceLock::new();

/// Set tokenizer preferences before first use. Returns false if
/// preferences were already fixed.
pub fn init_preferences(preferences: TokenizerPreferences) -> bool {
    PREFERENCES.set(preferences).is_ok()
}

pub fn preferences() -> &'static TokenizerPreferences {
    PREFERENCES.get_or_init(TokenizerPreferences::default)
}

/// Tokenize a file read by the file processor
pub fn tokenize_file_result(
    grammar: Arc<Grammar>,
    file_result: &FileProcessingResult,
) -> Result<TokenizedDocument, TokenizeError> {
    log_debug!("Starting tokenization",
        "file" => file_result.metadata.path.display(),
        "grammar" => grammar.name(),
        "line_count" => file_result.metadata.line_count,
        "file_size_bytes" => file_result.metadata.size
    );

    TokenizedDocument::new(grammar, &file_result.source)
}

/// Check that every tokenizer code is registered
pub fn init_tokenizer_logging() -> Result<(), String> {
    use crate::logging::codes;

    let tokenizer_codes = [
        codes::tokenizer::UNKNOWN_STATE,
        codes::tokenizer::LINE_OUT_OF_RANGE,
        codes::tokenizer::EMBEDDED_LINE_BREAK,
        codes::tokenizer::UNMATCHED_INPUT,
        codes::tokenizer::LINE_TOO_LONG,
        codes::tokenizer::STACK_DEPTH_EXCEEDED,
    ];

    for code in &tokenizer_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Tokenizer code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_processor::process_file;
    use crate::grammar::builtin;
    use std::io::Write;

    #[test]
    fn test_tokenizer_codes_registered() {
        assert!(init_tokenizer_logging().is_ok());
    }

    #[test]
    fn test_tokenize_processed_file() {
        let mut file = tempfile::Builder::new().suffix(".jcl").tempfile().unwrap();
        write!(file, "//* first\n//STEP1 EXEC PGM=IEFBR14\n").unwrap();

        let result = process_file(file.path()).unwrap();
        let document = tokenize_file_result(builtin::jcl().unwrap(), &result).unwrap();

        // Trailing newline leaves an empty last line
        assert_eq!(document.line_count(), 3);
        assert!(document.line(2).unwrap().tokens().is_empty());
        assert_eq!(document.line(0).unwrap().tokens()[0].kind, "jcl-comment-//*-all");
    }
}
