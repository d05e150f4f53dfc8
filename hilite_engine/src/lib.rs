// Internal modules
pub mod batch;
pub mod config;
pub mod file_processor;
pub mod grammar;
#[macro_use]
pub mod logging;
pub mod tokenizer;
pub mod utils;

// Re-export key types for library consumers
pub use batch::{BatchConfig, BatchError, BatchResults, FileTokenizeError};
pub use grammar::{Grammar, GrammarError, GrammarRegistry};
pub use tokenizer::{
    tokenize_line, LineTokens, StateStack, Token, TokenKind, TokenizeError, TokenizedDocument,
    TokenizerSession,
};

/// Check every module's code registrations. Called once at startup.
pub fn init_subsystems() -> Result<(), String> {
    file_processor::init_file_processor_logging()?;
    grammar::init_grammar_logging()?;
    tokenizer::init_tokenizer_logging()?;
    Ok(())
}
