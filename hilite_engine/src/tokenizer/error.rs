use crate::logging::codes;
use crate::logging::Code;

/// Errors raised by tokenizer calls. Unmatched input is never an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("State stack names '{state}', which grammar '{grammar}' does not define")]
    UnknownState { grammar: String, state: String },

    #[error("Line {index} is out of range (document has {line_count} lines)")]
    LineOutOfRange { index: usize, line_count: usize },

    #[error("Text for line {index} contains a line break")]
    EmbeddedLineBreak { index: usize },

    #[error("Pushing '{state}' would exceed the state stack limit of {limit}")]
    StackDepthExceeded { state: String, limit: usize },
}

impl TokenizeError {
    pub fn error_code(&self) -> Code {
        match self {
            TokenizeError::UnknownState { .. } => codes::tokenizer::UNKNOWN_STATE,
            TokenizeError::LineOutOfRange { .. } => codes::tokenizer::LINE_OUT_OF_RANGE,
            TokenizeError::EmbeddedLineBreak { .. } => codes::tokenizer::EMBEDDED_LINE_BREAK,
            TokenizeError::StackDepthExceeded { .. } => codes::tokenizer::STACK_DEPTH_EXCEEDED,
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
    fn test_error_codes() {
        let error = TokenizeError::UnknownState {
            grammar: "jcl".into(),
            state: "ghost".into(),
        };
        assert_eq!(error.error_code().as_str(), "K001");
        assert!(error.to_string().contains("'ghost'"));

        let error = TokenizeError::LineOutOfRange {
            index: 7,
            line_count: 3,
        };
        assert_eq!(error.error_code(), codes::tokenizer::LINE_OUT_OF_RANGE);
        assert_eq!(
            TokenizeError::EmbeddedLineBreak { index: 0 }.error_code(),
            codes::tokenizer::EMBEDDED_LINE_BREAK
        );

        let error = TokenizeError::StackDepthExceeded {
            state: "operands".into(),
            limit: 100,
        };
        assert_eq!(error.error_code().as_str(), "K012");
        assert!(error.to_string().contains("limit of 100"));
    }
}
