use super::engine::tokenize_line_at;
use super::stack::StateStack;
use super::token::Token;
use super::TokenizeError;
use crate::grammar::Grammar;
use std::sync::Arc;

/// Streams the lines of one document through a grammar, carrying the
/// state stack between calls.
#[derive(Debug, Clone)]
pub struct TokenizerSession {
    grammar: Arc<Grammar>,
    stack: StateStack,
    next_line: u32,
}

impl TokenizerSession {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            grammar,
            stack: StateStack::new(),
            next_line: 1,
        }
    }

    /// Resume from a stored stack
    pub fn with_state(grammar: Arc<Grammar>, stack: StateStack) -> Result<Self, TokenizeError> {
        stack.resolve(&grammar)?;
        Ok(Self {
            grammar,
            stack,
            next_line: 1,
        })
    }

    /// Tokenize the next line. On error the session is left unchanged.
    pub fn tokenize_line(&mut self, line: &str) -> Result<Vec<Token>, TokenizeError> {
        let result = tokenize_line_at(&self.grammar, &self.stack, line, self.next_line)?;
        self.stack = result.end_state;
        self.next_line += 1;
        Ok(result.tokens)
    }

    /// Back to the initial stack and line 1
    pub fn reset(&mut self) {
        self.stack = StateStack::new();
        self.next_line = 1;
    }

    pub fn state(&self) -> &StateStack {
        &self.stack
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Number the next line will get
    pub fn line_number(&self) -> u32 {
        self.next_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::builtin;
    use assert_matches::assert_matches;

    #[test]
    fn test_session_threads_state_and_numbers_lines() {
        let mut session = TokenizerSession::new(builtin::jcl().unwrap());

        let first = session.tokenize_line("//IN DD DSN=A.B,").unwrap();
        assert_eq!(first[0].span.start.line, 1);
        assert_eq!(session.state().top(), Some("operands2"));

        let second = session.tokenize_line("//  DISP=SHR").unwrap();
        assert_eq!(second[0].span.start.line, 2);
        assert_eq!(second[0].kind, "jcl-variable");
        assert_eq!(session.line_number(), 3);

        session.reset();
        assert!(session.state().is_initial());
        assert_eq!(session.line_number(), 1);
    }

    #[test]
    fn test_with_state_validates_stack() {
        let grammar = builtin::hlasm().unwrap();

        let session =
            TokenizerSession::with_state(Arc::clone(&grammar), StateStack::from_names(["cont"]))
                .unwrap();
        assert_eq!(session.state().top(), Some("cont"));

        assert_matches!(
            TokenizerSession::with_state(grammar, StateStack::from_names(["ghost"])),
            Err(TokenizeError::UnknownState { .. })
        );
    }

    #[test]
    fn test_session_matches_engine_calls() {
        let grammar = builtin::hlasm().unwrap();
        let lines = ["         DC    A,        X", "               B", "* done"];

        let mut session = TokenizerSession::new(Arc::clone(&grammar));
        let mut stack = StateStack::new();
        for (i, line) in lines.iter().enumerate() {
            let expected = tokenize_line_at(&grammar, &stack, line, i as u32 + 1).unwrap();
            stack = expected.end_state;
            assert_eq!(session.tokenize_line(line).unwrap(), expected.tokens);
            assert_eq!(session.state(), &stack);
        }
    }

    #[test]
    fn test_failed_line_leaves_session_unchanged() {
        let grammar = Grammar::from_toml_str(
            r#"
            [[states.root]]
            pattern = '\('
            token = "open"
            next = { push = "root" }
            "#,
        )
        .unwrap();
        let mut session = TokenizerSession::new(Arc::new(grammar));
        let limit = crate::config::compile_time::tokenizer::MAX_STATE_STACK_DEPTH;

        session.tokenize_line(&"(".repeat(limit - 1)).unwrap();
        let before = session.state().clone();

        assert_matches!(
            session.tokenize_line("(("),
            Err(TokenizeError::StackDepthExceeded { .. })
        );
        assert_eq!(session.state(), &before);
        assert_eq!(session.line_number(), 2);
    }
}
