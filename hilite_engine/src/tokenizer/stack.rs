//! State stack threaded from one line to the next

use super::TokenizeError;
use crate::config::compile_time::tokenizer::MAX_STATE_STACK_DEPTH;
use crate::grammar::{Grammar, StateId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Ordered state names, bottom first. An empty stack means the grammar's
/// initial state.
///
/// Stacks hold names rather than grammar indices so they can be stored,
/// compared and handed back to the engine independently of any grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateStack {
    frames: Vec<Arc<str>>,
}

impl StateStack {
    /// The initial stack
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            frames: names.into_iter().map(|name| Arc::from(name.as_ref())).collect(),
        }
    }

    pub(crate) fn from_ids(grammar: &Grammar, ids: &[StateId]) -> Self {
        Self {
            frames: ids
                .iter()
                .map(|id| Arc::clone(grammar.state(*id).name()))
                .collect(),
        }
    }

    pub fn is_initial(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&str> {
        self.frames.last().map(|name| name.as_ref())
    }

    /// Names from bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|name| name.as_ref())
    }

    /// Name of the state the next line starts in
    pub fn current_state<'g>(&'g self, grammar: &'g Grammar) -> &'g str {
        self.top()
            .unwrap_or_else(|| grammar.initial_state_name().as_ref())
    }

    /// Map every frame to its grammar state. Fails on the first name the
    /// grammar does not define, or when the stack is deeper than the engine
    /// would ever build.
    pub fn resolve(&self, grammar: &Grammar) -> Result<Vec<StateId>, TokenizeError> {
        if self.frames.len() > MAX_STATE_STACK_DEPTH {
            return Err(TokenizeError::StackDepthExceeded {
                state: self.top().unwrap_or_default().to_string(),
                limit: MAX_STATE_STACK_DEPTH,
            });
        }

        self.frames
            .iter()
            .map(|name| {
                grammar
                    .state_id(name)
                    .ok_or_else(|| TokenizeError::UnknownState {
                        grammar: grammar.name().to_string(),
                        state: name.to_string(),
                    })
            })
            .collect()
    }
}

impl fmt::Display for StateStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return f.write_str("<initial>");
        }
        for (i, name) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn grammar() -> Grammar {
        Grammar::from_toml_str(
            r#"
            [[states.root]]
            pattern = 'a'
            token = "a"
            next = { push = "inner" }

            [[states.inner]]
            pattern = 'b'
            token = "b"
            next = "pop"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_initial_stack() {
        let grammar = grammar();
        let stack = StateStack::new();

        assert!(stack.is_initial());
        assert_eq!(stack.top(), None);
        assert_eq!(stack.current_state(&grammar), "root");
        assert_eq!(stack.to_string(), "<initial>");
        assert_eq!(stack.resolve(&grammar).unwrap(), Vec::<StateId>::new());
    }

    #[test]
    fn test_resolve_and_round_trip_ids() {
        let grammar = grammar();
        let stack = StateStack::from_names(["root", "inner"]);
        let ids = stack.resolve(&grammar).unwrap();

        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current_state(&grammar), "inner");
        assert_eq!(stack.to_string(), "root > inner");
        assert_eq!(StateStack::from_ids(&grammar, &ids), stack);
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let grammar = grammar();
        let stack = StateStack::from_names(["inner", "ghost"]);

        assert_matches!(
            stack.resolve(&grammar),
            Err(TokenizeError::UnknownState { state, .. }) if state == "ghost"
        );
    }

    #[test]
    fn test_stack_deeper_than_limit_is_rejected() {
        let grammar = grammar();
        let at_limit = StateStack::from_names(vec!["inner"; MAX_STATE_STACK_DEPTH]);
        let over_limit = StateStack::from_names(vec!["inner"; MAX_STATE_STACK_DEPTH + 1]);

        assert_eq!(at_limit.resolve(&grammar).unwrap().len(), MAX_STATE_STACK_DEPTH);
        assert_matches!(
            over_limit.resolve(&grammar),
            Err(TokenizeError::StackDepthExceeded { limit, .. }) if limit == MAX_STATE_STACK_DEPTH
        );
    }

    #[test]
    fn test_serializes_as_name_list() {
        let stack = StateStack::from_names(["root", "inner"]);
        assert_eq!(serde_json::to_string(&stack).unwrap(), r#"["root","inner"]"#);

        let parsed: StateStack = serde_json::from_str(r#"["inner"]"#).unwrap();
        assert_eq!(parsed.top(), Some("inner"));
    }
}
