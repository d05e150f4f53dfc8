//! Immutable, validated grammar used by the tokenizer

use crate::tokenizer::{BracketKind, TokenKind};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Index of a state inside its grammar
pub type StateId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Push { target: StateId, name: Arc<str> },
    Pop,
    PopAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenAction {
    Token(TokenKind),
    /// Kind comes from the grammar's bracket table
    Brackets,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) pattern: String,
    pub(crate) regex: Regex,
    pub(crate) line_start_only: bool,
    pub(crate) action: TokenAction,
    pub(crate) transition: Transition,
}

impl Rule {
    /// Length in bytes of the match starting at the beginning of `rest`.
    /// `at_line_start` is true when `rest` is the whole line.
    pub fn match_len(&self, rest: &str, at_line_start: bool) -> Option<usize> {
        if self.line_start_only && !at_line_start {
            return None;
        }
        self.regex.find(rest).map(|m| m.end())
    }

    /// Pattern as written in the grammar document
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn line_start_only(&self) -> bool {
        self.line_start_only
    }

    pub fn action(&self) -> &TokenAction {
        &self.action
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }
}

#[derive(Debug, Clone)]
pub struct State {
    pub(crate) name: Arc<str>,
    pub(crate) rules: Vec<Rule>,
}

impl State {
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPair {
    pub open: String,
    pub close: String,
    pub token: TokenKind,
}

/// A compiled grammar. Built once, then shared read-only between threads.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) name: String,
    pub(crate) initial: StateId,
    pub(crate) states: Vec<State>,
    pub(crate) index: HashMap<Arc<str>, StateId>,
    pub(crate) default_token: TokenKind,
    pub(crate) ignore_case: bool,
    pub(crate) brackets: Vec<BracketPair>,
    pub(crate) unreachable: Vec<Arc<str>>,
}

impl Grammar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn initial_state_name(&self) -> &Arc<str> {
        &self.states[self.initial].name
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn rule_count(&self) -> usize {
        self.states.iter().map(|s| s.rules.len()).sum()
    }

    /// Label given to input no rule matches
    pub fn default_token(&self) -> &TokenKind {
        &self.default_token
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn brackets(&self) -> &[BracketPair] {
        &self.brackets
    }

    /// States the initial state can never push
    pub fn unreachable_states(&self) -> &[Arc<str>] {
        &self.unreachable
    }

    /// Resolve the token kind for matched `text` under `action`
    pub fn classify(&self, action: &TokenAction, text: &str) -> (TokenKind, Option<BracketKind>) {
        match action {
            TokenAction::Token(kind) => (kind.clone(), None),
            TokenAction::Brackets => self
                .brackets
                .iter()
                .find_map(|pair| {
                    if pair.open == text {
                        Some((pair.token.clone(), Some(BracketKind::Open)))
                    } else if pair.close == text {
                        Some((pair.token.clone(), Some(BracketKind::Close)))
                    } else {
                        None
                    }
                })
                .unwrap_or_else(|| (self.default_token.clone(), None)),
        }
    }

    pub fn summary(&self) -> GrammarSummary {
        let mut token_kinds: BTreeSet<String> = BTreeSet::new();
        for rule in self.states.iter().flat_map(|s| s.rules.iter()) {
            if let TokenAction::Token(kind) = &rule.action {
                token_kinds.insert(kind.to_string());
            }
        }
        for pair in &self.brackets {
            token_kinds.insert(pair.token.to_string());
        }

        GrammarSummary {
            name: self.name.clone(),
            initial: self.initial_state_name().to_string(),
            default_token: self.default_token.to_string(),
            ignore_case: self.ignore_case,
            states: self
                .states
                .iter()
                .map(|s| StateSummary {
                    name: s.name.to_string(),
                    rules: s.rules.len(),
                })
                .collect(),
            rule_count: self.rule_count(),
            bracket_pairs: self.brackets.len(),
            token_kinds: token_kinds.into_iter().collect(),
            unreachable_states: self.unreachable.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    pub name: String,
    pub rules: usize,
}

/// Shape of a grammar for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarSummary {
    pub name: String,
    pub initial: String,
    pub default_token: String,
    pub ignore_case: bool,
    pub states: Vec<StateSummary>,
    pub rule_count: usize,
    pub bracket_pairs: usize,
    pub token_kinds: Vec<String>,
    pub unreachable_states: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_grammar_is_shareable_across_threads() {
        assert_send_sync::<Grammar>();
        assert_send_sync::<Arc<Grammar>>();
    }

    fn bracket_grammar() -> Grammar {
        Grammar::from_toml_str(
            r#"
            name = "parens"
            default_token = "plain"

            [[brackets]]
            open = "("
            close = ")"
            token = "delimiter"

            [[states.root]]
            pattern = '[()\[\]]'
            brackets = true

            [[states.root]]
            pattern = '\w+'
            token = "word"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_classify_brackets() {
        let grammar = bracket_grammar();
        let action = TokenAction::Brackets;

        assert_eq!(
            grammar.classify(&action, "("),
            (TokenKind::new("delimiter"), Some(BracketKind::Open))
        );
        assert_eq!(
            grammar.classify(&action, ")"),
            (TokenKind::new("delimiter"), Some(BracketKind::Close))
        );
        assert_eq!(grammar.classify(&action, "["), (TokenKind::new("plain"), None));
    }

    #[test]
    fn test_summary() {
        let summary = bracket_grammar().summary();

        assert_eq!(summary.name, "parens");
        assert_eq!(summary.initial, "root");
        assert_eq!(summary.rule_count, 2);
        assert_eq!(summary.bracket_pairs, 1);
        assert_eq!(summary.token_kinds, vec!["delimiter", "word"]);
        assert!(summary.unreachable_states.is_empty());
    }

    #[test]
    fn test_line_start_rules_only_match_at_column_one() {
        let grammar = Grammar::from_toml_str(
            r#"
            [[states.root]]
            pattern = '^\*.*$'
            token = "comment"
            "#,
        )
        .unwrap();
        let rule = &grammar.state(grammar.initial_state()).rules()[0];

        assert!(rule.line_start_only());
        assert_eq!(rule.pattern(), r"^\*.*$");
        assert_eq!(rule.match_len("* note", true), Some(6));
        assert_eq!(rule.match_len("* note", false), None);
        assert_eq!(rule.match_len("x * note", true), None);
    }
}
