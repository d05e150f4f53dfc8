//! Load-time validation and compilation of grammar documents
//!
//! Checks run in a fixed order and the first failure is returned, so a
//! given document always reports the same error. A document either compiles
//! completely or not at all.

use super::compiled::{BracketPair, Grammar, Rule, State, StateId, TokenAction, Transition};
use super::definition::{
    GrammarDocument, RuleDefinition, TransitionDefinition, DEFAULT_UNMATCHED_TOKEN,
};
use super::GrammarError;
use crate::config::compile_time::grammar::*;
use crate::logging::codes;
use crate::tokenizer::TokenKind;
use crate::{log_debug, log_success, log_warning};
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

/// Compile `document`, naming the grammar `fallback_name` if it has no name
pub fn compile(document: &GrammarDocument, fallback_name: &str) -> Result<Grammar, GrammarError> {
    let start_time = Instant::now();
    let name = document
        .name
        .clone()
        .unwrap_or_else(|| fallback_name.to_string());

    if document.states.len() > MAX_STATES_PER_GRAMMAR {
        return Err(GrammarError::TooManyStates {
            count: document.states.len(),
            limit: MAX_STATES_PER_GRAMMAR,
        });
    }

    if !document.states.contains_key(&document.initial) {
        return Err(GrammarError::MissingInitialState {
            initial: document.initial.clone(),
        });
    }

    let default_label = document
        .default_token
        .as_deref()
        .unwrap_or(DEFAULT_UNMATCHED_TOKEN);
    if default_label.trim().is_empty() {
        return Err(GrammarError::EmptyDefaultToken);
    }

    // Ids follow the document's sorted state order
    let index: HashMap<Arc<str>, StateId> = document
        .states
        .keys()
        .enumerate()
        .map(|(id, name)| (Arc::from(name.as_str()), id))
        .collect();

    let mut labels = LabelInterner::default();
    let default_token = labels.intern(default_label);

    let mut states = Vec::with_capacity(document.states.len());
    for (state_name, rules) in &document.states {
        states.push(compile_state(
            state_name,
            rules,
            document,
            &index,
            &mut labels,
        )?);
    }

    let brackets = compile_brackets(document, &mut labels)?;

    let initial = index
        .get(document.initial.as_str())
        .copied()
        .ok_or_else(|| GrammarError::MissingInitialState {
            initial: document.initial.clone(),
        })?;

    let reachable = reachable_states(&states, initial);
    for (id, state) in states.iter().enumerate() {
        if reachable[id] && state.rules.is_empty() {
            return Err(GrammarError::EmptyState {
                state: state.name.to_string(),
            });
        }
    }

    let unreachable: Vec<Arc<str>> = states
        .iter()
        .enumerate()
        .filter(|(id, _)| !reachable[*id])
        .map(|(_, state)| state.name.clone())
        .collect();

    let preferences = super::preferences();
    if preferences.warn_unreachable_states {
        for state in &unreachable {
            log_warning!(code = codes::grammar::UNREACHABLE_STATE,
                "State is never pushed from the initial state",
                "grammar" => &name,
                "state" => state
            );
        }
    }

    let grammar = Grammar {
        name,
        initial,
        states,
        index,
        default_token,
        ignore_case: document.ignore_case,
        brackets,
        unreachable,
    };

    if preferences.log_compile_statistics {
        log_success!(codes::success::GRAMMAR_LOADED, "Grammar compiled",
            "grammar" => grammar.name(),
            "states" => grammar.state_count(),
            "rules" => grammar.rule_count(),
            "token_kinds" => labels.len(),
            "duration_ms" => format!("{:.2}", start_time.elapsed().as_secs_f64() * 1000.0)
        );
    } else {
        log_debug!("Grammar compiled",
            "grammar" => grammar.name(),
            "states" => grammar.state_count(),
            "rules" => grammar.rule_count()
        );
    }

    Ok(grammar)
}

fn compile_state(
    state_name: &str,
    rules: &[RuleDefinition],
    document: &GrammarDocument,
    index: &HashMap<Arc<str>, StateId>,
    labels: &mut LabelInterner,
) -> Result<State, GrammarError> {
    if rules.len() > MAX_RULES_PER_STATE {
        return Err(GrammarError::TooManyRules {
            state: state_name.to_string(),
            count: rules.len(),
            limit: MAX_RULES_PER_STATE,
        });
    }

    let mut compiled = Vec::with_capacity(rules.len());
    for (rule_index, rule) in rules.iter().enumerate() {
        compiled.push(compile_rule(
            state_name, rule_index, rule, document, index, labels,
        )?);
    }

    let name = index
        .get_key_value(state_name)
        .map(|(key, _)| key.clone())
        .unwrap_or_else(|| Arc::from(state_name));

    Ok(State {
        name,
        rules: compiled,
    })
}

fn compile_rule(
    state_name: &str,
    rule_index: usize,
    rule: &RuleDefinition,
    document: &GrammarDocument,
    index: &HashMap<Arc<str>, StateId>,
    labels: &mut LabelInterner,
) -> Result<Rule, GrammarError> {
    if rule.pattern.len() > MAX_PATTERN_LENGTH {
        return Err(GrammarError::PatternTooLong {
            state: state_name.to_string(),
            rule: rule_index,
            length: rule.pattern.len(),
            limit: MAX_PATTERN_LENGTH,
        });
    }

    let action = match (&rule.token, rule.brackets) {
        (Some(label), false) => {
            if label.trim().is_empty() {
                return Err(GrammarError::EmptyTokenLabel {
                    state: state_name.to_string(),
                    rule: rule_index,
                });
            }
            TokenAction::Token(labels.intern(label))
        }
        (None, true) => {
            if document.brackets.is_empty() {
                return Err(GrammarError::MissingBrackets {
                    state: state_name.to_string(),
                    rule: rule_index,
                });
            }
            TokenAction::Brackets
        }
        _ => {
            return Err(GrammarError::InvalidTokenAction {
                state: state_name.to_string(),
                rule: rule_index,
            })
        }
    };

    let transition = match &rule.next {
        TransitionDefinition::Stay => Transition::Stay,
        TransitionDefinition::Pop => Transition::Pop,
        TransitionDefinition::PopAll => Transition::PopAll,
        TransitionDefinition::Push(target) => match index.get_key_value(target.as_str()) {
            Some((name, id)) => Transition::Push {
                target: *id,
                name: name.clone(),
            },
            None => {
                return Err(GrammarError::UnknownTransitionTarget {
                    state: state_name.to_string(),
                    rule: rule_index,
                    target: target.clone(),
                })
            }
        },
    };

    let ignore_case = rule.ignore_case.unwrap_or(document.ignore_case);
    let (regex, line_start_only) =
        compile_pattern(&rule.pattern, ignore_case).map_err(|source| {
            GrammarError::InvalidPattern {
                state: state_name.to_string(),
                rule: rule_index,
                pattern: rule.pattern.clone(),
                source,
            }
        })?;

    Ok(Rule {
        pattern: rule.pattern.clone(),
        regex,
        line_start_only,
        action,
        transition,
    })
}

/// A leading `^` restricts the rule to line start; every pattern is
/// anchored to the scan position.
fn compile_pattern(pattern: &str, ignore_case: bool) -> Result<(Regex, bool), regex::Error> {
    let (body, line_start_only) = match pattern.strip_prefix('^') {
        Some(rest) => (rest, true),
        None => (pattern, false),
    };

    let regex = RegexBuilder::new(&format!(r"\A(?:{})", body))
        .case_insensitive(ignore_case)
        .build()?;

    Ok((regex, line_start_only))
}

fn compile_brackets(
    document: &GrammarDocument,
    labels: &mut LabelInterner,
) -> Result<Vec<BracketPair>, GrammarError> {
    let mut pairs = Vec::with_capacity(document.brackets.len());

    for (index, bracket) in document.brackets.iter().enumerate() {
        let reason = if bracket.open.is_empty() {
            Some("open delimiter is empty")
        } else if bracket.close.is_empty() {
            Some("close delimiter is empty")
        } else if bracket.open == bracket.close {
            Some("open and close delimiters are identical")
        } else if bracket.token.trim().is_empty() {
            Some("token label is empty")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(GrammarError::InvalidBracket { index, reason });
        }

        pairs.push(BracketPair {
            open: bracket.open.clone(),
            close: bracket.close.clone(),
            token: labels.intern(&bracket.token),
        });
    }

    Ok(pairs)
}

/// States reachable from `initial` by pushes. Pops only return to states
/// already on the stack, so they add nothing.
fn reachable_states(states: &[State], initial: StateId) -> Vec<bool> {
    let mut reachable = vec![false; states.len()];
    let mut queue = VecDeque::from([initial]);
    reachable[initial] = true;

    while let Some(id) = queue.pop_front() {
        for rule in &states[id].rules {
            if let Transition::Push { target, .. } = rule.transition {
                if !reachable[target] {
                    reachable[target] = true;
                    queue.push_back(target);
                }
            }
        }
    }

    reachable
}

/// One shared `TokenKind` per distinct label
#[derive(Default)]
struct LabelInterner {
    labels: HashMap<String, TokenKind>,
}

impl LabelInterner {
    fn intern(&mut self, label: &str) -> TokenKind {
        if let Some(kind) = self.labels.get(label) {
            return kind.clone();
        }
        let kind = TokenKind::new(label);
        self.labels.insert(label.to_string(), kind.clone());
        kind
    }

    fn len(&self) -> usize {
        self.labels.len()
    }
}
