//! The line tokenizer
//!
//! Each call scans one line left to right. At every position the rules of
//! the current state are tried in declaration order and the first match
//! wins. Input no rule consumes becomes a one-character span labelled with
//! the grammar's default token, so every line is covered without gaps and
//! the scan always advances.

use super::stack::StateStack;
use super::token::Token;
use super::TokenizeError;
use crate::config::compile_time::tokenizer::*;
use crate::grammar::{Grammar, StateId, Transition};
use crate::logging::codes;
use crate::utils::{Position, Span};
use crate::{log_debug, log_warning};

/// Tokens of one line and the stack the next line starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    pub tokens: Vec<Token>,
    pub end_state: StateStack,
}

/// Counters gathered while scanning a line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ScanStats {
    pub unmatched: usize,
    pub max_depth: usize,
}

/// Tokenize `line` starting from `stack`. Spans are numbered as line 1.
pub fn tokenize_line(
    grammar: &Grammar,
    stack: &StateStack,
    line: &str,
) -> Result<LineTokens, TokenizeError> {
    tokenize_line_at(grammar, stack, line, 1)
}

/// Tokenize `line` as document line `line_number` (1-based)
///
/// Every stack entry is checked against the grammar before scanning; an
/// unknown name fails the call without producing tokens. So does a push
/// that would take the stack past `MAX_STATE_STACK_DEPTH`.
pub fn tokenize_line_at(
    grammar: &Grammar,
    stack: &StateStack,
    line: &str,
    line_number: u32,
) -> Result<LineTokens, TokenizeError> {
    let mut frames = stack.resolve(grammar)?;
    let (tokens, _) = scan_line(grammar, &mut frames, line, line_number)?;

    Ok(LineTokens {
        tokens,
        end_state: StateStack::from_ids(grammar, &frames),
    })
}

/// Scan one line with an already resolved stack, updating it in place.
/// On error `frames` is left part way through the line and must be
/// discarded.
pub(crate) fn scan_line(
    grammar: &Grammar,
    frames: &mut Vec<StateId>,
    line: &str,
    line_number: u32,
) -> Result<(Vec<Token>, ScanStats), TokenizeError> {
    let mut stats = ScanStats {
        unmatched: 0,
        max_depth: frames.len(),
    };
    let mut position = Position::line_start(line_number);

    if line.len() > MAX_TOKENIZATION_LINE_LENGTH {
        log_warning!(code = codes::tokenizer::LINE_TOO_LONG,
            "Line exceeds tokenization limit; emitting one span",
            "line" => line_number,
            "length" => line.len(),
            "limit" => MAX_TOKENIZATION_LINE_LENGTH
        );
        let token = Token::new(Span::covering(position, line), grammar.default_token().clone());
        return Ok((vec![token], stats));
    }

    let log_unmatched = super::preferences().log_unmatched_input;
    let mut tokens = Vec::new();

    while position.offset < line.len() {
        let rest = &line[position.offset..];
        let state_id = frames.last().copied().unwrap_or(grammar.initial_state());
        let state = grammar.state(state_id);

        let matched = state.rules().iter().find_map(|rule| {
            rule.match_len(rest, position.offset == 0)
                .map(|len| (rule, len))
        });

        match matched {
            Some((rule, len)) if len > 0 => {
                let text = &rest[..len];
                let (kind, bracket) = grammar.classify(rule.action(), text);
                let span = Span::covering(position, text);
                tokens.push(Token::new(span, kind).with_bracket(bracket));
                position = span.end();

                apply_transition(grammar, frames, rule.transition())?;
                stats.max_depth = stats.max_depth.max(frames.len());
            }
            // No rule, or only an empty match: consume one character
            _ => {
                let Some(ch) = rest.chars().next() else {
                    break;
                };
                let end = position.advance(ch);
                tokens.push(Token::new(
                    Span::new(position, end),
                    grammar.default_token().clone(),
                ));
                stats.unmatched += 1;

                if log_unmatched {
                    log_debug!("Unmatched input",
                        "line" => line_number,
                        "column" => position.column,
                        "state" => state.name(),
                        "char" => ch.escape_debug()
                    );
                }
                position = end;
            }
        }
    }

    Ok((tokens, stats))
}

fn apply_transition(
    grammar: &Grammar,
    frames: &mut Vec<StateId>,
    transition: &Transition,
) -> Result<(), TokenizeError> {
    match transition {
        Transition::Stay => {}
        Transition::Push { target, name } => {
            if frames.len() >= MAX_STATE_STACK_DEPTH {
                log_debug!("State stack full; rejecting push",
                    "grammar" => grammar.name(),
                    "pushed" => name,
                    "limit" => MAX_STATE_STACK_DEPTH
                );
                return Err(TokenizeError::StackDepthExceeded {
                    state: name.to_string(),
                    limit: MAX_STATE_STACK_DEPTH,
                });
            }
            frames.push(*target);
        }
        Transition::Pop => {
            frames.pop();
        }
        Transition::PopAll => frames.clear(),
    }
    Ok(())
}
