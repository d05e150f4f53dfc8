//! Whole-document tokenization with incremental retokenization
//!
//! Each line stores the stack it ends in. After an edit, lines are
//! retokenized from the edit point until one ends in the same stack as
//! before; every later line then starts from an unchanged stack and keeps
//! its tokens.

use super::engine::{scan_line, ScanStats};
use super::stack::StateStack;
use super::token::Token;
use super::TokenizeError;
use crate::grammar::{Grammar, StateId};
use crate::logging::codes;
use crate::{log_debug, log_success};
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLine {
    text: String,
    tokens: Vec<Token>,
    end_state: StateStack,
    end_frames: Vec<StateId>,
}

impl DocumentLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Stack the following line starts from
    pub fn end_state(&self) -> &StateStack {
        &self.end_state
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenizationMetrics {
    pub lines: usize,
    pub tokens: usize,
    /// Characters no rule consumed
    pub unmatched: usize,
    pub max_stack_depth: usize,
    /// Lines rescanned by edits since the document was built
    pub retokenized_lines: usize,
    pub duration: Duration,
}

impl TokenizationMetrics {
    fn record(&mut self, stats: ScanStats, tokens: usize) {
        self.lines += 1;
        self.tokens += tokens;
        self.unmatched += stats.unmatched;
        self.max_stack_depth = self.max_stack_depth.max(stats.max_depth);
    }
}

#[derive(Debug, Clone)]
pub struct TokenizedDocument {
    grammar: Arc<Grammar>,
    lines: Vec<DocumentLine>,
    metrics: Option<TokenizationMetrics>,
}

impl TokenizedDocument {
    /// Split `text` on `\n` (dropping a trailing `\r` per line) and tokenize
    /// it from the initial stack
    pub fn new(grammar: Arc<Grammar>, text: &str) -> Result<Self, TokenizeError> {
        Self::from_lines(grammar, split_lines(text))
    }

    pub fn from_lines<I, S>(grammar: Arc<Grammar>, lines: I) -> Result<Self, TokenizeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start_time = Instant::now();
        let mut metrics = super::preferences()
            .collect_metrics
            .then(TokenizationMetrics::default);

        let mut frames = Vec::new();
        let mut document_lines = Vec::new();
        for (index, text) in lines.into_iter().enumerate() {
            let text = text.into();
            let (tokens, stats) = scan_line(&grammar, &mut frames, &text, line_number(index))?;
            if let Some(metrics) = metrics.as_mut() {
                metrics.record(stats, tokens.len());
            }
            document_lines.push(DocumentLine {
                end_state: StateStack::from_ids(&grammar, &frames),
                end_frames: frames.clone(),
                text,
                tokens,
            });
        }

        if let Some(metrics) = metrics.as_mut() {
            metrics.duration = start_time.elapsed();
            log_success!(codes::success::TOKENIZATION_COMPLETE, "Document tokenized",
                "grammar" => grammar.name(),
                "lines" => metrics.lines,
                "tokens" => metrics.tokens,
                "unmatched" => metrics.unmatched,
                "duration_ms" => format!("{:.2}", metrics.duration.as_secs_f64() * 1000.0)
            );
        }

        Ok(Self {
            grammar,
            lines: document_lines,
            metrics,
        })
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&DocumentLine> {
        self.lines.get(index)
    }

    /// Tokens of every line in order
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.lines.iter().flat_map(|line| line.tokens.iter())
    }

    /// Stack after the last line
    pub fn end_state(&self) -> StateStack {
        self.lines
            .last()
            .map(|line| line.end_state.clone())
            .unwrap_or_default()
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn metrics(&self) -> Option<&TokenizationMetrics> {
        self.metrics.as_ref()
    }

    /// Replace one line. Returns the range of lines that were retokenized.
    ///
    /// Edits are all or nothing: when retokenizing fails the document is
    /// left exactly as it was.
    pub fn update_line(&mut self, index: usize, text: &str) -> Result<Range<usize>, TokenizeError> {
        self.check_index(index, self.lines.len())?;
        let text = single_line(index, text)?;

        let previous = std::mem::replace(&mut self.lines[index].text, text);
        self.retokenize(index, index, false).map_err(|error| {
            self.lines[index].text = previous;
            error
        })
    }

    /// Insert a line before `index`; `index == line_count()` appends
    pub fn insert_line(&mut self, index: usize, text: &str) -> Result<Range<usize>, TokenizeError> {
        self.check_index(index, self.lines.len() + 1)?;
        let text = single_line(index, text)?;

        self.lines.insert(
            index,
            DocumentLine {
                text,
                tokens: Vec::new(),
                end_state: StateStack::new(),
                end_frames: Vec::new(),
            },
        );
        // The new line has no previous end state to compare against
        self.retokenize(index, index + 1, true).map_err(|error| {
            self.lines.remove(index);
            error
        })
    }

    pub fn remove_line(&mut self, index: usize) -> Result<Range<usize>, TokenizeError> {
        self.check_index(index, self.lines.len())?;

        let removed = self.lines.remove(index);
        self.retokenize(index, index, true).map_err(|error| {
            self.lines.insert(index, removed);
            error
        })
    }

    fn check_index(&self, index: usize, bound: usize) -> Result<(), TokenizeError> {
        if index < bound {
            Ok(())
        } else {
            Err(TokenizeError::LineOutOfRange {
                index,
                line_count: self.lines.len(),
            })
        }
    }

    /// Rescan from `start`. Stops at the first line at or after
    /// `compare_from` whose end stack is unchanged. Nothing is written back
    /// unless every rescanned line succeeds.
    fn retokenize(
        &mut self,
        start: usize,
        compare_from: usize,
        shifted: bool,
    ) -> Result<Range<usize>, TokenizeError> {
        let mut frames = match start.checked_sub(1) {
            Some(previous) => self.lines[previous].end_frames.clone(),
            None => Vec::new(),
        };

        let mut rescanned = Vec::new();
        let mut index = start;
        while index < self.lines.len() {
            let line = &self.lines[index];
            let (tokens, _) = scan_line(&self.grammar, &mut frames, &line.text, line_number(index))?;
            let settled = index >= compare_from && frames == line.end_frames;

            rescanned.push((tokens, (!settled).then(|| frames.clone())));
            index += 1;

            if settled {
                break;
            }
        }

        for (offset, (tokens, end_frames)) in rescanned.into_iter().enumerate() {
            let line = &mut self.lines[start + offset];
            line.tokens = tokens;
            if let Some(end_frames) = end_frames {
                line.end_state = StateStack::from_ids(&self.grammar, &end_frames);
                line.end_frames = end_frames;
            }
        }

        if shifted {
            for (offset, line) in self.lines[index..].iter_mut().enumerate() {
                renumber(&mut line.tokens, line_number(index + offset));
            }
        }

        if let Some(metrics) = self.metrics.as_mut() {
            metrics.retokenized_lines += index - start;
        }

        log_debug!("Document retokenized",
            "grammar" => self.grammar.name(),
            "from" => start,
            "to" => index,
            "lines" => self.lines.len()
        );
        if crate::logging::config::log_performance_events() {
            log_success!(codes::success::DOCUMENT_UPDATED, "Document updated",
                "retokenized" => index - start
            );
        }

        Ok(start..index)
    }
}

fn line_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn renumber(tokens: &mut [Token], line: u32) {
    for token in tokens {
        token.span.start.line = line;
        token.span.end.line = line;
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

fn single_line(index: usize, text: &str) -> Result<String, TokenizeError> {
    let text = text.strip_suffix('\r').unwrap_or(text);
    if text.contains(|c| c == '\n' || c == '\r') {
        return Err(TokenizeError::EmbeddedLineBreak { index });
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_time::tokenizer::MAX_STATE_STACK_DEPTH;
    use crate::grammar::builtin;
    use assert_matches::assert_matches;

    const JCL_DECK: &str = "//MYJOB    JOB (ACCT),'PROGRAMMER',CLASS=A,\r\n\
        //             MSGCLASS=X\n\
        //* comment\n\
        //STEP1    EXEC PGM=IEFBR14\n\
        //DD1      DD DSN=A.B,\n\
        //            DISP=SHR";

    fn jcl_document(text: &str) -> TokenizedDocument {
        TokenizedDocument::new(builtin::jcl().unwrap(), text).unwrap()
    }

    fn assert_same_as_fresh(document: &TokenizedDocument) {
        let fresh = TokenizedDocument::new(Arc::clone(document.grammar()), &document.text()).unwrap();
        assert_eq!(document.lines(), fresh.lines());
    }

    #[test]
    fn test_split_and_line_numbers() {
        let document = jcl_document(JCL_DECK);

        assert_eq!(document.line_count(), 6);
        assert_eq!(document.line(0).unwrap().text(), "//MYJOB    JOB (ACCT),'PROGRAMMER',CLASS=A,");
        for (index, line) in document.lines().iter().enumerate() {
            assert!(line.tokens().iter().all(|t| t.span.start.line == index as u32 + 1));
        }
        // The comment-looking line is still inside the continued statement
        assert_eq!(document.line(2).unwrap().tokens()[0].kind, "jcl-variable");
        assert!(document.line(2).unwrap().end_state().is_initial());
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        let document = jcl_document("");
        assert_eq!(document.line_count(), 1);
        assert!(document.line(0).unwrap().tokens().is_empty());
        assert!(document.end_state().is_initial());
    }

    #[test]
    fn test_document_matches_line_by_line_engine() {
        let grammar = builtin::jcl().unwrap();
        let document = TokenizedDocument::new(Arc::clone(&grammar), JCL_DECK).unwrap();

        let mut stack = StateStack::new();
        for (index, line) in document.lines().iter().enumerate() {
            let expected =
                crate::tokenizer::tokenize_line_at(&grammar, &stack, line.text(), index as u32 + 1)
                    .unwrap();
            assert_eq!(line.tokens(), expected.tokens.as_slice());
            assert_eq!(line.end_state(), &expected.end_state);
            stack = expected.end_state;
        }
    }

    #[test]
    fn test_update_stops_once_state_settles() {
        let mut document = jcl_document(JCL_DECK);

        // Same end state as before: only the edited line is rescanned
        let range = document.update_line(3, "//STEP2    EXEC PGM=IEFBR14").unwrap();
        assert_eq!(range, 3..4);
        assert_same_as_fresh(&document);
    }

    #[test]
    fn test_update_propagates_changed_state() {
        let mut document = jcl_document("//A DD X\n//  B\n//C DD Y");
        let before = document.line(0).unwrap().end_state().clone();

        let range = document.update_line(0, "//A DD X,").unwrap();
        assert_ne!(document.line(0).unwrap().end_state(), &before);
        assert!(range.end > 1);
        assert_same_as_fresh(&document);
    }

    #[test]
    fn test_insert_and_remove_lines() {
        let mut document = jcl_document(JCL_DECK);

        document.insert_line(2, "//EXTRA    DD DUMMY,").unwrap();
        assert_eq!(document.line_count(), 7);
        assert_same_as_fresh(&document);

        document.insert_line(7, "//* trailer").unwrap();
        assert_eq!(document.line(7).unwrap().text(), "//* trailer");
        assert_same_as_fresh(&document);

        document.remove_line(0).unwrap();
        assert_eq!(document.line_count(), 7);
        assert_same_as_fresh(&document);

        document.remove_line(6).unwrap();
        assert_same_as_fresh(&document);
    }

    #[test]
    fn test_hlasm_edits_match_fresh_tokenization() {
        let grammar = builtin::hlasm().unwrap();
        let source = "* PROGRAM\nMAIN     CSECT\n         DC    A,        X\n               B\nEND      DS 0H";
        let mut document = TokenizedDocument::new(grammar, source).unwrap();

        document.update_line(2, "         DC    A").unwrap();
        assert_same_as_fresh(&document);

        document.update_line(2, "         DC    A,        X").unwrap();
        assert_same_as_fresh(&document);

        document.remove_line(3).unwrap();
        assert_same_as_fresh(&document);
    }

    #[test]
    fn test_edit_errors() {
        let mut document = jcl_document("//A DD X");

        assert_matches!(
            document.update_line(1, "x"),
            Err(TokenizeError::LineOutOfRange { index: 1, line_count: 1 })
        );
        assert_matches!(
            document.insert_line(2, "x"),
            Err(TokenizeError::LineOutOfRange { index: 2, .. })
        );
        assert_matches!(document.remove_line(5), Err(TokenizeError::LineOutOfRange { .. }));
        assert_matches!(
            document.update_line(0, "a\nb"),
            Err(TokenizeError::EmbeddedLineBreak { index: 0 })
        );

        // A trailing carriage return is accepted and dropped
        document.update_line(0, "//A DD Y\r").unwrap();
        assert_eq!(document.text(), "//A DD Y");
    }

    fn nesting_grammar() -> Arc<Grammar> {
        let grammar = Grammar::from_toml_str(
            r#"
            [[states.root]]
            pattern = '\('
            token = "open"
            next = { push = "root" }

            [[states.root]]
            pattern = '\)'
            token = "close"
            next = "pop"
            "#,
        )
        .unwrap();
        Arc::new(grammar)
    }

    #[test]
    fn test_too_deep_document_is_rejected() {
        let text = "(".repeat(MAX_STATE_STACK_DEPTH + 1);

        assert_matches!(
            TokenizedDocument::new(nesting_grammar(), &text),
            Err(TokenizeError::StackDepthExceeded { .. })
        );
    }

    #[test]
    fn test_failed_edit_leaves_document_unchanged() {
        let deep = "(".repeat(MAX_STATE_STACK_DEPTH - 1);
        let source = format!("{deep}\n)\n((\nx");
        let mut document = TokenizedDocument::new(nesting_grammar(), &source).unwrap();
        let before = document.clone();

        assert_matches!(
            document.update_line(1, "(("),
            Err(TokenizeError::StackDepthExceeded { .. })
        );
        assert_eq!(document.lines(), before.lines());

        assert_matches!(
            document.insert_line(1, "(("),
            Err(TokenizeError::StackDepthExceeded { .. })
        );
        assert_eq!(document.lines(), before.lines());

        // Without the closing line the third line pushes past the limit
        assert_matches!(
            document.remove_line(1),
            Err(TokenizeError::StackDepthExceeded { .. })
        );
        assert_eq!(document.lines(), before.lines());
        assert_same_as_fresh(&document);

        // Edits that stay within the limit still go through
        document.update_line(2, "(").unwrap();
        assert_eq!(document.end_state().depth(), MAX_STATE_STACK_DEPTH - 1);
        assert_same_as_fresh(&document);
    }

    #[test]
    fn test_metrics_are_collected() {
        let document = jcl_document(JCL_DECK);
        let metrics = document.metrics().unwrap();

        assert_eq!(metrics.lines, 6);
        assert_eq!(metrics.tokens, document.tokens().count());
        assert!(metrics.max_stack_depth >= 4);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn edited_document_matches_fresh_tokenization(
                lines in proptest::collection::vec("[ -~]{0,60}", 1..8),
                replacement in "[ -~]{0,60}",
                inserted in "[ -~]{0,60}",
                at in any::<prop::sample::Index>(),
                jcl in any::<bool>(),
            ) {
                let grammar = (if jcl { builtin::jcl() } else { builtin::hlasm() }).unwrap();
                let Ok(mut document) = TokenizedDocument::from_lines(Arc::clone(&grammar), lines) else {
                    return Ok(());
                };

                let mut edits = vec![
                    document.update_line(at.index(document.line_count()), &replacement),
                    document.insert_line(at.index(document.line_count() + 1), &inserted),
                ];
                // Removing the only line would leave no lines, which text
                // cannot express
                if document.line_count() > 1 {
                    edits.push(document.remove_line(at.index(document.line_count())));
                }
                for edit in edits {
                    if let Err(error) = edit {
                        let is_depth_error =
                            matches!(error, TokenizeError::StackDepthExceeded { .. });
                        prop_assert!(is_depth_error);
                    }
                }

                let fresh = TokenizedDocument::new(Arc::clone(&grammar), &document.text()).unwrap();
                prop_assert_eq!(document.lines(), fresh.lines());
            }
        }
    }
}
