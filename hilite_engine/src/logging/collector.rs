//! Per-file error and warning collection for batch runs

use super::events::LogEvent;
use crate::config::compile_time::logging::MAX_LOG_EVENTS_PER_FILE;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The file the current thread is working on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProcessingContext {
    pub file_path: PathBuf,
    pub file_id: usize,
}

/// Counts over every file the collector has seen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    pub files: usize,
    pub clean_files: usize,
    pub files_with_warnings: usize,
    pub files_with_errors: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl ProcessingSummary {
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.total_warnings > 0
    }
}

/// Errors and warnings grouped by file, in path order
#[derive(Default)]
pub struct ErrorCollector {
    files: Mutex<BTreeMap<PathBuf, Vec<LogEvent>>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file so it is counted even if it never logs anything
    pub fn start_file(&self, file_path: &Path) {
        self.files
            .lock()
            .unwrap()
            .entry(file_path.to_path_buf())
            .or_default();
    }

    /// Past `MAX_LOG_EVENTS_PER_FILE` one overflow warning is kept and the
    /// rest are dropped
    pub fn record_event(&self, file_path: &Path, event: LogEvent) {
        let mut files = self.files.lock().unwrap();
        let events = files.entry(file_path.to_path_buf()).or_default();

        match events.len() {
            n if n < MAX_LOG_EVENTS_PER_FILE => events.push(event),
            n if n == MAX_LOG_EVENTS_PER_FILE => events.push(LogEvent::warning(
                None,
                &format!("further events dropped (limit {})", MAX_LOG_EVENTS_PER_FILE),
            )),
            _ => {}
        }
    }

    pub fn file_events(&self, file_path: &Path) -> Vec<LogEvent> {
        self.files
            .lock()
            .unwrap()
            .get(file_path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn summary(&self) -> ProcessingSummary {
        let files = self.files.lock().unwrap();
        let mut summary = ProcessingSummary {
            files: files.len(),
            ..ProcessingSummary::default()
        };

        for events in files.values() {
            let errors = events.iter().filter(|e| e.is_error()).count();
            let warnings = events.iter().filter(|e| e.is_warning()).count();

            match (errors, warnings) {
                (0, 0) => summary.clean_files += 1,
                (0, _) => summary.files_with_warnings += 1,
                _ => summary.files_with_errors += 1,
            }
            summary.total_errors += errors;
            summary.total_warnings += warnings;
        }

        summary
    }

    /// Cargo-style report: a block per file with diagnostics, then totals
    pub fn cargo_style_report(&self) -> String {
        let mut output = String::new();

        {
            let files = self.files.lock().unwrap();
            for (file_path, events) in files.iter() {
                let mut diagnostics = events
                    .iter()
                    .filter(|e| e.is_error() || e.is_warning())
                    .peekable();
                if diagnostics.peek().is_none() {
                    continue;
                }

                let _ = writeln!(output, "Checking {}...", file_path.display());
                for event in diagnostics {
                    write_diagnostic(&mut output, file_path, event);
                }
                output.push('\n');
            }
        }

        let summary = self.summary();
        if summary.has_errors() {
            let _ = writeln!(output, "Total errors: {}", summary.total_errors);
        }
        if summary.has_warnings() {
            let _ = writeln!(output, "Total warnings: {}", summary.total_warnings);
        }
        output
    }
}

fn write_diagnostic(output: &mut String, file_path: &Path, event: &LogEvent) {
    let label = if event.is_error() { "error" } else { "warning" };
    let _ = write!(output, "{}[{}]: {}", label, event.code, event.message);
    if let Some(span) = &event.span {
        let _ = write!(
            output,
            " --> {}:{}:{}",
            file_path.display(),
            span.start().line,
            span.start().column
        );
    }
    output.push('\n');

    if event.is_error() {
        let _ = writeln!(
            output,
            "  = severity: {}, category: {}",
            event.severity(),
            event.category()
        );
    }
    for (key, value) in &event.context {
        if key != "file" && key != "file_id" {
            let _ = writeln!(output, "  = {}: {}", key, value);
        }
    }
    let action = event.recommended_action();
    if event.is_error() && action != "No specific action available" {
        let _ = writeln!(output, "  = help: {}", action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_summary_classifies_files() {
        let collector = ErrorCollector::new();

        collector.record_event(
            Path::new("a.asm"),
            LogEvent::error(codes::tokenizer::UNKNOWN_STATE, "no such state"),
        );
        collector.record_event(Path::new("b.asm"), LogEvent::warning(None, "odd"));
        collector.start_file(Path::new("c.asm"));

        assert_eq!(
            collector.summary(),
            ProcessingSummary {
                files: 3,
                clean_files: 1,
                files_with_warnings: 1,
                files_with_errors: 1,
                total_errors: 1,
                total_warnings: 1,
            }
        );
        assert_eq!(collector.file_events(Path::new("a.asm")).len(), 1);
        assert!(collector.file_events(Path::new("c.asm")).is_empty());
    }

    #[test]
    fn test_per_file_event_limit() {
        let collector = ErrorCollector::new();
        let file_path = Path::new("noisy.asm");

        for _ in 0..MAX_LOG_EVENTS_PER_FILE + 5 {
            collector.record_event(file_path, LogEvent::info("event"));
        }

        let events = collector.file_events(file_path);
        assert_eq!(events.len(), MAX_LOG_EVENTS_PER_FILE + 1);
        assert!(events.last().map(|e| e.is_warning()).unwrap_or(false));
    }

    #[test]
    fn test_cargo_style_report() {
        let collector = ErrorCollector::new();
        collector.start_file(Path::new("clean.toml"));
        collector.record_event(
            Path::new("broken.toml"),
            LogEvent::error(codes::grammar::INVALID_PATTERN, "unclosed group")
                .with_context("state", "root")
                .with_context("file", "broken.toml"),
        );

        let output = collector.cargo_style_report();
        assert!(output.starts_with("Checking broken.toml...\n"));
        assert!(output.contains("error[G005]: unclosed group\n"));
        assert!(output.contains("  = state: root\n"));
        assert!(!output.contains("= file:"));
        assert!(output.contains("  = help: Fix the pattern syntax\n"));
        assert!(!output.contains("clean.toml"));
        assert!(output.ends_with("Total errors: 1\n"));
    }
}
