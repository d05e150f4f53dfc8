//! Coded event logging for the hilite engine
//!
//! Every event goes to one global [`LoggingService`]. While a batch worker
//! has a file context set, its errors and warnings are also kept per file in
//! the global [`ErrorCollector`], which the CLI turns into a cargo-style
//! report at the end of a run. Events logged before
//! [`init_global_logging`] are dropped.

pub mod codes;
pub mod collector;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use crate::utils::Span;
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::OnceLock;

pub use codes::Code;
pub use collector::{ErrorCollector, FileProcessingContext, ProcessingSummary};
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

static SERVICE: OnceLock<LoggingService> = OnceLock::new();
static COLLECTOR: OnceLock<ErrorCollector> = OnceLock::new();

thread_local! {
    static CURRENT_FILE: RefCell<Option<FileProcessingContext>> = const { RefCell::new(None) };
}

/// Install the global service from the runtime preferences. Fails if
/// logging is already initialized.
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Invalid logging limits: {}", e))?;

    SERVICE
        .set(LoggingService::with_config())
        .map_err(|_| "Logging already initialized".to_string())?;
    COLLECTOR.get_or_init(ErrorCollector::new);

    dispatch(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Logging initialized",
    ));
    Ok(())
}

/// Run `f` with `file_path` as the current thread's file context
pub fn with_file_context<F, R>(file_path: PathBuf, file_id: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    if let Some(collector) = COLLECTOR.get() {
        collector.start_file(&file_path);
    }
    let previous = CURRENT_FILE.with(|current| {
        current
            .borrow_mut()
            .replace(FileProcessingContext { file_path, file_id })
    });

    let result = f();

    CURRENT_FILE.with(|current| *current.borrow_mut() = previous);
    result
}

pub fn current_file_context() -> Option<FileProcessingContext> {
    CURRENT_FILE.with(|current| current.borrow().clone())
}

/// Errors and warnings collected per file so far
pub fn processing_summary() -> ProcessingSummary {
    COLLECTOR
        .get()
        .map(ErrorCollector::summary)
        .unwrap_or_default()
}

/// Cargo-style report of everything collected so far
pub fn format_cargo_style_summary() -> Option<String> {
    COLLECTOR.get().map(ErrorCollector::cargo_style_report)
}

fn tag_with_file(event: LogEvent, file: &FileProcessingContext) -> LogEvent {
    if !config::include_file_context() {
        return event;
    }
    event
        .with_context("file", file.file_path.display().to_string())
        .with_context("file_id", file.file_id.to_string())
}

/// Route an event to the service, and to the collector when it is an error
/// or warning raised under a file context
pub fn dispatch(event: LogEvent) {
    let file = current_file_context();
    let event = match &file {
        Some(file) => tag_with_file(event, file),
        None => event,
    };

    if let Some(service) = SERVICE.get() {
        service.log_event(&event);
    }

    if let (Some(file), Some(collector)) = (file, COLLECTOR.get()) {
        if event.is_error() || event.is_warning() {
            collector.record_event(&file.file_path, event);
        }
    }
}

fn with_pairs(event: LogEvent, context: Vec<(&str, String)>) -> LogEvent {
    context
        .into_iter()
        .fold(event, |event, (key, value)| event.with_context(key, value))
}

pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<Span>,
    context: Vec<(&str, String)>,
) {
    let mut event = LogEvent::error(code, message);
    if let Some(span) = span {
        event = event.with_span(span);
    }
    dispatch(with_pairs(event, context));
}

pub fn log_warning_with_context(code: Option<Code>, message: &str, context: Vec<(&str, String)>) {
    dispatch(with_pairs(LogEvent::warning(code, message), context));
}

pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, String)>) {
    dispatch(with_pairs(LogEvent::success(code, message), context));
}

pub fn log_info_with_context(message: &str, context: Vec<(&str, String)>) {
    dispatch(with_pairs(LogEvent::info(message), context));
}

pub fn log_debug_with_context(message: &str, context: Vec<(&str, String)>) {
    dispatch(with_pairs(LogEvent::debug(message), context));
}
