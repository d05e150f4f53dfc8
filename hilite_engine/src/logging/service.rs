//! Event sinks and the level-filtering service in front of them

use super::config;
use super::events::{LogEvent, LogLevel};
use std::sync::{Arc, Mutex};

pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Filters events by level before handing them to its logger. Without a
/// logger, events are dropped here and only reach the error collector.
pub struct LoggingService {
    logger: Option<Arc<dyn Logger>>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Option<Arc<dyn Logger>>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    /// Structured output wins over console output; with neither enabled
    /// the service is silent
    pub fn with_config() -> Self {
        let logger: Option<Arc<dyn Logger>> = if config::use_structured_logging() {
            Some(Arc::new(StructuredLogger))
        } else if config::use_console_logging() {
            Some(Arc::new(ConsoleLogger))
        } else {
            None
        };
        Self::new(logger, config::min_log_level())
    }

    pub fn log_event(&self, event: &LogEvent) {
        if event.level > self.min_level {
            return;
        }
        if let Some(logger) = &self.logger {
            logger.log(event);
        }
    }
}

/// Human-readable lines on stderr, keeping stdout for command output
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        eprintln!("{}", event);
    }
}

/// JSON lines on stderr
pub struct StructuredLogger;

impl Logger for StructuredLogger {
    fn log(&self, event: &LogEvent) {
        match event.format_json() {
            Ok(line) => eprintln!("{}", line),
            Err(_) => eprintln!("{}", event),
        }
    }
}

/// Keeps the most recent events in memory, up to the log buffer size
#[derive(Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        use crate::config::compile_time::logging::LOG_BUFFER_SIZE;

        let mut events = self.events.lock().unwrap();
        if events.len() >= LOG_BUFFER_SIZE {
            let excess = events.len() + 1 - LOG_BUFFER_SIZE;
            events.drain(..excess);
        }
        events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_time::logging::LOG_BUFFER_SIZE;
    use crate::logging::codes;

    fn service(min_level: LogLevel) -> (Arc<MemoryLogger>, LoggingService) {
        let memory = Arc::new(MemoryLogger::new());
        let logger: Arc<dyn Logger> = memory.clone();
        (memory, LoggingService::new(Some(logger), min_level))
    }

    #[test]
    fn test_console_and_structured_loggers_do_not_panic() {
        let event = LogEvent::error(codes::grammar::EMPTY_STATE, "state has no rules")
            .with_context("state", "operands");

        ConsoleLogger.log(&event);
        StructuredLogger.log(&event);
    }

    #[test]
    fn test_service_filters_by_level() {
        let (memory, service) = service(LogLevel::Warning);

        service.log_event(&LogEvent::debug("noise"));
        service.log_event(&LogEvent::success(codes::success::GRAMMAR_LOADED, "loaded"));
        service.log_event(&LogEvent::warning(None, "odd input"));
        service.log_event(&LogEvent::error(codes::system::INTERNAL_ERROR, "broken"));

        let levels: Vec<LogLevel> = memory.events().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![LogLevel::Warning, LogLevel::Error]);
    }

    #[test]
    fn test_silent_service_drops_events() {
        let service = LoggingService::new(None, LogLevel::Debug);
        service.log_event(&LogEvent::error(codes::system::INTERNAL_ERROR, "nobody listens"));
    }

    #[test]
    fn test_memory_logger_keeps_most_recent_events() {
        let memory = MemoryLogger::new();
        for i in 0..LOG_BUFFER_SIZE + 3 {
            memory.log(&LogEvent::info(&format!("event {}", i)));
        }

        let events = memory.events();
        assert_eq!(events.len(), LOG_BUFFER_SIZE);
        assert_eq!(events[0].message, "event 3");
    }
}
