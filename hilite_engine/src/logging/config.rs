//! Logging limits and preferences
//!
//! Limits are fixed at build time; preferences are read from `HILITE_LOGGING_*`
//! environment variables the first time any of them is needed.

use super::events::LogLevel;
use crate::config::compile_time::logging::*;
use crate::config::runtime::LoggingPreferences;
use std::sync::OnceLock;

static PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

fn preferences() -> &'static LoggingPreferences {
    PREFERENCES.get_or_init(LoggingPreferences::default)
}

pub fn min_log_level() -> LogLevel {
    preferences().min_log_level.to_events_log_level()
}

/// Whether `log_debug!` should build its event at all
pub fn debug_enabled() -> bool {
    min_log_level() >= LogLevel::Debug
}

pub fn use_structured_logging() -> bool {
    preferences().use_structured_logging
}

pub fn use_console_logging() -> bool {
    preferences().enable_console_logging
}

pub fn log_performance_events() -> bool {
    preferences().log_performance_events
}

pub fn use_cargo_style_output() -> bool {
    preferences().enable_cargo_style_output
}

pub fn include_file_context() -> bool {
    preferences().include_file_context
}

pub fn max_log_message_length() -> usize {
    MAX_LOG_MESSAGE_LENGTH
}

/// Reject build profiles whose logging limits contradict each other
pub fn validate_config() -> Result<(), String> {
    if !(100..=100_000).contains(&LOG_BUFFER_SIZE) {
        return Err(format!(
            "log buffer size {} outside 100..=100000",
            LOG_BUFFER_SIZE
        ));
    }
    if MAX_LOG_EVENTS_PER_FILE > LOG_BUFFER_SIZE {
        return Err(format!(
            "per-file event limit {} exceeds log buffer size {}",
            MAX_LOG_EVENTS_PER_FILE, LOG_BUFFER_SIZE
        ));
    }
    if MAX_LOG_MESSAGE_LENGTH < 80 {
        return Err(format!(
            "message length limit {} is below 80",
            MAX_LOG_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_limits_are_consistent() {
        assert!(validate_config().is_ok());
        assert!(max_log_message_length() >= 80);
    }

    #[test]
    fn test_debug_gate_follows_min_level() {
        assert_eq!(debug_enabled(), min_log_level() == LogLevel::Debug);
    }
}
