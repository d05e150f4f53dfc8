//! Logging macros
//!
//! Every macro takes a message followed by optional `"key" => value` pairs;
//! values may be any `Display` type.
//!
//! ```ignore
//! log_error!(codes::grammar::INVALID_PATTERN, "Bad pattern", "state" => name);
//! log_warning!(code = codes::tokenizer::LINE_TOO_LONG, "Line too long", "line" => n);
//! log_debug!("Retokenized", "from" => start, "to" => end);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __log_pairs {
    ($($key:expr => $value:expr),*) => {
        ::std::vec![$(($key, ::std::format!("{}", $value))),*]
    };
}

#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr, span = $span:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_error_with_context(
            $code,
            $message,
            Some($span),
            $crate::__log_pairs!($($key => $value),*),
        )
    };
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_error_with_context(
            $code,
            $message,
            None,
            $crate::__log_pairs!($($key => $value),*),
        )
    };
}

/// Warnings may carry a code: `log_warning!(code = CODE, "msg", ...)`
#[macro_export]
macro_rules! log_warning {
    (code = $code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_warning_with_context(
            Some($code),
            $message,
            $crate::__log_pairs!($($key => $value),*),
        )
    };
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_warning_with_context(
            None,
            $message,
            $crate::__log_pairs!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_success_with_context(
            $code,
            $message,
            $crate::__log_pairs!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logging::log_info_with_context($message, $crate::__log_pairs!($($key => $value),*))
    };
}

/// Context values are only formatted when debug logging is enabled
#[macro_export]
macro_rules! log_debug {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        if $crate::logging::config::debug_enabled() {
            $crate::logging::log_debug_with_context(
                $message,
                $crate::__log_pairs!($($key => $value),*),
            )
        }
    };
}
