#![deny(missing_docs)]
//! Shared logging utilities for the monitor workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every message logged
//! through the macros is stamped with the poll cycle that is currently running,
//! so a single log line can be tied back to the cycle that produced it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Poll cycle currently executing. Zero means no cycle has started yet.
static POLL_CYCLE: AtomicU64 = AtomicU64::new(0);

/// Records the poll cycle that is about to run.
/// The scheduler calls this once at the top of every cycle.
pub fn set_poll_cycle(cycle: u64) {
    POLL_CYCLE.store(cycle, Ordering::Relaxed);
}

/// Returns the poll cycle that is currently running, or 0 before the first one.
pub fn poll_cycle() -> u64 {
    POLL_CYCLE.load(Ordering::Relaxed)
}

/// Prefix prepended by the `engine_*` macros. Empty until a cycle has started.
#[doc(hidden)]
pub fn cycle_prefix() -> String {
    match poll_cycle() {
        0 => String::new(),
        n => format!("[cycle {n}] "),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::cycle_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::cycle_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::cycle_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::cycle_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::cycle_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::{cycle_prefix, poll_cycle, set_poll_cycle};

    #[test]
    fn prefix_tracks_current_cycle() {
        set_poll_cycle(0);
        assert_eq!(cycle_prefix(), "");
        set_poll_cycle(42);
        assert_eq!(poll_cycle(), 42);
        assert_eq!(cycle_prefix(), "[cycle 42] ");
        set_poll_cycle(0);
    }
}
