#![deny(missing_docs)]
//! Shared logging utilities for the tab sync workspace.
//!
//! This crate provides the `sync_*` logging macros used across the codebase,
//! a process-wide sync cycle counter for tagging log lines, and a minimal test
//! initializer for the global logger.

use std::sync::atomic::{AtomicU64, Ordering};

/// Number of sync cycles started since process start.
static SYNC_CYCLE: AtomicU64 = AtomicU64::new(0);

/// Marks the start of a new sync cycle and returns its number (1-based).
pub fn begin_cycle() -> u64 {
    SYNC_CYCLE.fetch_add(1, Ordering::Relaxed) + 1
}

/// Returns the number of the most recently started sync cycle.
/// Returns 0 if no cycle has started yet.
pub fn current_cycle() -> u64 {
    SYNC_CYCLE.load(Ordering::Relaxed)
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! sync_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! sync_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! sync_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! sync_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! sync_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
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
