#![deny(missing_docs)]
//! Shared logging utilities for the collector workspace.
//!
//! This crate provides the `ctx_*` logging macros used across the codebase,
//! a per-thread execution-context label that every macro prepends to its
//! message, and a minimal test initializer for the global logger.

use std::cell::Cell;

/// The execution context a thread is currently acting for.
///
/// Three contexts with independent lifetimes share one persistent store;
/// tagging every log line with its origin is the only practical way to read
/// an interleaved trace of a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextLabel {
    /// The long-lived background orchestrator.
    Background,
    /// A transient interactive panel session.
    Panel,
    /// The page-injected collection script.
    Page,
}

impl ContextLabel {
    /// Short tag used in log lines.
    pub fn tag(self) -> &'static str {
        match self {
            ContextLabel::Background => "background",
            ContextLabel::Panel => "panel",
            ContextLabel::Page => "page",
        }
    }
}

thread_local! {
    /// Thread-local storage for the current context label.
    static CONTEXT: Cell<ContextLabel> = const { Cell::new(ContextLabel::Background) };
}

/// Sets the context label for the current thread.
/// Each context loop should call this once when it starts.
pub fn set_context(label: ContextLabel) {
    CONTEXT.with(|v| v.set(label));
}

/// Retrieves the context label for the current thread.
/// Defaults to [`ContextLabel::Background`] if never set.
pub fn context() -> ContextLabel {
    CONTEXT.with(|v| v.get())
}

/// Logs a trace-level message tagged with the current context.
#[macro_export]
macro_rules! ctx_trace {
    ($($arg:tt)*) => {{
        log::trace!("[{}] {}", $crate::context().tag(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current context.
#[macro_export]
macro_rules! ctx_debug {
    ($($arg:tt)*) => {{
        log::debug!("[{}] {}", $crate::context().tag(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current context.
#[macro_export]
macro_rules! ctx_info {
    ($($arg:tt)*) => {{
        log::info!("[{}] {}", $crate::context().tag(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current context.
#[macro_export]
macro_rules! ctx_warn {
    ($($arg:tt)*) => {{
        log::warn!("[{}] {}", $crate::context().tag(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current context.
#[macro_export]
macro_rules! ctx_error {
    ($($arg:tt)*) => {{
        log::error!("[{}] {}", $crate::context().tag(), format_args!($($arg)*));
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
