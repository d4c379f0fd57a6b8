//! Thin wrapper around `slog`/`sloggers`, in the style of `flux::logging`.
//!
//! Every component (codec, job engine, scheduler, state-machine driver) takes a
//! `Logger` at construction and derives a child logger with its own `"component"`
//! key, rather than reaching for a global logger.

pub use slog::{debug, error, info, o, trace, warn, Discard, Logger};

use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

/// Builds the process-wide root logger from a textual level (`"trace"` .. `"error"`).
/// Falls back to a discarding logger if the level string does not parse, mirroring the
/// teacher's preference for a safe default over a panic during startup.
pub fn init(level: &str) -> Logger {
    let severity = match level {
        "trace" => Severity::Trace,
        "debug" => Severity::Debug,
        "info" => Severity::Info,
        "warning" | "warn" => Severity::Warning,
        "error" => Severity::Error,
        _ => return Logger::root(Discard, o!()),
    };

    let mut builder = TerminalLoggerBuilder::new();
    builder.level(severity);
    builder.destination(Destination::Stderr);

    builder
        .build()
        .unwrap_or_else(|_| Logger::root(Discard, o!()))
}

/// A logger that discards everything; used in tests and by collaborators that have not
/// been handed a real logger.
pub fn discard() -> Logger {
    Logger::root(Discard, o!())
}
