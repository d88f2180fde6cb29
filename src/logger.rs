//! Logging with colored module prefixes.
//!
//! Components receive a [`Logger`] instead of reaching for global state, so
//! each one can be handed a module tag and tests can swap the terminal sink
//! for an in-memory capture.
//!
//! # Example
//!
//! ```ignore
//! let logger = Logger::terminal("adev", verbose);
//! let reload = logger.child("reload");
//! log!(reload; "prompted reload of {} on {} client", path, 1);
//! debug!(reload; "skipping client at {}", url);
//! ```

use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::Arc,
};

// ============================================================================
// Log Macros
// ============================================================================

/// Log an info message through a [`Logger`].
///
/// # Usage
/// ```ignore
/// log!(logger; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr; $($arg:tt)*) => {{
        $logger.emit($crate::logger::Level::Info, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when the logger is verbose)
#[macro_export]
macro_rules! debug {
    ($logger:expr; $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_verbose() {
            logger.emit($crate::logger::Level::Debug, &format!($($arg)*))
        }
    }};
}

/// Log a warning
#[macro_export]
macro_rules! warn {
    ($logger:expr; $($arg:tt)*) => {{
        $logger.emit($crate::logger::Level::Warn, &format!($($arg)*))
    }};
}

/// Log an error
#[macro_export]
macro_rules! error {
    ($logger:expr; $($arg:tt)*) => {{
        $logger.emit($crate::logger::Level::Error, &format!($($arg)*))
    }};
}

// ============================================================================
// Logger
// ============================================================================

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single emitted line, kept by [`LogCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub module: &'static str,
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Clone)]
enum Sink {
    Terminal,
    Capture(LogCapture),
}

/// Cheap, cloneable logging handle.
#[derive(Debug, Clone)]
pub struct Logger {
    module: &'static str,
    verbose: bool,
    sink: Sink,
}

impl Logger {
    /// Logger writing colored lines to stdout.
    pub fn terminal(module: &'static str, verbose: bool) -> Self {
        Self {
            module,
            verbose,
            sink: Sink::Terminal,
        }
    }

    /// Verbose logger recording into memory.
    pub fn capture(module: &'static str) -> (Self, LogCapture) {
        let capture = LogCapture::default();
        let logger = Self {
            module,
            verbose: true,
            sink: Sink::Capture(capture.clone()),
        };
        (logger, capture)
    }

    /// Same sink and verbosity, different module tag.
    pub fn child(&self, module: &'static str) -> Self {
        Self {
            module,
            ..self.clone()
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Emit one record. Prefer the `log!`/`debug!`/`warn!`/`error!` macros.
    pub fn emit(&self, level: Level, message: &str) {
        if level == Level::Debug && !self.verbose {
            return;
        }
        match &self.sink {
            Sink::Terminal => write_terminal(self.module, level, message),
            Sink::Capture(capture) => capture.push(Record {
                module: self.module,
                level,
                message: message.to_string(),
            }),
        }
    }
}

fn write_terminal(module: &str, level: Level, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();
    let line = match level {
        Level::Debug => format!("{prefix} {}", message.dimmed()),
        Level::Info => format!("{prefix} {message}"),
        Level::Warn => format!("{prefix} {}", message.yellow()),
        Level::Error => format!("{prefix} {}", message.bright_red()),
    };
    writeln!(stdout, "{line}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module {
        "serve" | "aux" => prefix.bright_blue().bold().to_string(),
        "watch" | "app" => prefix.bright_green().bold().to_string(),
        "reload" | "ws" => prefix.bright_magenta().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Capture sink
// ============================================================================

/// Shared buffer of records, used by tests to assert on log output.
#[derive(Debug, Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<Record>>>);

impl LogCapture {
    fn push(&self, record: Record) {
        self.0.lock().push(record);
    }

    pub fn records(&self) -> Vec<Record> {
        self.0.lock().clone()
    }

    /// True if some record at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.0
            .lock()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }
}

// ============================================================================
// Tests
// ============================================================================
