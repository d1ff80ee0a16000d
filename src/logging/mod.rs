//! Priority-Filtered Log Sink
//!
//! Process-wide message sink with per-category priority overrides and a
//! pluggable output function. Messages below the effective threshold of their
//! category are discarded before formatting. The default output forwards to
//! `tracing`, so application messages land in the same subscriber as the
//! pipeline's own diagnostics.
//!
//! # Example
//!
//! ```rust
//! use lamco_input_core::logging::{LogCategory, LogPriority, LogSink};
//!
//! let sink = LogSink::new();
//! sink.set_priority(LogCategory::INPUT, LogPriority::Warn);
//! sink.log(LogCategory::INPUT, LogPriority::Info, format_args!("dropped"));
//! sink.log(LogCategory::INPUT, LogPriority::Error, format_args!("delivered"));
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::sync::{Arc, OnceLock};

/// Maximum formatted message length in bytes
pub const MAX_LOG_MESSAGE: usize = 4096;

/// Log category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogCategory(pub u32);

impl LogCategory {
    pub const APPLICATION: LogCategory = LogCategory(0);
    pub const ERROR: LogCategory = LogCategory(1);
    pub const ASSERT: LogCategory = LogCategory(2);
    pub const SYSTEM: LogCategory = LogCategory(3);
    pub const AUDIO: LogCategory = LogCategory(4);
    pub const VIDEO: LogCategory = LogCategory(5);
    pub const RENDER: LogCategory = LogCategory(6);
    pub const INPUT: LogCategory = LogCategory(7);
    pub const TEST: LogCategory = LogCategory(8);
    /// First category available to applications
    pub const CUSTOM: LogCategory = LogCategory(19);

    /// Parse a category name or number
    pub fn from_name(name: &str) -> Option<Self> {
        let category = match name.to_lowercase().as_str() {
            "application" | "app" => Self::APPLICATION,
            "error" => Self::ERROR,
            "assert" => Self::ASSERT,
            "system" => Self::SYSTEM,
            "audio" => Self::AUDIO,
            "video" => Self::VIDEO,
            "render" => Self::RENDER,
            "input" => Self::INPUT,
            "test" => Self::TEST,
            other => return other.parse::<u32>().ok().map(LogCategory),
        };
        Some(category)
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::APPLICATION => write!(f, "application"),
            Self::ERROR => write!(f, "error"),
            Self::ASSERT => write!(f, "assert"),
            Self::SYSTEM => write!(f, "system"),
            Self::AUDIO => write!(f, "audio"),
            Self::VIDEO => write!(f, "video"),
            Self::RENDER => write!(f, "render"),
            Self::INPUT => write!(f, "input"),
            Self::TEST => write!(f, "test"),
            LogCategory(n) => write!(f, "category{}", n),
        }
    }
}

/// Log priority, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogPriority {
    Verbose = 1,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl std::str::FromStr for LogPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbose" | "trace" => Ok(Self::Verbose),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown log priority: {}", s)),
        }
    }
}

/// Compiled-in default for categories without a named default
pub const DEFAULT_PRIORITY: LogPriority = LogPriority::Critical;
/// Compiled-in default for [`LogCategory::APPLICATION`]
pub const DEFAULT_APPLICATION_PRIORITY: LogPriority = LogPriority::Info;
/// Compiled-in default for [`LogCategory::ASSERT`]
pub const DEFAULT_ASSERT_PRIORITY: LogPriority = LogPriority::Warn;
/// Compiled-in default for [`LogCategory::TEST`]
pub const DEFAULT_TEST_PRIORITY: LogPriority = LogPriority::Verbose;

/// Output function receiving fully formatted messages
pub type LogOutput = Arc<dyn Fn(LogCategory, LogPriority, &str) + Send + Sync>;

struct LogState {
    overrides: Vec<(LogCategory, LogPriority)>,
    default_priority: LogPriority,
    application_priority: LogPriority,
    assert_priority: LogPriority,
    test_priority: LogPriority,
    output: Option<LogOutput>,
}

impl LogState {
    fn priority(&self, category: LogCategory) -> LogPriority {
        if let Some((_, priority)) = self.overrides.iter().find(|(c, _)| *c == category) {
            return *priority;
        }
        match category {
            LogCategory::TEST => self.test_priority,
            LogCategory::APPLICATION => self.application_priority,
            LogCategory::ASSERT => self.assert_priority,
            _ => self.default_priority,
        }
    }
}

/// Log sink
pub struct LogSink {
    state: RwLock<LogState>,
}

impl LogSink {
    /// Create a sink with compiled-in defaults and the tracing output
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LogState {
                overrides: Vec::new(),
                default_priority: DEFAULT_PRIORITY,
                application_priority: DEFAULT_APPLICATION_PRIORITY,
                assert_priority: DEFAULT_ASSERT_PRIORITY,
                test_priority: DEFAULT_TEST_PRIORITY,
                output: Some(Arc::new(tracing_output)),
            }),
        }
    }

    /// Override the priority of one category
    pub fn set_priority(&self, category: LogCategory, priority: LogPriority) {
        let mut state = self.state.write();
        if let Some(entry) = state.overrides.iter_mut().find(|(c, _)| *c == category) {
            entry.1 = priority;
        } else {
            state.overrides.push((category, priority));
        }
    }

    /// Effective priority threshold of a category
    pub fn priority(&self, category: LogCategory) -> LogPriority {
        self.state.read().priority(category)
    }

    /// Set every override and every named default to `priority`
    pub fn set_all_priority(&self, priority: LogPriority) {
        let mut state = self.state.write();
        for entry in state.overrides.iter_mut() {
            entry.1 = priority;
        }
        state.default_priority = priority;
        state.application_priority = priority;
        state.assert_priority = priority;
        state.test_priority = priority;
    }

    /// Drop all overrides and restore compiled-in defaults
    pub fn reset_priorities(&self) {
        let mut state = self.state.write();
        state.overrides.clear();
        state.default_priority = DEFAULT_PRIORITY;
        state.application_priority = DEFAULT_APPLICATION_PRIORITY;
        state.assert_priority = DEFAULT_ASSERT_PRIORITY;
        state.test_priority = DEFAULT_TEST_PRIORITY;
    }

    /// Replace the output function (None silences the sink)
    pub fn set_output(&self, output: Option<LogOutput>) {
        self.state.write().output = output;
    }

    /// Current output function
    pub fn output(&self) -> Option<LogOutput> {
        self.state.read().output.clone()
    }

    /// Format and deliver a message
    pub fn log(&self, category: LogCategory, priority: LogPriority, args: fmt::Arguments<'_>) {
        let output = {
            let state = self.state.read();
            let Some(output) = state.output.clone() else {
                return;
            };
            if priority < state.priority(category) {
                return;
            }
            output
        };

        let mut message = String::new();
        if message.write_fmt(args).is_err() {
            return;
        }
        truncate_message(&mut message);
        output(category, priority, &message);
    }

    /// Deliver an already formatted message
    pub fn message(&self, category: LogCategory, priority: LogPriority, msg: &str) {
        self.log(category, priority, format_args!("{}", msg));
    }

    /// Log at [`LogPriority::Debug`]
    pub fn debug(&self, category: LogCategory, args: fmt::Arguments<'_>) {
        self.log(category, LogPriority::Debug, args);
    }

    /// Log at [`LogPriority::Info`]
    pub fn info(&self, category: LogCategory, args: fmt::Arguments<'_>) {
        self.log(category, LogPriority::Info, args);
    }

    /// Log at [`LogPriority::Warn`]
    pub fn warn(&self, category: LogCategory, args: fmt::Arguments<'_>) {
        self.log(category, LogPriority::Warn, args);
    }

    /// Log at [`LogPriority::Error`]
    pub fn error(&self, category: LogCategory, args: fmt::Arguments<'_>) {
        self.log(category, LogPriority::Error, args);
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide sink
pub fn global() -> &'static LogSink {
    static GLOBAL: OnceLock<LogSink> = OnceLock::new();
    GLOBAL.get_or_init(LogSink::new)
}

/// Default output: forward to `tracing`
pub fn tracing_output(category: LogCategory, priority: LogPriority, msg: &str) {
    match priority {
        LogPriority::Verbose => tracing::trace!(%category, "{}", msg),
        LogPriority::Debug => tracing::debug!(%category, "{}", msg),
        LogPriority::Info => tracing::info!(%category, "{}", msg),
        LogPriority::Warn => tracing::warn!(%category, "{}", msg),
        LogPriority::Error | LogPriority::Critical => tracing::error!(%category, "{}", msg),
    }
}

/// Cap at [`MAX_LOG_MESSAGE`] bytes, then strip one trailing `\n` and one `\r`
fn truncate_message(message: &mut String) {
    if message.len() >= MAX_LOG_MESSAGE {
        let mut end = MAX_LOG_MESSAGE - 1;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }
    if message.ends_with('\n') {
        message.pop();
        if message.ends_with('\r') {
            message.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn capturing_sink() -> (LogSink, Arc<Mutex<Vec<(LogCategory, LogPriority, String)>>>) {
        let sink = LogSink::new();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let target = Arc::clone(&captured);
        sink.set_output(Some(Arc::new(move |category, priority, msg: &str| {
            target.lock().push((category, priority, msg.to_string()));
        })));
        (sink, captured)
    }

    #[test]
    fn test_category_override_filters() {
        let (sink, captured) = capturing_sink();

        sink.set_priority(LogCategory(7), LogPriority::Warn);
        sink.log(LogCategory(7), LogPriority::Info, format_args!("quiet"));
        assert!(captured.lock().is_empty());

        sink.log(LogCategory(7), LogPriority::Error, format_args!("loud"));
        let captured = captured.lock();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].2, "loud");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let sink = LogSink::new();

        sink.set_priority(LogCategory::INPUT, LogPriority::Warn);
        assert_eq!(sink.priority(LogCategory::INPUT), LogPriority::Warn);

        sink.reset_priorities();
        assert_eq!(sink.priority(LogCategory::INPUT), DEFAULT_PRIORITY);
        assert_eq!(
            sink.priority(LogCategory::APPLICATION),
            DEFAULT_APPLICATION_PRIORITY
        );
    }

    #[test]
    fn test_named_defaults() {
        let sink = LogSink::new();
        assert_eq!(sink.priority(LogCategory::APPLICATION), LogPriority::Info);
        assert_eq!(sink.priority(LogCategory::ASSERT), LogPriority::Warn);
        assert_eq!(sink.priority(LogCategory::TEST), LogPriority::Verbose);
        assert_eq!(sink.priority(LogCategory::VIDEO), LogPriority::Critical);
    }

    #[test]
    fn test_set_all_priority() {
        let sink = LogSink::new();
        sink.set_priority(LogCategory::INPUT, LogPriority::Error);

        sink.set_all_priority(LogPriority::Debug);

        assert_eq!(sink.priority(LogCategory::INPUT), LogPriority::Debug);
        assert_eq!(sink.priority(LogCategory::TEST), LogPriority::Debug);
        assert_eq!(sink.priority(LogCategory(42)), LogPriority::Debug);
    }

    #[test]
    fn test_no_output_is_silent() {
        let sink = LogSink::new();
        sink.set_output(None);
        // Must not panic or format
        sink.log(LogCategory::ERROR, LogPriority::Critical, format_args!("x"));
        assert!(sink.output().is_none());
    }

    #[test]
    fn test_trailing_newline_stripped() {
        let (sink, captured) = capturing_sink();

        sink.message(LogCategory::APPLICATION, LogPriority::Info, "line\r\n");
        sink.message(LogCategory::APPLICATION, LogPriority::Info, "two\n\n");

        let captured = captured.lock();
        assert_eq!(captured[0].2, "line");
        assert_eq!(captured[1].2, "two\n");
    }

    #[test]
    fn test_long_message_truncated() {
        let (sink, captured) = capturing_sink();

        let long = "é".repeat(MAX_LOG_MESSAGE);
        sink.message(LogCategory::APPLICATION, LogPriority::Info, &long);

        let captured = captured.lock();
        assert!(captured[0].2.len() < MAX_LOG_MESSAGE);
        assert!(captured[0].2.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(LogCategory::from_name("input"), Some(LogCategory::INPUT));
        assert_eq!(LogCategory::from_name("21"), Some(LogCategory(21)));
        assert_eq!(LogCategory::from_name("bogus"), None);
        assert_eq!(LogCategory::INPUT.to_string(), "input");
        assert_eq!("warning".parse::<LogPriority>(), Ok(LogPriority::Warn));
    }
}
