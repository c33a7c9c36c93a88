//! Level-filtered, interpolating application logger.
//!
//! A [`Logger`] owns one [`Writer`] sink and decides which messages reach it.
//! Each level method reports whether the message was written, so callers can
//! tell a filtered message from a delivered one without any error handling.
//!
//! ```rust
//! use envreq::log::{Level, Logger};
//!
//! let mut lines = Vec::new();
//! let mut log = Logger::new(|msg: &str, _level: Level| {
//!     lines.push(msg.to_owned());
//!     true
//! });
//! log.set_level(Level::Warn).unwrap();
//!
//! assert!(!log.info("cache warmed"));
//! assert!(log.log_with(Level::Error, "lost {peer}", &[("peer", "10.0.0.7")]));
//! drop(log);
//! assert_eq!(lines, ["lost 10.0.0.7"]);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Message severity, ordered from most to least verbose.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Level {
    Debug,
    Info,
    Notice,
    Warn,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Level {
    pub const ALL: [Level; 8] = [
        Self::Debug,
        Self::Info,
        Self::Notice,
        Self::Warn,
        Self::Error,
        Self::Critical,
        Self::Alert,
        Self::Emergency,
    ];

    /// RFC 5424 severity code: 0 (emergency) through 7 (debug).
    pub fn code(self) -> i32 {
        match self {
            Self::Emergency => 0,
            Self::Alert     => 1,
            Self::Critical  => 2,
            Self::Error     => 3,
            Self::Warn      => 4,
            Self::Notice    => 5,
            Self::Info      => 6,
            Self::Debug     => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug     => "DEBUG",
            Self::Info      => "INFO",
            Self::Notice    => "NOTICE",
            Self::Warn      => "WARN",
            Self::Error     => "ERROR",
            Self::Critical  => "CRITICAL",
            Self::Alert     => "ALERT",
            Self::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for Level {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self, Error> {
        Self::ALL.into_iter()
            .find(|l| l.code() == code)
            .ok_or_else(|| Error::InvalidLevel(code.to_string()))
    }
}

/// Case-insensitive level name; `warning` is accepted for `Warn`.
impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "WARNING" {
            return Ok(Self::Warn);
        }
        Self::ALL.into_iter()
            .find(|l| l.as_str() == upper)
            .ok_or_else(|| Error::InvalidLevel(s.to_owned()))
    }
}

impl TryFrom<&str> for Level {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Error> {
        s.parse()
    }
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// A log sink. Returns whether the message was stored.
pub trait Writer {
    fn write(&mut self, message: &str, level: Level) -> bool;
}

impl<F> Writer for F
where
    F: FnMut(&str, Level) -> bool,
{
    fn write(&mut self, message: &str, level: Level) -> bool {
        self(message, level)
    }
}

/// Forwards messages to the `tracing` subscriber installed by the host.
///
/// `Notice` maps to `INFO`; `Critical`, `Alert` and `Emergency` map to
/// `ERROR` with the original severity kept in the `severity` field.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingWriter;

impl Writer for TracingWriter {
    fn write(&mut self, message: &str, level: Level) -> bool {
        let severity = level.as_str();
        match level {
            Level::Debug => tracing::debug!(severity, "{message}"),
            Level::Info | Level::Notice => tracing::info!(severity, "{message}"),
            Level::Warn => tracing::warn!(severity, "{message}"),
            Level::Error | Level::Critical | Level::Alert | Level::Emergency => {
                tracing::error!(severity, "{message}")
            }
        }
        true
    }
}

// ── Logger ────────────────────────────────────────────────────────────────────

/// Threshold-gated logger around one [`Writer`].
///
/// Enabled by default with a `Debug` threshold, so everything passes until
/// configured otherwise.
pub struct Logger<W> {
    writer: W,
    enabled: bool,
    level: Level,
}

impl<W: Writer> Logger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, enabled: true, level: Level::Debug }
    }

    pub fn is_enabled(&self) -> bool { self.enabled }
    pub fn set_enabled(&mut self, enabled: bool) { self.enabled = enabled; }
    pub fn level(&self) -> Level { self.level }

    /// Sets the threshold. Accepts a [`Level`], a severity code or a level
    /// name; an invalid value leaves the threshold unchanged.
    pub fn set_level<T>(&mut self, level: T) -> Result<(), Error>
    where
        T: TryInto<Level>,
        Error: From<T::Error>,
    {
        self.level = level.try_into()?;
        Ok(())
    }

    pub fn writer(&self) -> &W { &self.writer }
    pub fn writer_mut(&mut self) -> &mut W { &mut self.writer }

    /// Replaces the sink and returns the previous one.
    pub fn set_writer(&mut self, writer: W) -> W {
        std::mem::replace(&mut self.writer, writer)
    }

    /// Whether a message at `level` would currently be written.
    pub fn passes(&self, level: Level) -> bool {
        self.enabled && level >= self.level
    }

    pub fn log(&mut self, level: Level, message: &str) -> bool {
        self.log_with(level, message, &[])
    }

    /// Writes `message` after replacing each `{name}` placeholder found in
    /// `context`. Unknown placeholders stay verbatim.
    pub fn log_with(&mut self, level: Level, message: &str, context: &[(&str, &str)]) -> bool {
        if !self.passes(level) {
            return false;
        }
        let message = interpolate(message, context);
        self.writer.write(&message, level)
    }

    pub fn debug(&mut self, message: &str) -> bool { self.log(Level::Debug, message) }
    pub fn info(&mut self, message: &str) -> bool { self.log(Level::Info, message) }
    pub fn notice(&mut self, message: &str) -> bool { self.log(Level::Notice, message) }
    pub fn warn(&mut self, message: &str) -> bool { self.log(Level::Warn, message) }
    pub fn error(&mut self, message: &str) -> bool { self.log(Level::Error, message) }
    pub fn critical(&mut self, message: &str) -> bool { self.log(Level::Critical, message) }
    pub fn alert(&mut self, message: &str) -> bool { self.log(Level::Alert, message) }
    pub fn emergency(&mut self, message: &str) -> bool { self.log(Level::Emergency, message) }

    pub fn debug_with(&mut self, message: &str, context: &[(&str, &str)]) -> bool {
        self.log_with(Level::Debug, message, context)
    }
    pub fn info_with(&mut self, message: &str, context: &[(&str, &str)]) -> bool {
        self.log_with(Level::Info, message, context)
    }
    pub fn notice_with(&mut self, message: &str, context: &[(&str, &str)]) -> bool {
        self.log_with(Level::Notice, message, context)
    }
    pub fn warn_with(&mut self, message: &str, context: &[(&str, &str)]) -> bool {
        self.log_with(Level::Warn, message, context)
    }
    pub fn error_with(&mut self, message: &str, context: &[(&str, &str)]) -> bool {
        self.log_with(Level::Error, message, context)
    }
    pub fn critical_with(&mut self, message: &str, context: &[(&str, &str)]) -> bool {
        self.log_with(Level::Critical, message, context)
    }
    pub fn alert_with(&mut self, message: &str, context: &[(&str, &str)]) -> bool {
        self.log_with(Level::Alert, message, context)
    }
    pub fn emergency_with(&mut self, message: &str, context: &[(&str, &str)]) -> bool {
        self.log_with(Level::Emergency, message, context)
    }
}

impl<W: fmt::Debug> fmt::Debug for Logger<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("writer", &self.writer)
            .field("enabled", &self.enabled)
            .field("level", &self.level)
            .finish()
    }
}

fn interpolate(template: &str, context: &[(&str, &str)]) -> String {
    if context.is_empty() {
        return template.to_owned();
    }
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find(['{', '}']).filter(|&i| after.as_bytes()[i] == b'}') else {
            out.push('{');
            rest = after;
            continue;
        };
        let name = &after[..close];
        match context.iter().find(|(k, _)| *k == name) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        lines: Vec<(String, Level)>,
    }

    impl Writer for Recorder {
        fn write(&mut self, message: &str, level: Level) -> bool {
            self.lines.push((message.to_owned(), level));
            true
        }
    }

    fn logger() -> Logger<Recorder> {
        Logger::new(Recorder::default())
    }

    #[test]
    fn enabled_by_default() {
        let mut log = logger();
        assert!(log.is_enabled());
        log.set_enabled(false);
        assert!(!log.is_enabled());
        assert!(!log.emergency("down"));
        assert!(log.writer().lines.is_empty());
    }

    #[test]
    fn default_threshold_is_debug() {
        let mut log = logger();
        assert_eq!(log.level(), Level::Debug);
        assert!(log.debug("Debug"));
        assert_eq!(log.writer().lines, [("Debug".to_owned(), Level::Debug)]);
    }

    #[test]
    fn each_level_is_filtered_by_the_next() {
        for pair in Level::ALL.windows(2) {
            let (below, threshold) = (pair[0], pair[1]);
            let mut log = logger();
            log.set_level(threshold).unwrap();
            assert!(!log.log(below, "x"), "{below} passed threshold {threshold}");
            assert!(log.log(threshold, "y"));
            assert_eq!(log.writer().lines.len(), 1);
        }
    }

    #[test]
    fn warn_threshold_filters_info_not_error() {
        let mut log = logger();
        log.set_level(Level::Warn).unwrap();
        assert!(!log.info("Info"));
        assert!(log.error("Error"));
        assert_eq!(log.writer().lines, [("Error".to_owned(), Level::Error)]);
    }

    #[test]
    fn invalid_levels_leave_threshold_alone() {
        let mut log = logger();
        log.set_level(Level::Warn).unwrap();
        assert!(matches!(log.set_level(-1), Err(Error::InvalidLevel(_))));
        assert!(matches!(log.set_level(8), Err(Error::InvalidLevel(_))));
        assert!(log.set_level("verbose").is_err());
        assert_eq!(log.level(), Level::Warn);
    }

    #[test]
    fn levels_from_codes_and_names() {
        let mut log = logger();
        log.set_level(3).unwrap();
        assert_eq!(log.level(), Level::Error);
        log.set_level("warning").unwrap();
        assert_eq!(log.level(), Level::Warn);
        assert_eq!("critical".parse::<Level>().unwrap(), Level::Critical);
    }

    #[test]
    fn interpolates_placeholders() {
        let mut log = logger();
        assert!(log.log_with(Level::Debug, "Hello {framework} !", &[("framework", "envreq")]));
        assert_eq!(log.writer().lines[0].0, "Hello envreq !");
    }

    #[test]
    fn level_methods_take_context() {
        let mut log = logger();
        log.set_level(Level::Notice).unwrap();
        let ctx = [("user", "alice")];
        assert!(!log.info_with("{user} logged in", &ctx));
        assert!(log.notice_with("{user} logged in", &ctx));
        assert!(log.warn_with("{user} retried", &ctx));
        assert!(log.emergency_with("{user} {unknown}", &ctx));
        assert_eq!(
            log.writer().lines,
            [
                ("alice logged in".to_owned(), Level::Notice),
                ("alice retried".to_owned(), Level::Warn),
                ("alice {unknown}".to_owned(), Level::Emergency),
            ]
        );
    }

    #[test]
    fn unmatched_placeholders_stay_verbatim() {
        let ctx = [("a", "1")];
        assert_eq!(interpolate("{a} {b} {", &ctx), "1 {b} {");
        assert_eq!(interpolate("{{a}}", &ctx), "{1}");
        assert_eq!(interpolate("no braces", &ctx), "no braces");
        assert_eq!(interpolate("{a}", &[]), "{a}");
    }

    #[test]
    fn swaps_writers() {
        let mut log = logger();
        log.info("first");
        let old = log.set_writer(Recorder::default());
        assert_eq!(old.lines.len(), 1);
        assert!(log.writer().lines.is_empty());
        log.writer_mut().lines.push(("manual".to_owned(), Level::Info));
        assert_eq!(log.writer().lines.len(), 1);
    }

    #[test]
    fn sink_failure_is_reported() {
        let mut log = Logger::new(|_: &str, _: Level| false);
        assert!(!log.error("disk full"));
    }

    #[test]
    fn tracing_writer_accepts_every_level() {
        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        tracing::subscriber::with_default(subscriber, || {
            let mut log = Logger::new(TracingWriter);
            for level in Level::ALL {
                assert!(log.log(level, "through tracing"));
            }
        });
    }
}
