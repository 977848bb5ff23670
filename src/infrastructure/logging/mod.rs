//! Rotating structured logger.
//!
//! [`Logger::init`] turns a [`LoggerConfig`] into a [`tracing::Dispatch`] that
//! writes one line per event to a daily-rotated file, optionally teed to
//! standard output. The handle is returned to the caller instead of being
//! stored globally; call [`Logger::install_global`] once at startup to make it
//! the process default.
//!
//! Initialization never fails. If the log directory or the file sink cannot be
//! created the problem is printed to standard output and the logger falls back
//! to console-only output (or discards events when console output is off).

mod format;
mod sink;

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use serde::Deserialize;
use tracing::dispatcher::{DefaultGuard, SetGlobalDefaultError};
use tracing::{Dispatch, Level};
use tracing_subscriber::Registry;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;

use crate::config::LoggerConfig;

pub use format::EventFormatter;
pub use sink::{LOG_FILE_SUFFIX, RETAINED_FILES, RotatingFile, file_name_for};

/// Minimum severity accepted by the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        LevelFilter::from_level(value.into())
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, <LogLevel as TryFrom<String>>::Error> {
        value.parse()
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "invalid log level '{s}', use trace, debug, info, warn or error"
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line encoding of the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Tab separated `time level [caller] message [fields]`.
    Text,
}

impl TryFrom<String> for LogFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "console" => Ok(Self::Text),
            _ => Err(format!("invalid log format '{s}', use text or json")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Text => "text",
        })
    }
}

/// How the level column is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LevelStyle {
    Lowercase,
    LowercaseColor,
    Capital,
    CapitalColor,
}

impl TryFrom<String> for LevelStyle {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for LevelStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.trim_end_matches("levelencoder") {
            "lowercase" => Ok(Self::Lowercase),
            "lowercasecolor" => Ok(Self::LowercaseColor),
            "capital" => Ok(Self::Capital),
            "capitalcolor" => Ok(Self::CapitalColor),
            _ => Err(format!(
                "invalid level style '{s}', use lowercase, lowercase-color, capital or capital-color"
            )),
        }
    }
}

/// Handle to a configured logger.
///
/// Cloning is cheap; all clones share the same sink.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
    config: LoggerConfig,
    degraded: bool,
}

impl Logger {
    /// Builds the logger described by `config`.
    ///
    /// Creates `config.dir` if it does not exist. Errors while creating the
    /// directory or the rotating sink are printed to standard output and the
    /// returned logger reports [`is_degraded`](Self::is_degraded).
    pub fn init(config: &LoggerConfig) -> Self {
        let mut degraded = false;

        if let Err(e) = ensure_dir(&config.dir) {
            println!("create {} directory failed: {}", config.dir.display(), e);
            degraded = true;
        }

        let (writer, sink_degraded) = build_writer(config);

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .event_format(EventFormatter::new(config));

        let subscriber = Registry::default()
            .with(LevelFilter::from(config.level))
            .with(layer);

        Self {
            dispatch: Dispatch::new(subscriber),
            config: config.clone(),
            degraded: degraded || sink_degraded,
        }
    }

    /// The underlying dispatcher, for callers wiring it up themselves.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// `true` when the file sink could not be set up.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Runs `f` with this logger as the thread's default subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Makes this logger the thread's default until the guard is dropped.
    pub fn set_default(&self) -> DefaultGuard {
        tracing::dispatcher::set_default(&self.dispatch)
    }

    /// Makes this logger the process-wide default subscriber.
    ///
    /// # Errors
    ///
    /// Fails if a global default has already been installed.
    pub fn install_global(&self) -> Result<(), SetGlobalDefaultError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
    }
}

/// Shorthand for [`Logger::init`].
pub fn init_logger(config: &LoggerConfig) -> Logger {
    Logger::init(config)
}

fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    println!("create {} directory", dir.display());
    // create_dir_all treats a directory created concurrently by someone else as success
    fs::create_dir_all(dir)
}

/// Returns the writer and whether it is a fallback.
fn build_writer(config: &LoggerConfig) -> (BoxMakeWriter, bool) {
    let file = match RotatingFile::new(&config.dir, &config.link_name) {
        Ok(file) => Some(Mutex::new(file)),
        Err(e) => {
            println!("create rotating log file in {} failed: {}", config.dir.display(), e);
            None
        }
    };

    match (file, config.log_in_console) {
        (Some(file), true) => (BoxMakeWriter::new(file.and(io::stdout)), false),
        (Some(file), false) => (BoxMakeWriter::new(file), false),
        (None, true) => (BoxMakeWriter::new(io::stdout), true),
        (None, false) => (BoxMakeWriter::new(io::sink), true),
    }
}
