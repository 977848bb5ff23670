//! Line encoders for the rotating logger.

use std::backtrace::Backtrace;
use std::fmt;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::{LevelStyle, LogFormat, LogLevel};
use crate::config::LoggerConfig;

const TIME_LAYOUT: &str = "%Y/%m/%d - %H:%M:%S%.3f";

const MESSAGE_KEY: &str = "message";
const LEVEL_KEY: &str = "level";
const TIME_KEY: &str = "time";
const NAME_KEY: &str = "logger";
const CALLER_KEY: &str = "caller";

/// Formats events as JSON objects or tab separated text.
///
/// Every line carries the timestamp, level and message. The call site and a
/// captured backtrace are added when configured.
#[derive(Debug, Clone)]
pub struct EventFormatter {
    format: LogFormat,
    level_style: LevelStyle,
    time_format: String,
    show_caller: bool,
    stacktrace_key: String,
    stacktrace_level: Option<Level>,
}

impl EventFormatter {
    pub fn new(config: &LoggerConfig) -> Self {
        Self {
            format: config.format,
            level_style: config.level_style,
            time_format: time_format(&config.prefix),
            show_caller: config.show_line,
            stacktrace_key: config.stacktrace_key.clone(),
            stacktrace_level: stacktrace_threshold(config.level),
        }
    }

    fn wants_stacktrace(&self, level: Level) -> bool {
        // tracing orders levels by verbosity, so "at least as severe" is `<=`
        self.stacktrace_level
            .is_some_and(|threshold| level <= threshold)
    }

    fn write_json(&self, writer: &mut Writer<'_>, line: Line) -> fmt::Result {
        let mut object = line.fields;
        object.insert(TIME_KEY.into(), Value::from(line.time));
        object.insert(
            LEVEL_KEY.into(),
            Value::from(self.level_style.without_color().render(line.level)),
        );
        object.insert(NAME_KEY.into(), Value::from(line.target));
        if let Some(caller) = line.caller {
            object.insert(CALLER_KEY.into(), Value::from(caller));
        }
        object.insert(
            MESSAGE_KEY.into(),
            Value::from(line.message.unwrap_or_default()),
        );
        if let Some(trace) = line.stacktrace {
            object.insert(self.stacktrace_key.clone(), Value::from(trace));
        }

        let encoded = serde_json::to_string(&Value::Object(object)).map_err(|_| fmt::Error)?;
        writeln!(writer, "{encoded}")
    }

    fn write_text(&self, writer: &mut Writer<'_>, line: Line) -> fmt::Result {
        write!(
            writer,
            "{}\t{}",
            line.time,
            self.level_style.render(line.level)
        )?;
        if let Some(caller) = line.caller {
            write!(writer, "\t{caller}")?;
        }
        write!(writer, "\t{}", line.message.unwrap_or_default())?;
        if !line.fields.is_empty() {
            write!(writer, "\t{}", Value::Object(line.fields))?;
        }
        writeln!(writer)?;
        if let Some(trace) = line.stacktrace {
            writeln!(writer, "{trace}")?;
        }
        Ok(())
    }
}

impl<S, N> FormatEvent<S, N> for EventFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let line = Line {
            time: chrono::Local::now().format(&self.time_format).to_string(),
            level: *meta.level(),
            target: meta.target(),
            caller: if self.show_caller { caller(meta) } else { None },
            message: collector.message,
            fields: collector.fields,
            stacktrace: self
                .wants_stacktrace(*meta.level())
                .then(|| Backtrace::force_capture().to_string()),
        };

        match self.format {
            LogFormat::Json => self.write_json(&mut writer, line),
            LogFormat::Text => self.write_text(&mut writer, line),
        }
    }
}

impl LevelStyle {
    /// Renders `level` in this style. Color variants wrap the name in ANSI codes.
    pub fn render(self, level: Level) -> String {
        let name = match self {
            Self::Lowercase | Self::LowercaseColor => level.as_str().to_lowercase(),
            Self::Capital | Self::CapitalColor => level.as_str().to_uppercase(),
        };

        match self {
            Self::LowercaseColor | Self::CapitalColor => {
                format!("\x1b[{}m{}\x1b[0m", level_color(level), name)
            }
            Self::Lowercase | Self::Capital => name,
        }
    }

    /// The same style with color stripped.
    pub fn without_color(self) -> Self {
        match self {
            Self::LowercaseColor => Self::Lowercase,
            Self::CapitalColor => Self::Capital,
            other => other,
        }
    }
}

struct Line {
    time: String,
    level: Level,
    target: &'static str,
    caller: Option<String>,
    message: Option<String>,
    fields: Map<String, Value>,
    stacktrace: Option<String>,
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == MESSAGE_KEY {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}

/// Backtraces are attached only when the minimum level is `debug` or `error`.
fn stacktrace_threshold(level: LogLevel) -> Option<Level> {
    match level {
        LogLevel::Debug | LogLevel::Error => Some(level.into()),
        _ => None,
    }
}

/// chrono layout for `prefix` followed by the fixed timestamp layout.
fn time_format(prefix: &str) -> String {
    format!("{}{}", prefix.replace('%', "%%"), TIME_LAYOUT)
}

fn caller(meta: &Metadata<'_>) -> Option<String> {
    match (meta.file(), meta.line()) {
        (Some(file), Some(line)) => Some(format!("{file}:{line}")),
        (Some(file), None) => Some(file.to_string()),
        _ => None,
    }
}

fn level_color(level: Level) -> u8 {
    if level == Level::TRACE {
        36
    } else if level == Level::DEBUG {
        35
    } else if level == Level::INFO {
        34
    } else if level == Level::WARN {
        33
    } else {
        31
    }
}
