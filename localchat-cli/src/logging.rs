use std::path::{Path, PathBuf};
use std::fmt;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt::format::FmtSpan, layer::{Layered, SubscriberExt}, util::SubscriberInitExt,
    fmt::{format::Writer, writer::BoxMakeWriter, FormatEvent, FormatFields},
    registry::LookupSpan,
};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing::{Event, Subscriber};

use crate::error::CliError;

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Colors events by target so request, stream and skip events stand out
struct ColoredFormatter;

impl<S, N> FormatEvent<S, N> for ColoredFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let (target_color, message_color) = match metadata.target() {
            "llm::request" => ("\x1b[38;5;51m", ""),  // cyan
            "llm::stream" => ("\x1b[38;5;82m", ""),   // lime
            "render::skip" => ("\x1b[38;5;208m", ""), // orange
            _ => ("\x1b[2m", "\x1b[2m"),
        };

        let level_color = match *metadata.level() {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            tracing::Level::DEBUG => "\x1b[34m",
            tracing::Level::TRACE => "\x1b[35m",
        };

        write!(writer, "{} ", chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"))?;
        write!(writer, "{}{:5}\x1b[0m ", level_color, metadata.level())?;
        write!(writer, "{}[{}]\x1b[0m ", target_color, metadata.target())?;
        write!(writer, "{}", message_color)?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer, "\x1b[0m")?;

        Ok(())
    }
}

/// Logging configuration for the demo binaries.
///
/// Console logs always go to stderr: stdout carries only model output.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "debug", "info", "warn", "error", "off")
    pub level: String,
    /// Optional file path for log output. If None, logs to stderr
    pub file_path: Option<PathBuf>,
    /// Whether to include span open/close events
    pub include_spans: bool,
    /// JSON format instead of human-readable
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "off".to_string(),
            file_path: None,
            include_spans: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Create config from LOCALCHAT_LOG_* environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        Self {
            level: lookup("LOCALCHAT_LOG_LEVEL").unwrap_or_else(|| "off".to_string()),
            file_path: lookup("LOCALCHAT_LOG_FILE").map(PathBuf::from),
            include_spans: lookup("LOCALCHAT_LOG_SPANS").map(|v| v == "true").unwrap_or(false),
            json_format: lookup("LOCALCHAT_LOG_JSON").map(|v| v == "true").unwrap_or(false),
        }
    }

    pub fn level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    pub fn file_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.include_spans = enable;
        self
    }

    pub fn json_format(mut self, enable: bool) -> Self {
        self.json_format = enable;
        self
    }

    fn filter(&self) -> Result<EnvFilter, CliError> {
        let directives = [
            "warn".to_string(),
            format!("localchat_llm={}", self.level),
            format!("localchat_cli={}", self.level),
            format!("llm={}", self.level),
            format!("render={}", self.level),
        ];

        let mut filter = EnvFilter::from_default_env();
        for directive in directives {
            let directive = directive
                .parse()
                .map_err(|e| CliError::Logging(format!("invalid log directive '{}': {}", directive, e)))?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }

    /// Filter for the configured level; an unparsable level turns our logs off
    fn filter_or_off(&self) -> EnvFilter {
        match self.filter() {
            Ok(filter) => filter,
            Err(error) => {
                eprintln!("{}; logging disabled", error);
                EnvFilter::new("warn,localchat_llm=off,localchat_cli=off,llm=off,render=off")
            }
        }
    }

    fn layer(&self) -> Result<BoxedLayer, CliError> {
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let writer = match &self.file_path {
            Some(path) => {
                let file_appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .filename_prefix(
                        path.file_name()
                            .and_then(|name| name.to_str())
                            .unwrap_or("localchat.log"),
                    )
                    .build(path.parent().unwrap_or_else(|| Path::new(".")))
                    .map_err(|e| CliError::Logging(format!("cannot open log file {}: {}", path.display(), e)))?;
                BoxMakeWriter::new(file_appender)
            }
            None => BoxMakeWriter::new(std::io::stderr),
        };

        let layer = tracing_subscriber::fmt::layer::<Layered<EnvFilter, Registry>>()
            .with_writer(writer)
            .with_span_events(span_events);

        // colors only on the console; files stay plain
        let layer: BoxedLayer = match (self.json_format, self.file_path.is_some()) {
            (true, _) => Box::new(layer.json()),
            (false, true) => Box::new(layer.with_ansi(false)),
            (false, false) => Box::new(layer.event_format(ColoredFormatter).with_ansi(true)),
        };
        Ok(layer)
    }

    /// Initialize the global tracing subscriber.
    /// Fails if a subscriber is already set or the log file cannot be opened.
    pub fn init(self) -> Result<(), CliError> {
        let layer = self.layer()?;

        tracing_subscriber::registry()
            .with(self.filter_or_off())
            .with(layer)
            .try_init()
            .map_err(|_| CliError::Logging("subscriber already set".to_string()))
    }

    /// Like `init`, but reports failures on stderr instead of returning them
    /// so logging setup never decides whether a run succeeds.
    pub fn init_or_warn(self) {
        if let Err(error) = self.init() {
            eprintln!("{}; continuing without logging", error);
        }
    }
}
