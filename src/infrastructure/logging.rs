//! Logging setup for hosts embedding pyobj
//!
//! The bridge itself only emits `tracing` events; installing a subscriber is
//! the host's choice. This module offers a ready-made one with the usual
//! knobs: level, format, destination, span events and filter directives.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::{LogFormatSetting, LogOutputSetting, LoggingConfig};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line
    Pretty,
    /// One line per event
    Compact,
    /// JSON objects for log shippers
    Json,
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// Daily rolling files `directory/prefix.YYYY-MM-DD`
    File { directory: String, prefix: String },
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Emit span open/close events
    pub span_events: bool,
    /// Extra filter directives (e.g., "pyobj=debug,pyobj_runtime=trace")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Build from the `[logging]` section of a config file
    pub fn from_settings(settings: &LoggingConfig) -> Self {
        let level = settings.level.parse::<Level>().unwrap_or(Level::WARN);
        let format = match settings.format {
            LogFormatSetting::Pretty => LogFormat::Pretty,
            LogFormatSetting::Compact => LogFormat::Compact,
            LogFormatSetting::Json => LogFormat::Json,
        };
        let output = match settings.output {
            LogOutputSetting::Stdout => LogOutput::Stdout,
            LogOutputSetting::Stderr => LogOutput::Stderr,
            LogOutputSetting::File => LogOutput::File {
                directory: settings.directory.clone(),
                prefix: "pyobj".to_string(),
            },
        };
        Self {
            level,
            format,
            output,
            span_events: settings.span_events,
            filter: settings.filter.clone(),
        }
    }
}

/// Install the global subscriber
///
/// Returns the `WorkerGuard` of the non-blocking writer; keep it alive for as
/// long as logs should be flushed. Only the first call installs anything;
/// later calls (or a subscriber installed elsewhere) yield `None`.
pub fn init_logging(config: LogConfig) -> Option<WorkerGuard> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return None;
    }

    let (installed, guard) = match &config.output {
        LogOutput::Stdout => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            (install(writer, &config), guard)
        }
        LogOutput::Stderr => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            (install(writer, &config), guard)
        }
        LogOutput::File { directory, prefix } => {
            let appender = rolling::daily(directory, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (install(writer, &config), guard)
        }
    };

    if installed {
        tracing::debug!(level = %config.level, format = ?config.format, "logging initialized");
        Some(guard)
    } else {
        None
    }
}

/// Whether `init_logging` has run in this process
pub fn is_logging_initialized() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}

fn install<W>(writer: W, config: &LogConfig) -> bool
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = build_filter(config);
    let spans = span_events_config(config.span_events);
    let base = fmt::layer().with_writer(writer).with_span_events(spans);

    let result = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(base.pretty().with_filter(filter))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(base.compact().with_filter(filter))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(base.json().with_filter(filter))
            .try_init(),
    };
    result.is_ok()
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let base_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    match &config.filter {
        Some(filter_str) => filter_str
            .split(',')
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .fold(base_filter, |filter, directive| {
                filter.add_directive(directive.parse().unwrap_or_else(|_| {
                    tracing::warn!("invalid filter directive: {}", directive);
                    config.level.into()
                }))
            }),
        None => base_filter,
    }
}

fn span_events_config(enabled: bool) -> FmtSpan {
    if enabled {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// Verbose stderr logging for development
pub fn init_dev_logging() -> Option<WorkerGuard> {
    init_logging(LogConfig {
        level: Level::DEBUG,
        format: LogFormat::Pretty,
        output: LogOutput::Stderr,
        span_events: true,
        filter: Some("pyobj=debug,pyobj_runtime=debug".to_string()),
    })
}

/// JSON logs to daily files under `log_dir`
pub fn init_file_logging(log_dir: impl AsRef<Path>) -> Option<WorkerGuard> {
    init_logging(LogConfig {
        level: Level::INFO,
        format: LogFormat::Json,
        output: LogOutput::File {
            directory: log_dir.as_ref().to_string_lossy().to_string(),
            prefix: "pyobj".to_string(),
        },
        span_events: false,
        filter: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = LogConfig::new()
            .with_level(Level::DEBUG)
            .with_format(LogFormat::Json)
            .with_span_events(true)
            .with_filter("pyobj=trace");

        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.span_events);
        assert_eq!(config.filter, Some("pyobj=trace".to_string()));
    }

    #[test]
    fn test_from_settings() {
        let settings = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormatSetting::Json,
            output: LogOutputSetting::File,
            directory: "logs".to_string(),
            span_events: false,
            filter: None,
        };
        let config = LogConfig::from_settings(&settings);
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(
            config.output,
            LogOutput::File {
                directory: "logs".to_string(),
                prefix: "pyobj".to_string()
            }
        );
    }

    #[test]
    fn test_bad_level_falls_back_to_warn() {
        let settings = LoggingConfig {
            level: "loud".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(LogConfig::from_settings(&settings).level, Level::WARN);
    }
}
