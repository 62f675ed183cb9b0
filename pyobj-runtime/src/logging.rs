//! Logging infrastructure - structured tracing throughout the runtime
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable log level via environment
//! - Zero-cost when disabled
//! - Structured `event = ...` fields for heap, call and lifecycle events

use once_cell::sync::OnceCell;
use std::io;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub(crate) use tracing::{debug, info, trace, warn};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // PYOBJ_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("PYOBJ_LOG_LEVEL") {
            config.level = parse_level(&level_str);
        }

        // PYOBJ_LOG_JSON: enable JSON format
        config.json_format = std::env::var("PYOBJ_LOG_JSON").is_ok();

        // PYOBJ_LOG_SPANS: show span events
        config.show_spans = std::env::var("PYOBJ_LOG_SPANS").is_ok();

        config
    }

    /// Verbose logging for debugging the heap
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            json_format: false,
            show_spans: true,
        }
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Safe to call more than once, and safe to call after the host process has
/// installed its own subscriber (the runtime's subscriber is then skipped).
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "pyobj_runtime={}",
                config.level.as_str().to_lowercase()
            ))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let result = if config.json_format {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_span_events(span_events),
                )
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_span_events(span_events)
                        .with_target(true)
                        .with_line_number(cfg!(debug_assertions)),
                )
                .try_init()
        };
        if result.is_err() {
            debug!("global subscriber already installed, runtime logging skipped");
        }
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

/// Log runtime initialization
pub(crate) fn log_runtime_init(epoch: u32) {
    info!(event = "runtime_init", epoch, "pyobj runtime initializing");
}

/// Log runtime shutdown
pub(crate) fn log_runtime_shutdown(epoch: u32, live: usize) {
    info!(
        event = "runtime_shutdown",
        epoch,
        live_objects = live,
        "pyobj runtime shutting down"
    );
}

/// Log a call into a runtime callable
#[inline]
pub(crate) fn log_call(name: &str, arg_count: usize) {
    trace!(event = "call", function = name, args = arg_count);
}

/// Log a failure surfaced through the api
pub(crate) fn log_runtime_error(op: &str, error: &str) {
    debug!(event = "runtime_error", op, error, "runtime operation failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json_format);

        let debug_config = LogConfig::debug();
        assert_eq!(debug_config.level, Level::TRACE);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }

    #[test]
    fn test_init_idempotent() {
        init();
        init(); // Should not panic
        assert!(is_initialized());
    }
}
