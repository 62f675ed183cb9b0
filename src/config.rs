//! Configuration - `pyobj.toml` / `.pyobjrc`
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [exec]
//! extra_reserved_names = ["__version__"]
//!
//! [json]
//! indent = 2
//!
//! [pretty]
//! indent_width = 4
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// File names searched by [`Config::discover`], in order
pub const CONFIG_FILES: [&str; 2] = ["pyobj.toml", ".pyobjrc"];

static CURRENT: Lazy<RwLock<Arc<Config>>> = Lazy::new(|| RwLock::new(Arc::new(Config::default())));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub exec: ExecConfig,

    #[serde(default)]
    pub json: JsonConfig,

    #[serde(default)]
    pub pretty: PrettyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormatSetting,

    #[serde(default)]
    pub output: LogOutputSetting,

    /// Directory for `output = "file"`
    #[serde(default = "default_log_directory")]
    pub directory: String,

    #[serde(default)]
    pub span_events: bool,

    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutputSetting {
    Stdout,
    #[default]
    Stderr,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Names stripped from execution results on top of the built-in set
    #[serde(default)]
    pub extra_reserved_names: Vec<String>,

    /// Filename reported for program text that did not come from a file
    #[serde(default = "default_filename")]
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonConfig {
    /// Indent used by `json::encode_default`; compact when unset
    #[serde(default)]
    pub indent: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrettyConfig {
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormatSetting::default(),
            output: LogOutputSetting::default(),
            directory: default_log_directory(),
            span_events: false,
            filter: None,
        }
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            extra_reserved_names: Vec::new(),
            filename: default_filename(),
        }
    }
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self {
            indent_width: default_indent_width(),
        }
    }
}

fn default_level() -> String { "warn".to_string() }
fn default_log_directory() -> String { "logs".to_string() }
fn default_filename() -> String { "<string>".to_string() }
fn default_indent_width() -> usize { 4 }

/// Failure to read or parse a config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse(String),
    Serialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read config {}: {}", path.display(), message)
            }
            Self::Parse(message) => write!(f, "failed to parse config: {}", message),
            Self::Serialize(message) => write!(f, "failed to serialize config: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find and load a config file in the current directory or its parents
    pub fn discover() -> Self {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(&dir),
            Err(_) => Self::default(),
        }
    }

    /// Walk up from `start`; the first readable file wins
    pub fn discover_from(start: &Path) -> Self {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            for name in CONFIG_FILES {
                let config_path = dir.join(name);
                if !config_path.exists() {
                    continue;
                }
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(err) => tracing::warn!(%err, "ignoring config file"),
                }
            }
            current = dir.parent().map(|p| p.to_path_buf());
        }

        Self::default()
    }

    /// Default configuration as TOML text
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# failed to generate config"))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Process-wide configuration in effect
pub fn current() -> Arc<Config> {
    CURRENT.read().clone()
}

/// Replace the process-wide configuration
pub fn set(config: Config) {
    *CURRENT.write() = Arc::new(config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pretty.indent_width, 4);
        assert_eq!(config.exec.filename, "<string>");
        assert!(config.exec.extra_reserved_names.is_empty());
        assert_eq!(config.json.indent, None);
        assert_eq!(config.logging.output, LogOutputSetting::Stderr);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"
format = "json"

[exec]
extra_reserved_names = ["__version__"]

[json]
indent = 2

[pretty]
indent_width = 2
"#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormatSetting::Json);
        assert_eq!(config.exec.extra_reserved_names, vec!["__version__".to_string()]);
        assert_eq!(config.exec.filename, "<string>");
        assert_eq!(config.json.indent, Some(2));
        assert_eq!(config.pretty.indent_width, 2);
    }

    #[test]
    fn test_parse_error() {
        let err = Config::parse("[pretty]\nindent_width = \"wide\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/pyobj.toml")).unwrap_err();
        assert!(err.to_string().starts_with("failed to read config"));
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".pyobjrc"), "[pretty]\nindent_width = 8\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested);
        assert_eq!(config.pretty.indent_width, 8);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyobj.toml");
        let mut config = Config::default();
        config.json.indent = Some(3);
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
