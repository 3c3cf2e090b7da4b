//! Arena and logging configuration, loadable from TOML
//!
//! ```toml
//! [arena]
//! max_pages = 256
//! alignment = 16
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::arena::{align_forward, DEFAULT_ALIGNMENT, DEFAULT_MAX_PAGES, HEADER_SIZE};
use crate::error::ArenaError;
use crate::logging::{LogConfig, LogFormat, LogOutput};

/// File name looked up by [`Config::discover`]
pub const CONFIG_FILE_NAME: &str = ".pagearena.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub arena: ArenaConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sizing of a single arena. Validated when the arena is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Reservation size in pages; at least 1
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Alignment of every allocation; a power of two no larger than a page
    #[serde(default = "default_alignment")]
    pub alignment: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Write daily-rotated files here instead of stderr
    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub span_events: bool,

    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            alignment: DEFAULT_ALIGNMENT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            directory: None,
            prefix: default_prefix(),
            span_events: false,
            filter: None,
        }
    }
}

fn default_max_pages() -> usize { DEFAULT_MAX_PAGES }
fn default_alignment() -> usize { DEFAULT_ALIGNMENT }
fn default_level() -> String { "info".to_string() }
fn default_prefix() -> String { "pagearena".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ArenaError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ArenaError::invalid_config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, ArenaError> {
        toml::from_str(content)
            .map_err(|e| ArenaError::invalid_config(format!("failed to parse config: {}", e)))
    }

    /// Find and load `.pagearena.toml` from the current directory or its
    /// parents, falling back to defaults.
    pub fn discover() -> Self {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(&dir),
            Err(_) => Self::default(),
        }
    }

    /// Walk from `start` up through its parents and load the first
    /// `.pagearena.toml` that parses. Malformed files are skipped with a
    /// warning.
    pub fn discover_from(start: &Path) -> Self {
        let mut current = Some(start);

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(err) => {
                        tracing::warn!(path = %config_path.display(), %err, "ignoring config file")
                    }
                }
            }

            current = dir.parent();
        }

        Self::default()
    }
}

impl ArenaConfig {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages,
            ..Self::default()
        }
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Check the settings against the host page size.
    pub fn validate(&self, page_size: usize) -> Result<(), ArenaError> {
        if self.max_pages == 0 {
            return Err(ArenaError::invalid_config("max_pages must be at least 1"));
        }
        if !self.alignment.is_power_of_two() {
            return Err(ArenaError::invalid_config(format!(
                "alignment {} is not a power of two",
                self.alignment
            )));
        }
        if self.alignment > page_size {
            return Err(ArenaError::invalid_config(format!(
                "alignment {} exceeds the page size {}",
                self.alignment, page_size
            )));
        }
        if align_forward(HEADER_SIZE, self.alignment) > page_size {
            return Err(ArenaError::invalid_config(
                "control block does not fit in the first page",
            ));
        }
        Ok(())
    }

    /// Total bytes to reserve, or `None` on overflow
    pub fn reserve_bytes(&self, page_size: usize) -> Option<usize> {
        self.max_pages.checked_mul(page_size)
    }
}

impl LoggingConfig {
    /// Build the subscriber settings for [`crate::logging::init_logging`].
    pub fn to_log_config(&self) -> Result<LogConfig, ArenaError> {
        let level: Level = self.level.parse().map_err(|_| {
            ArenaError::invalid_config(format!("unknown log level {:?}", self.level))
        })?;

        let output = match &self.directory {
            Some(directory) => LogOutput::File {
                directory: directory.clone(),
                prefix: self.prefix.clone(),
            },
            None => LogOutput::Stderr,
        };

        Ok(LogConfig {
            level,
            format: self.format,
            output,
            span_events: self.span_events,
            filter: self.filter.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.arena, ArenaConfig::default());
        assert_eq!(config.arena.max_pages, 10);
        assert_eq!(config.arena.alignment, 16);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn parses_sections() {
        let config = Config::parse(
            r#"
            [arena]
            max_pages = 256
            alignment = 64

            [logging]
            level = "debug"
            format = "json"
            directory = "/var/log/app"
            "#,
        )
        .unwrap();

        assert_eq!(config.arena.max_pages, 256);
        assert_eq!(config.arena.alignment, 64);

        let log = config.logging.to_log_config().unwrap();
        assert_eq!(log.level, Level::DEBUG);
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(
            log.output,
            LogOutput::File {
                directory: "/var/log/app".to_string(),
                prefix: "pagearena".to_string(),
            }
        );
    }

    #[test]
    fn malformed_toml_is_invalid_config() {
        let err = Config::parse("[arena\nmax_pages = 3").unwrap_err();
        assert!(matches!(err, ArenaError::InvalidConfig { .. }));
    }

    #[test]
    fn unknown_level_is_rejected() {
        let logging = LoggingConfig {
            level: "loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(logging.to_log_config().is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(ArenaConfig::new(0).validate(4096).is_err());
        assert!(ArenaConfig::new(4).with_alignment(24).validate(4096).is_err());
        assert!(ArenaConfig::new(4).with_alignment(8192).validate(4096).is_err());
        assert!(ArenaConfig::new(4).validate(4096).is_ok());
        assert!(ArenaConfig::new(4).with_alignment(1).validate(4096).is_ok());
    }

    #[test]
    fn reserve_bytes_detects_overflow() {
        assert_eq!(ArenaConfig::new(10).reserve_bytes(4096), Some(40960));
        assert_eq!(ArenaConfig::new(usize::MAX).reserve_bytes(4096), None);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[arena]\nmax_pages = 32").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.arena.max_pages, 32);
        assert_eq!(config.arena.alignment, DEFAULT_ALIGNMENT);
    }

    #[test]
    fn discover_finds_config_in_ancestor() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(CONFIG_FILE_NAME), "[arena]\nmax_pages = 7\n").unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested);
        assert_eq!(config.arena.max_pages, 7);
    }

    #[test]
    fn discover_skips_malformed_file() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(CONFIG_FILE_NAME), "[arena\nmax_pages = ").unwrap();

        let config = Config::discover_from(root.path());
        assert_eq!(config.arena, ArenaConfig::default());
    }

    #[test]
    fn discover_without_file_uses_defaults() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("empty");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested);
        assert_eq!(config.arena, ArenaConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn missing_file_is_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
