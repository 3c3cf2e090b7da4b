//! Logging for pagearena
//!
//! Arena operations emit `tracing` events under the `pagearena::region` and
//! `pagearena::arena` targets. Nothing is printed unless the application
//! installs a subscriber, for example through [`init_logging`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with timestamps
    Pretty,
    /// Compact format for production
    #[default]
    Compact,
    /// JSON format for structured logging
    Json,
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// File with daily rotation
    File { directory: String, prefix: String },
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Whether to include span events
    pub span_events: bool,
    /// Custom filter directives (e.g., "pagearena=trace")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
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
}

/// Install a global subscriber for `config`.
///
/// Returns the writer guard; keep it alive until the program exits so
/// buffered lines get flushed. If a subscriber is already installed this
/// leaves it in place.
pub fn init_logging(config: LogConfig) -> Option<WorkerGuard> {
    let (writer, guard) = match &config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogOutput::File { directory, prefix } => {
            tracing_appender::non_blocking(rolling::daily(directory, prefix))
        }
    };

    install(writer, &config);
    Some(guard)
}

fn install<W>(writer: W, config: &LogConfig)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = build_filter(config);
    let spans = span_events_config(config.span_events);
    let registry = tracing_subscriber::registry();

    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .pretty()
                    .with_span_events(spans)
                    .with_filter(filter),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .compact()
                    .with_span_events(spans)
                    .with_filter(filter),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .json()
                    .with_span_events(spans)
                    .with_filter(filter),
            )
            .try_init(),
    };

    // Ignore error if already initialized
    installed.ok();
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let base_filter = EnvFilter::from_default_env().add_directive(config.level.into());

    match &config.filter {
        Some(filter_str) => filter_str.split(',').fold(base_filter, |filter, directive| {
            filter.add_directive(directive.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid filter directive: {}", directive);
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

/// Initialize logging with defaults for development
pub fn init_dev_logging() -> Option<WorkerGuard> {
    init_logging(LogConfig {
        level: Level::DEBUG,
        format: LogFormat::Pretty,
        output: LogOutput::Stderr,
        span_events: true,
        filter: Some("pagearena=trace".to_string()),
    })
}

/// Initialize logging with defaults for production
pub fn init_prod_logging(log_dir: impl AsRef<Path>) -> Option<WorkerGuard> {
    init_logging(LogConfig {
        level: Level::INFO,
        format: LogFormat::Json,
        output: LogOutput::File {
            directory: log_dir.as_ref().to_string_lossy().to_string(),
            prefix: "pagearena".to_string(),
        },
        span_events: false,
        filter: Some("pagearena=info".to_string()),
    })
}

/// Log a fresh reservation
#[inline]
pub fn log_reserve(bytes: usize, base: *const u8) {
    tracing::debug!(
        target: "pagearena::region",
        bytes,
        base = ?base,
        "reserved address space"
    );
}

/// Log pages committed in `[offset, end)`
#[inline]
pub fn log_commit(offset: usize, end: usize) {
    tracing::trace!(
        target: "pagearena::region",
        offset,
        end,
        "committed pages"
    );
}

/// Log the release of a whole reservation
#[inline]
pub fn log_release(bytes: usize, base: *const u8) {
    tracing::debug!(
        target: "pagearena::region",
        bytes,
        base = ?base,
        "released address space"
    );
}

/// Log arena bootstrap
#[inline]
pub fn log_arena_created(page_size: usize, max_pages: usize, start: usize) {
    tracing::debug!(
        target: "pagearena::arena",
        page_size,
        max_pages,
        start,
        "arena created"
    );
}

/// Log a push at `offset`
#[inline]
pub fn log_push(offset: usize, size: usize) {
    tracing::trace!(
        target: "pagearena::arena",
        offset,
        size,
        "pushed"
    );
}

/// Log a cursor move from `from` back to `to`
#[inline]
pub fn log_rewind(from: usize, to: usize) {
    tracing::trace!(
        target: "pagearena::arena",
        from,
        to,
        "cursor moved"
    );
}
