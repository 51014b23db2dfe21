//! Telemetry and tracing utilities
//!
//! Opt-in helpers for installing a `tracing` subscriber. The library itself
//! only emits events; applications decide whether and how to collect them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use vertex_imagen::observability::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use crate::error::LlmError;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON, one object per line
    Json,
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Build from `VERTEX_IMAGEN_LOG_LEVEL`, `VERTEX_IMAGEN_LOG_FORMAT` and `VERTEX_IMAGEN_LOG_FILE`.
    pub fn from_env() -> Result<Self, LlmError> {
        let mut builder = Self::builder();
        if let Ok(level) = std::env::var("VERTEX_IMAGEN_LOG_LEVEL") {
            builder = builder.log_level_str(&level)?;
        }
        if let Ok(format) = std::env::var("VERTEX_IMAGEN_LOG_FORMAT") {
            let output_format = match format.to_lowercase().as_str() {
                "json" => OutputFormat::Json,
                "text" => OutputFormat::Text,
                _ => {
                    return Err(LlmError::ConfigurationError(format!(
                        "Invalid log format: {format}. Valid options: text, json"
                    )));
                }
            };
            builder = builder.output_format(output_format);
        }
        if let Ok(path) = std::env::var("VERTEX_IMAGEN_LOG_FILE") {
            builder = builder.log_file(PathBuf::from(path));
        }
        Ok(builder.build())
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, LlmError> {
        let level = level.trim().parse::<tracing::Level>().map_err(|_| {
            LlmError::ConfigurationError(format!(
                "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
            ))
        })?;
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            log_file: self.log_file,
        }
    }
}

/// `RUST_LOG` when set and valid, otherwise the configured level for this crate.
fn level_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.to_string().to_lowercase();
        EnvFilter::new(format!("vertex_imagen={level}"))
    })
}

fn install<W>(config: &SubscriberConfig, writer: W) -> Result<(), LlmError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(level_filter(config.log_level))
        .with_target(true)
        .with_writer(writer);
    let result = match config.output_format {
        OutputFormat::Json => builder.json().try_init(),
        OutputFormat::Text => builder.try_init(),
    };
    match result {
        Ok(()) => Ok(()),
        // Already initialized by the host application
        Err(e) if e.to_string().contains("already been set") => Ok(()),
        Err(e) => Err(LlmError::ConfigurationError(format!(
            "Failed to initialize tracing: {e}"
        ))),
    }
}

/// Initialize the global tracing subscriber.
///
/// Returns a guard when logging to a file; keep it alive for the duration of
/// the program so buffered lines are flushed.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, LlmError> {
    match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().ok_or_else(|| {
                LlmError::ConfigurationError(format!("Invalid log file path: {}", path.display()))
            })?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            install(&config, writer)?;
            Ok(Some(guard))
        }
        None => {
            install(&config, std::io::stderr)?;
            Ok(None)
        }
    }
}

/// Initialize tracing subscriber from environment variables.
pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::from_env()?)
}
