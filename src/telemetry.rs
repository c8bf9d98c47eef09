//! Telemetry and tracing utilities
//!
//! The library only emits `tracing` events. Embedding applications that do
//! not install their own subscriber can use [`init_subscriber`] or
//! [`init_from_env`].
//!
//! ```rust,ignore
//! use assay_insight::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AssistantError;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    Json,
    /// Single-line JSON without span lists
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" | "json_compact" => Ok(Self::JsonCompact),
            other => Err(AssistantError::ConfigurationError(format!(
                "Invalid log format: {other}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to stdout when no log file is set
    pub enable_console: bool,
    /// Append logs to this file instead of stdout
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// JSON at WARN into a file, for the deployed dashboard.
    pub fn production(log_file: PathBuf) -> Self {
        Self {
            log_level: tracing::Level::WARN,
            output_format: OutputFormat::Json,
            enable_console: false,
            log_file: Some(log_file),
        }
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, AssistantError> {
        let level = match level.trim().to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            other => {
                return Err(AssistantError::ConfigurationError(format!(
                    "Invalid log level: {other}. Valid options: trace, debug, info, warn, error"
                )));
            }
        };
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
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
            enable_console: self.enable_console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Returns the appender guard when logging to a file; keep it alive for the
/// lifetime of the process or buffered lines are lost. An already installed
/// global subscriber is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, AssistantError> {
    let level = config.log_level.as_str().to_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("assay_insight={level}")));

    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().ok_or_else(|| {
                AssistantError::ConfigurationError(format!(
                    "log file path has no file name: {}",
                    path.display()
                ))
            })?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None if config.enable_console => (BoxMakeWriter::new(std::io::stdout), None),
        None => return Ok(None),
    };
    let ansi = config.log_file.is_none();

    let init_result = match config.output_format {
        OutputFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .json()
            .flatten_event(true)
            .with_span_list(false)
            .try_init(),
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) if e.to_string().contains("already") => Ok(guard),
        Err(e) => Err(AssistantError::ConfigurationError(format!(
            "Failed to initialize tracing: {e}"
        ))),
    }
}

/// Initialize tracing from environment variables
///
/// - `ASSAY_INSIGHT_LOG_LEVEL`: trace, debug, info, warn, error
/// - `ASSAY_INSIGHT_LOG_FORMAT`: text, json, json-compact
/// - `ASSAY_INSIGHT_LOG_FILE`: log file path
pub fn init_from_env() -> Result<Option<WorkerGuard>, AssistantError> {
    init_subscriber(config_from_lookup(|key| std::env::var(key).ok())?)
}

/// Subscriber configuration from an arbitrary key/value source.
pub fn config_from_lookup<F>(lookup: F) -> Result<SubscriberConfig, AssistantError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = SubscriberConfig::builder();
    if let Some(level) = lookup("ASSAY_INSIGHT_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }
    if let Some(format) = lookup("ASSAY_INSIGHT_LOG_FORMAT") {
        builder = builder.output_format(format.parse()?);
    }
    if let Some(path) = lookup("ASSAY_INSIGHT_LOG_FILE").filter(|p| !p.trim().is_empty()) {
        builder = builder.log_file(PathBuf::from(path));
    }
    Ok(builder.build())
}

/// Shorten a secret so it can appear in logs.
///
/// Keeps a recognizable prefix and suffix of long values (`sk-p...9xQz`);
/// short values are fully hidden.
pub fn mask_secret(value: &str) -> String {
    let value = value.strip_prefix("Bearer ").unwrap_or(value);
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Headers as a JSON string with credentials masked.
pub fn format_headers_for_logging(headers: &reqwest::header::HeaderMap) -> String {
    let map: std::collections::BTreeMap<&str, String> = headers
        .iter()
        .map(|(k, v)| {
            let name = k.as_str();
            let value = v.to_str().unwrap_or("<invalid>");
            let sensitive = name.contains("authorization") || name.contains("key") || name.contains("token");
            let shown = if sensitive || v.is_sensitive() {
                mask_secret(value)
            } else {
                value.to_string()
            };
            (name, shown)
        })
        .collect();
    serde_json::to_string(&map).unwrap_or_else(|_| format!("{map:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use std::collections::HashMap;

    #[test]
    fn masks_long_and_short_secrets() {
        assert_eq!(mask_secret("sk-proj-abcdefghijkl9xQz"), "sk-p...9xQz");
        assert_eq!(mask_secret("Bearer sk-proj-abcdefghijkl9xQz"), "sk-p...9xQz");
        assert_eq!(mask_secret("short"), "****");
    }

    #[test]
    fn header_logging_hides_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("sk-ant-api03-secretsecret"));
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        let logged = format_headers_for_logging(&headers);
        assert!(!logged.contains("secretsecret"));
        assert!(logged.contains("2023-06-01"));
    }

    #[test]
    fn config_from_env_like_source() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ASSAY_INSIGHT_LOG_LEVEL", "debug"),
            ("ASSAY_INSIGHT_LOG_FORMAT", "json-compact"),
        ]);
        let config = config_from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn invalid_level_is_configuration_error() {
        let err = config_from_lookup(|k| (k == "ASSAY_INSIGHT_LOG_LEVEL").then(|| "loud".to_string()))
            .unwrap_err();
        assert!(matches!(err, AssistantError::ConfigurationError(_)));
    }
}
