//! Configuration module for Enlight.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//!
//! Option names follow the browser client's initialization options; the
//! camelCase spellings (`apiKey`, `sendInterval`, `windowOnError`) are
//! accepted as aliases.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ports::CaptureOptions;

/// Default collector server.
pub const DEFAULT_SERVER: &str = "https://api.appenlight.com";

/// Placeholder API key used when none is configured.
pub const DEFAULT_API_KEY: &str = "undefined";

/// Default wire protocol version.
pub const DEFAULT_PROTOCOL_VERSION: &str = "0.5";

/// Periodic flushing is only scheduled for intervals of at least this many milliseconds.
pub const MIN_SEND_INTERVAL_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Enlight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub capture: CaptureConfig,
    pub logging: LoggingConfig,
}

/// Collector connection and batching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Collector base URL.
    pub server: String,
    /// Public API key sent as the `public_api_key` query parameter.
    #[serde(alias = "apiKey")]
    pub api_key: String,
    /// Wire protocol version sent as the `protocol_version` query parameter.
    pub protocol_version: String,
    /// Milliseconds between flushes. Below 1000 no periodic flush is scheduled
    /// and the host must flush manually.
    #[serde(alias = "sendInterval")]
    pub send_interval_ms: u64,
    /// URL of the hosted page/application; seeds the `url` context field and
    /// provides the default log namespace.
    pub page_url: String,
    /// Value reported as `user_agent` on every report.
    pub user_agent: String,
}

/// Pass-through settings for the stack-capture collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture uncaught errors (panics) automatically.
    #[serde(alias = "windowOnError")]
    pub window_on_error: bool,
    /// Read source files to fill in frame context.
    pub source_fetching: bool,
    /// Number of source lines gathered around each frame.
    pub context_lines: u32,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/enlight/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("enlight")
            .join("config.yaml")
    }
}

impl ClientConfig {
    /// Whether periodic flushing is enabled for this interval.
    pub fn periodic_flush_enabled(&self) -> bool {
        self.send_interval_ms >= MIN_SEND_INTERVAL_MS
    }
}

impl CaptureConfig {
    /// Options handed to the stack-capture collaborator.
    pub fn options(&self) -> CaptureOptions {
        CaptureOptions {
            collect_uncaught: self.window_on_error,
            source_fetching: self.source_fetching,
            context_lines: self.context_lines,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

// Config derives Default because all its fields implement Default.

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            send_interval_ms: MIN_SEND_INTERVAL_MS,
            page_url: "http://localhost/".to_string(),
            user_agent: format!("enlight/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let options = CaptureOptions::default();
        Self {
            window_on_error: options.collect_uncaught,
            source_fetching: options.source_fetching,
            context_lines: options.context_lines,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"client.server"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `capture.context_lines`.
const MAX_CONTEXT_LINES: u32 = 100;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- client ---
        match Url::parse(&self.client.server) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError {
                field: "client.server".into(),
                message: format!("unsupported scheme '{}'; use http or https", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError {
                field: "client.server".into(),
                message: format!("invalid URL '{}': {e}", self.client.server),
            }),
        }
        if self.client.api_key.trim().is_empty() {
            errors.push(ValidationError {
                field: "client.api_key".into(),
                message: "must not be empty".into(),
            });
        }
        if self.client.protocol_version.trim().is_empty() {
            errors.push(ValidationError {
                field: "client.protocol_version".into(),
                message: "must not be empty".into(),
            });
        }
        if let Err(e) = Url::parse(&self.client.page_url) {
            errors.push(ValidationError {
                field: "client.page_url".into(),
                message: format!("invalid URL '{}': {e}", self.client.page_url),
            });
        }

        // --- capture ---
        if self.capture.context_lines > MAX_CONTEXT_LINES {
            errors.push(ValidationError {
                field: "capture.context_lines".into(),
                message: format!("must be at most {MAX_CONTEXT_LINES}"),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use enlight_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .server("https://collector.example.com")
///     .api_key("pk_live_123")
///     .send_interval_ms(5000)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- client ---

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.config.client.server = server.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.client.api_key = api_key.into();
        self
    }

    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.config.client.protocol_version = version.into();
        self
    }

    pub fn send_interval_ms(mut self, ms: u64) -> Self {
        self.config.client.send_interval_ms = ms;
        self
    }

    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.config.client.page_url = url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.client.user_agent = user_agent.into();
        self
    }

    // --- capture ---

    pub fn window_on_error(mut self, enabled: bool) -> Self {
        self.config.capture.window_on_error = enabled;
        self
    }

    pub fn source_fetching(mut self, enabled: bool) -> Self {
        self.config.capture.source_fetching = enabled;
        self
    }

    pub fn context_lines(mut self, lines: u32) -> Self {
        self.config.capture.context_lines = lines;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
