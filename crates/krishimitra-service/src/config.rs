//! Server configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use krishimitra_core::{
    ConversationOptions, DEFAULT_MAX_MESSAGE_LEN, DEFAULT_MAX_UPLOAD_BYTES,
};
use krishimitra_types::Language;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Chat session settings.
    pub chat: ChatConfig,
    /// Price data settings.
    pub prices: PricesConfig,
    /// Disease scanner settings.
    pub scanner: ScannerConfig,
    /// Rate limiting.
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// # Example
    ///
    /// ```
    /// use krishimitra_service::Config;
    ///
    /// let config = Config::default();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.chat.validate());
        errors.extend(self.prices.validate());
        errors.extend(self.scanner.validate());
        errors.extend(self.security.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError::new(
                "server.bind",
                "bind address cannot be empty",
            ));
            return errors;
        }

        // Parsed exactly as the server parses it at startup.
        match self.bind.parse::<SocketAddr>() {
            Ok(addr) if addr.port() == 0 => {
                errors.push(ValidationError::new("server.bind", "port cannot be 0"))
            }
            Ok(_) => {}
            Err(_) => errors.push(ValidationError::new(
                "server.bind",
                format!(
                    "invalid bind address '{}': expected an IP socket address such as '127.0.0.1:8000'",
                    self.bind
                ),
            )),
        }

        errors
    }
}

/// Longest configurable reply delay in milliseconds.
pub const MAX_REPLY_DELAY_MS: u64 = 60_000;

/// Chat session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Simulated latency before a session reply is appended.
    pub reply_delay_ms: u64,
    /// Language of new sessions when the client does not pick one.
    pub default_language: Language,
    /// Longest accepted message, in characters.
    pub max_message_len: usize,
    /// Maximum number of live sessions.
    pub max_sessions: usize,
    /// Seconds without activity after which a session is closed and evicted.
    pub session_idle_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1000,
            default_language: Language::English,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            max_sessions: 1000,
            session_idle_secs: 1800,
        }
    }
}

impl ChatConfig {
    /// Validate chat configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.reply_delay_ms > MAX_REPLY_DELAY_MS {
            errors.push(ValidationError::new(
                "chat.reply_delay_ms",
                format!(
                    "reply delay {} is too long (maximum {} ms)",
                    self.reply_delay_ms, MAX_REPLY_DELAY_MS
                ),
            ));
        }
        if self.max_message_len == 0 {
            errors.push(ValidationError::new(
                "chat.max_message_len",
                "max message length must be at least 1",
            ));
        }
        if self.max_sessions == 0 {
            errors.push(ValidationError::new(
                "chat.max_sessions",
                "max sessions must be at least 1",
            ));
        }
        if self.session_idle_secs == 0 {
            errors.push(ValidationError::new(
                "chat.session_idle_secs",
                "session idle timeout must be at least 1 second",
            ));
        }

        errors
    }

    /// The reply delay as a duration.
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    /// How long a session may sit unused before it is evicted.
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Options for a new conversation, optionally overriding the language.
    pub fn conversation_options(&self, language: Option<Language>) -> ConversationOptions {
        ConversationOptions::default()
            .language(language.unwrap_or(self.default_language))
            .reply_delay(self.reply_delay())
            .max_message_len(self.max_message_len)
    }
}

/// Price data configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PricesConfig {
    /// CSV or JSON file to seed the store from. The built-in sample is used when unset.
    pub seed_file: Option<PathBuf>,
}

impl PricesConfig {
    /// Validate price configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(path) = &self.seed_file {
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::new(
                    "prices.seed_file",
                    "seed file path cannot be empty (omit it to use the sample data)",
                ));
            } else if !matches!(extension.as_deref(), Some("csv" | "json")) {
                errors.push(ValidationError::new(
                    "prices.seed_file",
                    format!("seed file '{}' must be a .csv or .json file", path.display()),
                ));
            }
        }

        errors
    }
}

/// Largest configurable upload limit (50 MiB).
pub const MAX_UPLOAD_LIMIT: u64 = 50 * 1024 * 1024;

/// Disease scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Largest accepted image, in bytes.
    pub max_upload_bytes: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ScannerConfig {
    /// Validate scanner configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.max_upload_bytes == 0 {
            errors.push(ValidationError::new(
                "scanner.max_upload_bytes",
                "upload limit must be at least 1 byte",
            ));
        } else if self.max_upload_bytes > MAX_UPLOAD_LIMIT {
            errors.push(ValidationError::new(
                "scanner.max_upload_bytes",
                format!(
                    "upload limit {} is too large (maximum {} bytes)",
                    self.max_upload_bytes, MAX_UPLOAD_LIMIT
                ),
            ));
        }

        errors
    }
}

/// Per-IP rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Whether requests are rate limited.
    pub rate_limit_enabled: bool,
    /// Requests allowed per window.
    pub rate_limit_requests: u32,
    /// Window length in seconds.
    pub rate_limit_window_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limit_enabled: false,
            rate_limit_requests: 100,
            rate_limit_window_secs: 60,
        }
    }
}

impl SecurityConfig {
    /// Validate security configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.rate_limit_enabled {
            if self.rate_limit_requests == 0 {
                errors.push(ValidationError::new(
                    "security.rate_limit_requests",
                    "must allow at least 1 request per window",
                ));
            }
            if self.rate_limit_window_secs == 0 {
                errors.push(ValidationError::new(
                    "security.rate_limit_window_secs",
                    "window must be at least 1 second",
                ));
            }
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `chat.max_sessions`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("krishimitra")
        .join("server.toml")
}
