// Configuration File Support
//
// TOML configuration with environment variable overrides.
// Loaded from the XDG config directory: ~/.config/quizvault/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Question source configuration
    pub source: SourceConfig,

    /// Store configuration
    pub store: StoreConfig,

    /// Harvesting loop configuration
    pub harvest: HarvestConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// Question source configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Generator endpoint; the requested count is appended verbatim
    pub url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://jservice.io/api/random?count=".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage backend ("sqlite" or "memory")
    pub backend: String,

    /// Database file path (sqlite backend)
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            path: "./quizvault.db".to_string(),
        }
    }
}

/// Harvesting loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarvestConfig {
    /// Maximum fetch/insert cycles per collection
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds (0 retries immediately)
    pub retry_delay_ms: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            retry_delay_ms: 0,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether to expose the /metrics endpoint
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            source: SourceConfig::default(),
            store: StoreConfig::default(),
            harvest: HarvestConfig::default(),
            server: ServerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default XDG config directory
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default().apply_env_overrides());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file from {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file from {:?}", path))?;

        let config = config.apply_env_overrides();
        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/quizvault/config.toml` on Linux/Mac
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "quizvault", "QuizVault") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".config")
                .join("quizvault")
                .join("config.toml")
        }
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - QUIZVAULT_LOG_LEVEL / QUIZVAULT_LOG_FORMAT
    /// - QUIZVAULT_SOURCE_URL / QUIZVAULT_SOURCE_TIMEOUT_SECS
    /// - QUIZVAULT_STORE_BACKEND / QUIZVAULT_STORE_PATH
    /// - QUIZVAULT_MAX_ATTEMPTS / QUIZVAULT_RETRY_DELAY_MS
    /// - QUIZVAULT_SERVER_PORT / QUIZVAULT_METRICS_ENABLED
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("QUIZVAULT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("QUIZVAULT_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(url) = std::env::var("QUIZVAULT_SOURCE_URL") {
            self.source.url = url;
        }
        if let Ok(timeout) = std::env::var("QUIZVAULT_SOURCE_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                if timeout > 0 {
                    self.source.timeout_secs = timeout;
                }
            }
        }

        if let Ok(backend) = std::env::var("QUIZVAULT_STORE_BACKEND") {
            self.store.backend = backend;
        }
        if let Ok(path) = std::env::var("QUIZVAULT_STORE_PATH") {
            self.store.path = path;
        }

        if let Ok(attempts) = std::env::var("QUIZVAULT_MAX_ATTEMPTS") {
            if let Ok(attempts) = attempts.parse::<u32>() {
                if attempts > 0 {
                    self.harvest.max_attempts = attempts;
                }
            }
        }
        if let Ok(delay) = std::env::var("QUIZVAULT_RETRY_DELAY_MS") {
            if let Ok(delay) = delay.parse::<u64>() {
                self.harvest.retry_delay_ms = delay;
            }
        }

        if let Ok(port) = std::env::var("QUIZVAULT_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                if port > 0 {
                    self.server.port = port;
                }
            }
        }
        if let Ok(enabled) = std::env::var("QUIZVAULT_METRICS_ENABLED") {
            self.metrics.enabled = enabled.parse().unwrap_or(self.metrics.enabled);
        }

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        if self.source.url.is_empty() {
            anyhow::bail!("Source URL must not be empty");
        }
        if self.source.timeout_secs == 0 {
            anyhow::bail!("Source timeout must be > 0");
        }

        match self.store.backend.to_lowercase().as_str() {
            "sqlite" => {
                if self.store.path.is_empty() {
                    anyhow::bail!("Store backend 'sqlite' requires a non-empty path");
                }
            }
            "memory" => {}
            _ => anyhow::bail!(
                "Invalid store backend: {}. Must be 'sqlite' or 'memory'",
                self.store.backend
            ),
        }

        if self.harvest.max_attempts == 0 {
            anyhow::bail!("Harvest attempt budget must be > 0");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        Ok(())
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .to_lowercase()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Tests that touch QUIZVAULT_* env vars must not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.store.backend, "sqlite");
        assert_eq!(config.harvest.max_attempts, 100);
        assert_eq!(config.harvest.retry_delay_ms, 0);
        assert_eq!(config.server.port, 8080);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_config_validation_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_backend() {
        let mut config = Config::default();
        config.store.backend = "postgres".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_sqlite_requires_path() {
        let mut config = Config::default();
        config.store.path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_attempts() {
        let mut config = Config::default();
        config.harvest.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.source.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_nonexistent_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().with_extension(".nonexistent");
        let config = Config::load_from_path(&path);
        assert!(config.is_ok());
    }

    #[test]
    fn test_load_valid_toml_config() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("QUIZVAULT_LOG_LEVEL");
        std::env::remove_var("QUIZVAULT_SOURCE_URL");
        std::env::remove_var("QUIZVAULT_STORE_BACKEND");
        std::env::remove_var("QUIZVAULT_MAX_ATTEMPTS");

        let temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[logging]
level = "debug"
format = "json"

[source]
url = "http://localhost:4100/api/random?count="
timeout_secs = 5

[store]
backend = "memory"

[harvest]
max_attempts = 10
retry_delay_ms = 50

[server]
port = 9000
"#;

        fs::write(temp_file.path(), toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.source.url, "http://localhost:4100/api/random?count=");
        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.harvest.max_attempts, 10);
        assert_eq!(config.harvest.retry_delay_ms, 50);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_invalid_toml_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[source
url = "broken"
"#;

        fs::write(temp_file.path(), toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path());
        assert!(config.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("QUIZVAULT_LOG_LEVEL");
        std::env::remove_var("QUIZVAULT_SOURCE_URL");
        std::env::remove_var("QUIZVAULT_MAX_ATTEMPTS");

        std::env::set_var("QUIZVAULT_LOG_LEVEL", "debug");
        std::env::set_var("QUIZVAULT_SOURCE_URL", "http://localhost:1234/q?count=");
        std::env::set_var("QUIZVAULT_MAX_ATTEMPTS", "7");

        let config = Config::default().apply_env_overrides();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.source.url, "http://localhost:1234/q?count=");
        assert_eq!(config.harvest.max_attempts, 7);

        std::env::remove_var("QUIZVAULT_LOG_LEVEL");
        std::env::remove_var("QUIZVAULT_SOURCE_URL");
        std::env::remove_var("QUIZVAULT_MAX_ATTEMPTS");
    }

    #[test]
    fn test_env_overrides_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("QUIZVAULT_MAX_ATTEMPTS");
        std::env::remove_var("QUIZVAULT_SERVER_PORT");

        std::env::set_var("QUIZVAULT_MAX_ATTEMPTS", "0");
        std::env::set_var("QUIZVAULT_SERVER_PORT", "not-a-port");

        let config = Config::default().apply_env_overrides();

        assert_eq!(config.harvest.max_attempts, 100);
        assert_eq!(config.server.port, 8080);

        std::env::remove_var("QUIZVAULT_MAX_ATTEMPTS");
        std::env::remove_var("QUIZVAULT_SERVER_PORT");
    }

    #[test]
    fn test_config_partial_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[logging]
level = "debug"
"#;

        fs::write(temp_file.path(), toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        // Other fields should have defaults
        assert_eq!(config.harvest.max_attempts, 100);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_log_level_parsing() {
        let mut config = Config::default();
        config.logging.level = "debug".to_string();
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);

        config.logging.level = "invalid".to_string();
        assert!(config.log_level().is_err());
    }
}
