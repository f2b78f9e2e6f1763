//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::query::DEFAULT_MAX_PAGE_SIZE;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Database file used when none is configured, shared with `dashboard-cli seed`
pub const DEFAULT_DB_PATH: &str = "./data/analytics.db";

/// Event database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Seed this many events when the database starts empty (0 disables)
    #[serde(default)]
    pub seed_on_empty: usize,
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            seed_on_empty: 0,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_connections")]
    pub max_ws_connections: usize,

    /// Fixed window length for per-IP rate limiting
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,

    /// Requests allowed per IP per window under `/api/v1` (0 disables)
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max_requests: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> usize {
    1000
}

fn default_rate_limit_window() -> u64 {
    60
}

fn default_rate_limit_max() -> u32 {
    100
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            request_timeout_secs: default_request_timeout(),
            max_ws_connections: default_max_connections(),
            rate_limit_window_secs: default_rate_limit_window(),
            rate_limit_max_requests: default_rate_limit_max(),
        }
    }
}

/// Query limits
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_max_page_size() -> u32 {
    DEFAULT_MAX_PAGE_SIZE
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Token signing settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret, at least 32 bytes. A random one is
    /// generated at startup when unset, so tokens do not survive restarts.
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl() -> u64 {
    7 * 24 * 60 * 60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("analytics-dashboard").join("config.toml")),
            Some(PathBuf::from("/etc/analytics-dashboard/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply `DASHBOARD_*` overrides from a variable lookup
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DASHBOARD_DB_PATH") {
            self.database.path = path;
        }

        if let Some(host) = lookup("DASHBOARD_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("DASHBOARD_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Some(max) = lookup("DASHBOARD_RATE_LIMIT_MAX_REQUESTS") {
            match max.parse() {
                Ok(n) => self.api.rate_limit_max_requests = n,
                Err(_) => tracing::warn!(value = %max, "Ignoring invalid DASHBOARD_RATE_LIMIT_MAX_REQUESTS"),
            }
        }
        if let Some(window) = lookup("DASHBOARD_RATE_LIMIT_WINDOW_SECS") {
            match window.parse::<u64>() {
                Ok(n) if n > 0 => self.api.rate_limit_window_secs = n,
                _ => tracing::warn!(value = %window, "Ignoring invalid DASHBOARD_RATE_LIMIT_WINDOW_SECS"),
            }
        }

        if let Some(secret) = lookup("DASHBOARD_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(size) = lookup("DASHBOARD_MAX_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(n) if n > 0 => self.query.max_page_size = n,
                _ => tracing::warn!(value = %size, "Ignoring invalid DASHBOARD_MAX_PAGE_SIZE"),
            }
        }

        if let Some(level) = lookup("DASHBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("DASHBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Socket address string for the API listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Analytics Dashboard Configuration
#
# Environment variables override these settings:
# - DASHBOARD_DB_PATH
# - DASHBOARD_API_HOST
# - DASHBOARD_API_PORT
# - DASHBOARD_RATE_LIMIT_MAX_REQUESTS
# - DASHBOARD_RATE_LIMIT_WINDOW_SECS
# - DASHBOARD_JWT_SECRET
# - DASHBOARD_MAX_PAGE_SIZE
# - DASHBOARD_LOG_LEVEL
# - DASHBOARD_LOG_FORMAT

[database]
# SQLite database file holding analytics events
path = "./data/analytics.db"

# Seed this many synthetic events when the database is empty (0 disables)
seed_on_empty = 0

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 5000

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds
request_timeout_secs = 30

# Maximum concurrent WebSocket connections
max_ws_connections = 1000

# Per-IP request budget under /api/v1 (0 disables); WebSocket upgrades are exempt
rate_limit_window_secs = 60
rate_limit_max_requests = 100

[auth]
# HS256 secret for session tokens, at least 32 characters.
# Leave empty to generate one per process start.
jwt_secret = ""

# Token lifetime in seconds (7 days)
token_ttl_secs = 604800

[query]
# Largest accepted `limit` for the listing endpoint
max_page_size = 100

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 5000);
        assert_eq!(config.api.max_ws_connections, 1000);
        assert_eq!(config.query.max_page_size, 100);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.database.seed_on_empty, 0);
        assert_eq!(config.api.rate_limit_window_secs, 60);
        assert_eq!(config.api.rate_limit_max_requests, 100);
        assert_eq!(config.auth.token_ttl_secs, 604_800);
        assert!(config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_db_path_matches_template() {
        let generated = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(Config::default().database.path, DEFAULT_DB_PATH);
        assert_eq!(generated.database.path, Config::default().database.path);
        assert_eq!(Config::parse("").unwrap().database.path, DEFAULT_DB_PATH);
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.database.path, "./data/analytics.db");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.query.max_page_size, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse("[api]\nport = 9000\n").unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.query.max_page_size, 100);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[query]\nmax_page_size = 250\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.query.max_page_size, 250);

        std::fs::write(&path, "[query\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));

        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DASHBOARD_DB_PATH", "/tmp/events.db"),
            ("DASHBOARD_API_PORT", "7000"),
            ("DASHBOARD_MAX_PAGE_SIZE", "500"),
            ("DASHBOARD_LOG_FORMAT", "json"),
            ("DASHBOARD_RATE_LIMIT_MAX_REQUESTS", "0"),
            ("DASHBOARD_RATE_LIMIT_WINDOW_SECS", "10"),
            ("DASHBOARD_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, "/tmp/events.db");
        assert_eq!(config.api.port, 7000);
        assert_eq!(config.query.max_page_size, 500);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.bind_addr(), "0.0.0.0:7000");
        assert_eq!(config.api.rate_limit_max_requests, 0);
        assert_eq!(config.api.rate_limit_window_secs, 10);
        assert_eq!(config.auth.jwt_secret.len(), 32);
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "DASHBOARD_API_PORT" => Some("not-a-port".to_string()),
            "DASHBOARD_MAX_PAGE_SIZE" => Some("0".to_string()),
            "DASHBOARD_RATE_LIMIT_WINDOW_SECS" => Some("0".to_string()),
            "DASHBOARD_RATE_LIMIT_MAX_REQUESTS" => Some("lots".to_string()),
            _ => None,
        });

        assert_eq!(config.api.port, 5000);
        assert_eq!(config.query.max_page_size, 100);
        assert_eq!(config.api.rate_limit_window_secs, 60);
        assert_eq!(config.api.rate_limit_max_requests, 100);
    }
}
