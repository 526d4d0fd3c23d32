//! TOML-based configuration for taskgate
//!
//! Infrastructure settings (listen address, logging, credential lifetime,
//! database location) come from `taskgate.toml`. The signing secret itself
//! never lives in the file: `auth.jwt_secret_env` names the environment
//! variable that holds it.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! log_level = "info"
//! log_format = "json"
//!
//! [auth]
//! jwt_secret_env = "JWT_SECRET"
//! jwt_lifetime_minutes = 60
//!
//! [database]
//! url = "./data/taskgate.db"
//! ```

use crate::db::DatabaseProvider;
use crate::types::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Root configuration structure loaded from taskgate.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskgateConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the JWT secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Credential lifetime in minutes
    #[serde(default = "default_jwt_lifetime_minutes")]
    pub jwt_lifetime_minutes: i64,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

/// One hundred years.
pub const MAX_JWT_LIFETIME_MINUTES: i64 = 525_600 * 100;

fn default_jwt_lifetime_minutes() -> i64 {
    60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            jwt_lifetime_minutes: default_jwt_lifetime_minutes(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `:memory:` or a database file path
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    ":memory:".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {}", .0.display(), .1)]
    ReadError(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' holding the JWT secret is not set or empty")]
    MissingSecret(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl TaskgateConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file is not an error: every section falls back to its
    /// defaults so the server can start with nothing but a secret.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "configuration file not found, using defaults");
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "configuration loaded");

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TaskgateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_lifetime_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.jwt_lifetime_minutes must be positive".to_string(),
            ));
        }
        if self.auth.jwt_lifetime_minutes > MAX_JWT_LIFETIME_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "auth.jwt_lifetime_minutes must not exceed {}",
                MAX_JWT_LIFETIME_MINUTES
            )));
        }
        if self.auth.jwt_secret_env.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt_secret_env must name an environment variable".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the JWT secret from the environment
    ///
    /// A `.env` file in the working directory is consulted first; variables
    /// already set in the process environment take precedence over it.
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        dotenvy::dotenv().ok();

        std::env::var(&self.auth.jwt_secret_env)
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingSecret(self.auth.jwt_secret_env.clone()))
    }

    pub fn database_provider(&self) -> DatabaseProvider {
        DatabaseProvider::from_url(&self.database.url)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
