//! Desk configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Database
//! - `DATABASE_URL` - `PostgreSQL` connection string (takes precedence over the parts below)
//! - `DB_HOST` - Server host (default: localhost)
//! - `DB_PORT` - Server port (default: 5432)
//! - `DB_NAME` - Database name (default: workbench)
//! - `DB_USER` - Role name (default: postgres)
//! - `DB_PASSWORD` - Role password (default: empty)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//!
//! ## Documents
//! - `APP_NAME` - Business name printed on work-order documents (default: GF Informática)
//! - `DOCUMENT_DIR` - Directory printed documents are written to (default: current directory)
//!
//! ## Logging
//! - `LOG_FORMAT` - `text` or `json` (default: text)
//! - `LOG_DIR` - Directory for daily rolling log files (default: no file logging)
//!
//! ## Optional (Sentry)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Environment name reported to Sentry
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

const DEFAULT_APP_NAME: &str = "GF Informática";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "workbench";
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration errors that can occur during loading.
///
/// Every variable has a default, so only malformed values fail.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Desk configuration shared by every command.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    /// Record store connection settings
    pub database: DatabaseConfig,
    /// Business name for document headers
    pub app_name: String,
    /// Where printed documents are written
    pub document_dir: PathBuf,
    /// Console and file logging
    pub logging: LoggingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// Where the record store lives.
#[derive(Clone)]
pub enum DatabaseTarget {
    /// A full connection string.
    Url(SecretString),
    /// Individual connection parameters.
    Parts {
        host: String,
        port: u16,
        name: String,
        user: String,
        password: SecretString,
    },
}

impl std::fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(_) => f.debug_tuple("Url").field(&"[REDACTED]").finish(),
            Self::Parts {
                host,
                port,
                name,
                user,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("name", name)
                .field("user", user)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub target: DatabaseTarget,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Configuration for a connection string, with the default pool size.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            target: DatabaseTarget::Url(SecretString::from(url.into())),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Build `sqlx` connect options for this target.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the connection string cannot be parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match &self.target {
            DatabaseTarget::Url(url) => PgConnectOptions::from_str(url.expose_secret())
                .map_err(|e| ConfigError::InvalidEnvVar("DATABASE_URL".to_owned(), e.to_string())),
            DatabaseTarget::Parts {
                host,
                port,
                name,
                user,
                password,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(name)
                .username(user)
                .password(password.expose_secret())),
        }
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_connections = parse_or_default(lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "DB_MAX_CONNECTIONS".to_owned(),
                "must be at least 1".to_owned(),
            ));
        }

        let target = if let Some(url) = get_optional(lookup, "DATABASE_URL") {
            DatabaseTarget::Url(SecretString::from(url))
        } else {
            DatabaseTarget::Parts {
                host: get_or_default(lookup, "DB_HOST", DEFAULT_DB_HOST),
                port: parse_or_default(lookup, "DB_PORT", DEFAULT_DB_PORT)?,
                name: get_or_default(lookup, "DB_NAME", DEFAULT_DB_NAME),
                user: get_or_default(lookup, "DB_USER", DEFAULT_DB_USER),
                password: SecretString::from(lookup("DB_PASSWORD").unwrap_or_default()),
            }
        };

        Ok(Self {
            target,
            max_connections,
        })
    }
}

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `text` or `json`, got `{other}`")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Directory for daily log files; console only when unset
    pub directory: Option<PathBuf>,
}

impl DeskConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig::from_lookup(&lookup)?;
        let app_name = get_or_default(&lookup, "APP_NAME", DEFAULT_APP_NAME);
        let document_dir = get_optional(&lookup, "DOCUMENT_DIR")
            .map_or_else(|| PathBuf::from("."), PathBuf::from);

        let format = get_optional(&lookup, "LOG_FORMAT")
            .map(|s| s.parse::<LogFormat>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("LOG_FORMAT".to_owned(), e))?
            .unwrap_or_default();
        let logging = LoggingConfig {
            format,
            directory: get_optional(&lookup, "LOG_DIR").map(PathBuf::from),
        };

        let sentry_sample_rate: f32 = parse_or_default(&lookup, "SENTRY_SAMPLE_RATE", 1.0)?;
        if !(0.0..=1.0).contains(&sentry_sample_rate) {
            return Err(ConfigError::InvalidEnvVar(
                "SENTRY_SAMPLE_RATE".to_owned(),
                "must be between 0.0 and 1.0".to_owned(),
            ));
        }

        Ok(Self {
            database,
            app_name,
            document_dir,
            logging,
            sentry_dsn: get_optional(&lookup, "SENTRY_DSN"),
            sentry_environment: get_optional(&lookup, "SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating blank values as unset.
fn get_optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get_optional(lookup, key).unwrap_or_else(|| default.to_owned())
}

/// Parse a variable, falling back to a default when unset.
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional(lookup, key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
    })
}
