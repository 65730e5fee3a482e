//! SQL Configuration
//!
//! TigerStyle: Resolved connection settings, validated once at construction.
//!
//! A [`SqlConfig`] can be built three ways:
//! - [`SqlConfig::builder`] for programmatic setup
//! - `serde` deserialization when embedded in a larger config file
//! - [`SqlConfig::from_env`] reading `STOREKEEP_SQL_*` variables

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{SQL_DATABASE_DEFAULT, SQL_ENV_PREFIX};
use crate::error::ConfigError;

// =============================================================================
// Engine
// =============================================================================

/// Supported relational engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Engine {
    /// Embedded single-file database; `database` is a file path
    #[default]
    #[serde(rename = "sqlite3", alias = "sqlite")]
    Sqlite,
    /// Client-server database reached over TCP
    #[serde(rename = "mysql")]
    MySql,
}

impl Engine {
    /// Configuration name of this engine.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite3",
            Self::MySql => "mysql",
        }
    }

    /// Driver name used in log lines.
    #[must_use]
    pub fn driver(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
        }
    }
}

impl FromStr for Engine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite3" | "sqlite" => Ok(Self::Sqlite),
            "mysql" => Ok(Self::MySql),
            _ => Err(ConfigError::InvalidEngine(s.to_string())),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SqlConfig
// =============================================================================

/// Resolved database configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SqlConfig {
    /// Engine type
    #[serde(rename = "type")]
    pub engine: Engine,
    /// Server address including port, e.g. `127.0.0.1:3306` (mysql only)
    pub host: String,
    /// Login user (mysql only)
    pub user: String,
    /// Login password (mysql only)
    pub password: String,
    /// Database name (mysql) or file path (sqlite)
    #[serde(rename = "db")]
    pub database: String,
    /// Connections kept open while idle
    pub max_idle_conns: u32,
    /// Upper bound on open connections; 0 selects the default
    pub max_open_conns: u32,
    /// Log every statement at info level
    pub debug: bool,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Sqlite,
            host: String::new(),
            user: String::new(),
            password: String::new(),
            database: SQL_DATABASE_DEFAULT.to_string(),
            max_idle_conns: 0,
            max_open_conns: 0,
            debug: false,
        }
    }
}

impl fmt::Debug for SqlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlConfig")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_idle_conns", &self.max_idle_conns)
            .field("max_open_conns", &self.max_open_conns)
            .field("debug", &self.debug)
            .finish()
    }
}

impl SqlConfig {
    /// Start building a config from the defaults.
    #[must_use]
    pub fn builder() -> SqlConfigBuilder {
        SqlConfigBuilder::default()
    }

    /// Read settings from `STOREKEEP_SQL_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{SQL_ENV_PREFIX}{name}"));
        let mut builder = Self::builder();

        if let Some(engine) = get("TYPE") {
            builder = builder.engine(engine);
        }
        if let Some(host) = get("HOST") {
            builder = builder.host(host);
        }
        if let Some(user) = get("USER") {
            builder = builder.user(user);
        }
        if let Some(password) = get("PASSWORD") {
            builder = builder.password(password);
        }
        if let Some(database) = get("DB") {
            builder = builder.database(database);
        }
        if let Some(raw) = get("MAX_IDLE_CONNS") {
            builder = builder.max_idle_conns(parse_env("MAX_IDLE_CONNS", &raw)?);
        }
        if let Some(raw) = get("MAX_OPEN_CONNS") {
            builder = builder.max_open_conns(parse_env("MAX_OPEN_CONNS", &raw)?);
        }
        if let Some(raw) = get("DEBUG") {
            builder = builder.debug(parse_env("DEBUG", &raw)?);
        }

        builder.build()
    }

    /// Check cross-field requirements.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField {
                engine: self.engine,
                field: "database",
            });
        }
        if self.engine == Engine::MySql && self.host.trim().is_empty() {
            return Err(ConfigError::MissingField {
                engine: self.engine,
                field: "host",
            });
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: format!("{SQL_ENV_PREFIX}{name}"),
        value: raw.to_string(),
    })
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`SqlConfig`].
///
/// The engine is kept as text until [`SqlConfigBuilder::build`] so an
/// unsupported name is reported as a configuration error.
#[derive(Debug, Default)]
pub struct SqlConfigBuilder {
    engine: Option<String>,
    config: SqlConfig,
}

impl SqlConfigBuilder {
    /// Set the engine by name (`sqlite3`, `sqlite`, or `mysql`).
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Set the server address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the login user.
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.config.user = user.into();
        self
    }

    /// Set the login password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    /// Set the database name or file path.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    /// Set the idle connection count.
    #[must_use]
    pub fn max_idle_conns(mut self, n: u32) -> Self {
        self.config.max_idle_conns = n;
        self
    }

    /// Set the open connection limit.
    #[must_use]
    pub fn max_open_conns(mut self, n: u32) -> Self {
        self.config.max_open_conns = n;
        self
    }

    /// Enable statement logging at info level.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Validate and produce the config.
    pub fn build(self) -> Result<SqlConfig, ConfigError> {
        let mut config = self.config;
        if let Some(engine) = self.engine {
            config.engine = engine.parse()?;
        }
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Tests
// =============================================================================
