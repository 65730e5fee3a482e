//! Errors
//!
//! TigerStyle: one enum per concern, explicit variants, no stringly-typed kinds.
//!
//! Callers branch on [`StorageError::kind`] to tell bad input from a missing
//! row from a backend failure.

use crate::config::Engine;

/// Result alias for facade operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// StorageError
// =============================================================================

/// Errors returned by facade operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A filter, sort, or update key contains unsafe characters
    #[error("invalid column name: {0}")]
    InvalidColumn(String),

    /// A sort direction other than `asc`/`desc`
    #[error("invalid sort order for column {column}: {order}")]
    InvalidSortOrder { column: String, order: String },

    /// Bulk delete called without conditions
    #[error("filter cannot be empty")]
    EmptyFilter,

    /// Update called without any column to set
    #[error("changes cannot be empty")]
    EmptyChanges,

    /// Identifier is not positive
    #[error("invalid identifier: {0}")]
    InvalidId(i64),

    /// Preload or association key names no declared relation
    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    /// Query shape the facade cannot serve
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// No row matched
    #[error("record not found")]
    RecordNotFound,

    /// The execution context was cancelled
    #[error("context cancelled")]
    Cancelled,

    /// The execution context's deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// An auto-id insert succeeded but the engine reported no generated key
    #[error("no generated key reported for table {0}")]
    MissingKey(&'static str),

    /// Any other driver failure, unchanged
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Coarse classification of a [`StorageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied an unusable request
    BadInput,
    /// Nothing matched
    NotFound,
    /// Context cancelled or timed out
    Cancelled,
    /// Driver or database failure
    Backend,
}

impl StorageError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidColumn(_)
            | Self::InvalidSortOrder { .. }
            | Self::EmptyFilter
            | Self::EmptyChanges
            | Self::InvalidId(_)
            | Self::UnknownRelation(_)
            | Self::InvalidQuery(_) => ErrorKind::BadInput,
            Self::RecordNotFound => ErrorKind::NotFound,
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
            Self::MissingKey(_) | Self::Database(_) => ErrorKind::Backend,
        }
    }

    /// True when no row matched.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// True when the request was rejected before reaching the backend.
    #[must_use]
    pub fn is_bad_input(&self) -> bool {
        self.kind() == ErrorKind::BadInput
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::RecordNotFound,
            other => Self::Database(other),
        }
    }
}

// =============================================================================
// ConfigError
// =============================================================================

/// Errors raised while building a [`crate::SqlConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid database type: {0}")]
    InvalidEngine(String),

    #[error("{engine} requires a {field}")]
    MissingField { engine: Engine, field: &'static str },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// ConnectError
// =============================================================================

/// Errors raised while opening the connection pool.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("invalid connection url: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to connect database with driver '{engine}': {source}")]
    Connect {
        engine: Engine,
        #[source]
        source: sqlx::Error,
    },
}

// =============================================================================
// Tests
// =============================================================================
