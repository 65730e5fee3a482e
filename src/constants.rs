//! Constants
//!
//! TigerStyle: every limit and default lives here, named with units and bounds.

use std::time::Duration;

// =============================================================================
// Configuration Defaults
// =============================================================================

/// Default engine name when none is configured
pub const SQL_ENGINE_DEFAULT: &str = "sqlite3";

/// Default SQLite database file
pub const SQL_DATABASE_DEFAULT: &str = "./sqlite.db";

/// Environment variable prefix for SQL settings
pub const SQL_ENV_PREFIX: &str = "STOREKEEP_SQL_";

// =============================================================================
// Pool Limits
// =============================================================================

/// Open connections used when the configuration leaves the limit at 0
pub const POOL_CONNECTIONS_COUNT_DEFAULT: u32 = 10;

/// Hard ceiling on open connections
pub const POOL_CONNECTIONS_COUNT_MAX: u32 = 1_000;

/// Time to wait for a free pooled connection
pub const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Statement Tracing
// =============================================================================

/// Statements slower than this are logged at warn level
pub const STATEMENT_SLOW_THRESHOLD_MS: u128 = 200;

// =============================================================================
// Pagination
// =============================================================================

/// Page size applied by `PageRequest::normalize` when none was requested
pub const PAGE_SIZE_DEFAULT: i64 = 20;

/// First page number
pub const PAGE_NUMBER_DEFAULT: i64 = 1;

// =============================================================================
// Identifiers
// =============================================================================

/// Default primary key column
pub const PRIMARY_KEY_DEFAULT: &str = "id";

/// Character sequences that make a column name unsafe to interpolate
pub const COLUMN_NAME_FORBIDDEN: &[&str] = &["'", "\"", ";", "--"];
