//! Filter Validation
//!
//! Column names from caller-supplied mappings are interpolated into SQL as
//! identifiers, so they are checked here before any statement is built.
//! Values are always bound parameters and need no checking.

use crate::constants::COLUMN_NAME_FORBIDDEN;
use crate::error::{StorageError, StorageResult};
use crate::value::Fields;

/// Reject the first key that is not a safe column name.
///
/// An empty mapping is always valid.
pub fn validate_filter(filter: &Fields) -> StorageResult<()> {
    validate_columns(filter.keys())
}

/// Reject the first name in `columns` that is not a safe column name.
pub fn validate_columns<'a, I>(columns: I) -> StorageResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for name in columns {
        if !is_valid_column_name(name) {
            return Err(StorageError::InvalidColumn(name.to_string()));
        }
    }
    Ok(())
}

/// True when `name` contains none of `'`, `"`, `;`, or `--`.
#[must_use]
pub fn is_valid_column_name(name: &str) -> bool {
    !COLUMN_NAME_FORBIDDEN
        .iter()
        .any(|needle| name.contains(needle))
}
