//! Query Compilation
//!
//! TigerStyle: A [`Query`] descriptor is compiled into a [`Scope`] (validated
//! conditions, order terms, pagination window) which renders [`Statement`]s.
//! Nothing here touches the database.
//!
//! # Rendering
//!
//! ```text
//! Query { filter, sort, page, size }
//!     │  validate keys, parse directions, compute window
//!     ▼
//! Scope ──► count()        SELECT COUNT(*) FROM t WHERE …
//!       ──► select()       SELECT * FROM t WHERE … ORDER BY … LIMIT ? OFFSET ?
//!       ──► select_keys()  SELECT pk FROM t WHERE … ORDER BY … LIMIT ? OFFSET ?
//!       ──► first()        SELECT * FROM t WHERE … ORDER BY pk LIMIT 1
//!       ──► update()/delete()
//! ```
//!
//! Identifiers are wrapped in backticks, which both supported engines accept.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::any::AnyArguments;

use crate::error::{StorageError, StorageResult};
use crate::filter::{is_valid_column_name, validate_columns, validate_filter};
use crate::model::{Model, Relation};
use crate::value::{Fields, Value};

// =============================================================================
// Query
// =============================================================================

/// List request descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Query {
    /// Equality conditions, e.g. `{"name": "test"}`
    pub filter: Fields,
    /// 1-based page number
    pub page: i64,
    /// Rows per page
    pub size: i64,
    /// Column to direction, e.g. `{"created_at": "desc"}`
    pub sort: BTreeMap<String, String>,
    /// Relation to load alongside each row
    pub preload: Option<String>,
    /// Load every declared relation
    pub all_preload: bool,
    /// Relation whose rows are fetched instead of the main rows
    pub association_key: Option<String>,
}

impl Query {
    /// An empty query: no filter, no pagination, no ordering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition.
    #[must_use]
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(column, value);
        self
    }

    /// Set page number and size.
    #[must_use]
    pub fn paginate(mut self, page: i64, size: i64) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    /// Add an order term.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort.insert(column.into(), direction.into());
        self
    }

    /// Preload one named relation.
    #[must_use]
    pub fn with_preload(mut self, relation: impl Into<String>) -> Self {
        self.preload = Some(relation.into());
        self
    }

    /// Preload every declared relation.
    #[must_use]
    pub fn with_all_preload(mut self) -> Self {
        self.all_preload = true;
        self
    }

    /// Fetch the rows of a relation instead of the main rows.
    #[must_use]
    pub fn with_association(mut self, relation: impl Into<String>) -> Self {
        self.association_key = Some(relation.into());
        self
    }

    /// Pagination window, present only when both page and size are positive.
    #[must_use]
    pub fn window(&self) -> Option<Window> {
        Window::new(self.page, self.size)
    }
}

/// `LIMIT`/`OFFSET` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

impl Window {
    /// Window for a 1-based page; `None` unless both arguments are positive.
    #[must_use]
    pub fn new(page: i64, size: i64) -> Option<Self> {
        if page <= 0 || size <= 0 {
            return None;
        }
        Some(Self {
            limit: size,
            offset: (page - 1).saturating_mul(size),
        })
    }
}

// =============================================================================
// SortOrder
// =============================================================================

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parse a direction token, falling back to descending.
    #[must_use]
    pub fn parse_or_desc(token: &str) -> Self {
        token.parse().unwrap_or(Self::Desc)
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Statement
// =============================================================================

/// SQL text with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

impl Statement {
    /// Driver arguments for the bound parameters.
    #[must_use]
    pub fn arguments(&self) -> AnyArguments<'_> {
        let mut args = AnyArguments::default();
        for value in &self.binds {
            value.bind_to(&mut args);
        }
        args
    }

    /// Append a `RETURNING` clause for `column`.
    #[must_use]
    pub fn returning(mut self, column: &str) -> Self {
        self.sql.push_str(" RETURNING ");
        self.sql.push_str(&quote_ident(column));
        self
    }
}

/// Quote a possibly dotted identifier, e.g. `posts.id` → `` `posts`.`id` ``.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    name.split('.')
        .map(|part| format!("`{}`", part.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(".")
}

/// `INSERT` of the given columns.
pub fn insert_statement(table: &str, values: &Fields) -> StorageResult<Statement> {
    if values.is_empty() {
        return Err(StorageError::EmptyChanges);
    }
    validate_filter(values)?;

    let columns: Vec<String> = values.keys().map(quote_ident).collect();
    let placeholders = vec!["?"; values.len()].join(", ");

    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns.join(", "),
            placeholders
        ),
        binds: values.iter().map(|(_, v)| v.clone()).collect(),
    })
}

/// Rows of `relation` referencing any of `keys`.
#[must_use]
pub fn related_statement(relation: &Relation, keys: &[i64]) -> Statement {
    assert!(!keys.is_empty(), "related rows need at least one parent key");

    let placeholders = vec!["?"; keys.len()].join(",");
    Statement {
        sql: format!(
            "SELECT * FROM {} WHERE {} IN ({})",
            quote_ident(relation.table),
            quote_ident(relation.foreign_key),
            placeholders
        ),
        binds: keys.iter().map(|k| Value::Int(*k)).collect(),
    }
}

// =============================================================================
// Scope
// =============================================================================

/// A compiled, not yet executed, query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    table: &'static str,
    primary_key: &'static str,
    conditions: Vec<(String, Value)>,
    order: Vec<(String, Option<SortOrder>)>,
    window: Option<Window>,
}

impl Scope {
    /// Unconditioned scope over a table.
    #[must_use]
    pub fn new(table: &'static str, primary_key: &'static str) -> Self {
        Self {
            table,
            primary_key,
            conditions: Vec::new(),
            order: Vec::new(),
            window: None,
        }
    }

    /// Unconditioned scope over a model's table.
    #[must_use]
    pub fn of<M: Model>() -> Self {
        Self::new(M::TABLE, M::PRIMARY_KEY)
    }

    /// Compile a list query: filter, then sort, then pagination.
    pub fn compile<M: Model>(query: &Query) -> StorageResult<Self> {
        let scope = Self::of::<M>().filter(&query.filter)?.sort(&query.sort)?;
        Ok(scope.paginate(query.page, query.size))
    }

    /// AND equality conditions for every entry of `filter`.
    pub fn filter(mut self, filter: &Fields) -> StorageResult<Self> {
        validate_filter(filter)?;
        self.conditions
            .extend(filter.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(self)
    }

    /// Restrict to one primary key.
    #[must_use]
    pub fn key(mut self, id: i64) -> Self {
        self.conditions
            .push((self.primary_key.to_string(), Value::Int(id)));
        self
    }

    /// Append one order term per entry; directions are taken as written.
    ///
    /// A blank direction leaves the term bare, so the engine's ascending
    /// default applies.
    pub fn sort(mut self, sort: &BTreeMap<String, String>) -> StorageResult<Self> {
        validate_columns(sort.keys().map(String::as_str))?;
        for (column, direction) in sort {
            let order = if direction.trim().is_empty() {
                None
            } else {
                let order = direction.trim().parse::<SortOrder>().map_err(|()| {
                    StorageError::InvalidSortOrder {
                        column: column.clone(),
                        order: direction.clone(),
                    }
                })?;
                Some(order)
            };
            self.order.push((column.clone(), order));
        }
        Ok(self)
    }

    /// Limit to one page; non-positive arguments disable pagination.
    #[must_use]
    pub fn paginate(mut self, page: i64, size: i64) -> Self {
        self.window = Window::new(page, size);
        self
    }

    #[must_use]
    pub fn table(&self) -> &'static str {
        self.table
    }

    #[must_use]
    pub fn window(&self) -> Option<Window> {
        self.window
    }

    /// Row count under the conditions only.
    #[must_use]
    pub fn count(&self) -> Statement {
        let mut binds = Vec::new();
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            quote_ident(self.table),
            self.where_clause(&mut binds)
        );
        Statement { sql, binds }
    }

    /// Full rows with order and window applied.
    #[must_use]
    pub fn select(&self) -> Statement {
        self.select_columns("*")
    }

    /// Primary keys with order and window applied.
    #[must_use]
    pub fn select_keys(&self) -> Statement {
        self.select_columns(&quote_ident(self.primary_key))
    }

    /// First row by primary key.
    #[must_use]
    pub fn first(&self) -> Statement {
        let mut binds = Vec::new();
        let sql = format!(
            "SELECT * FROM {}{} ORDER BY {} LIMIT 1",
            quote_ident(self.table),
            self.where_clause(&mut binds),
            quote_ident(self.primary_key)
        );
        Statement { sql, binds }
    }

    /// `UPDATE` of the matching rows.
    pub fn update(&self, changes: &Fields) -> StorageResult<Statement> {
        if changes.is_empty() {
            return Err(StorageError::EmptyChanges);
        }
        validate_filter(changes)?;

        let assignments: Vec<String> = changes
            .keys()
            .map(|column| format!("{} = ?", quote_ident(column)))
            .collect();
        let mut binds: Vec<Value> = changes.iter().map(|(_, v)| v.clone()).collect();
        let sql = format!(
            "UPDATE {} SET {}{}",
            quote_ident(self.table),
            assignments.join(", "),
            self.where_clause(&mut binds)
        );
        Ok(Statement { sql, binds })
    }

    /// `DELETE` of the matching rows.
    #[must_use]
    pub fn delete(&self) -> Statement {
        let mut binds = Vec::new();
        let sql = format!(
            "DELETE FROM {}{}",
            quote_ident(self.table),
            self.where_clause(&mut binds)
        );
        Statement { sql, binds }
    }

    fn select_columns(&self, columns: &str) -> Statement {
        let mut binds = Vec::new();
        let mut sql = format!(
            "SELECT {} FROM {}{}",
            columns,
            quote_ident(self.table),
            self.where_clause(&mut binds)
        );

        if !self.order.is_empty() {
            let terms: Vec<String> = self
                .order
                .iter()
                .map(|(column, order)| match order {
                    Some(order) => format!("{} {}", quote_ident(column), order),
                    None => quote_ident(column),
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(window) = self.window {
            sql.push_str(" LIMIT ? OFFSET ?");
            binds.push(Value::Int(window.limit));
            binds.push(Value::Int(window.offset));
        }

        Statement { sql, binds }
    }

    fn where_clause(&self, binds: &mut Vec<Value>) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }

        let terms: Vec<String> = self
            .conditions
            .iter()
            .map(|(column, value)| {
                debug_assert!(is_valid_column_name(column));
                if value.is_null() {
                    format!("{} IS NULL", quote_ident(column))
                } else {
                    binds.push(value.clone());
                    format!("{} = ?", quote_ident(column))
                }
            })
            .collect();

        format!(" WHERE {}", terms.join(" AND "))
    }
}

// =============================================================================
// Tests
// =============================================================================
