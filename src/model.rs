//! Entity Models
//!
//! TigerStyle: Entities declare their table, key, columns and relations
//! explicitly; the facade never inspects them at runtime.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Debug, Default, sqlx::FromRow)]
//! struct Post {
//!     id: i64,
//!     title: String,
//!     #[sqlx(skip)]
//!     comments: Vec<Comment>,
//! }
//!
//! impl Model for Post {
//!     const TABLE: &'static str = "posts";
//!
//!     fn id(&self) -> i64 { self.id }
//!     fn set_id(&mut self, id: i64) { self.id = id; }
//!     fn values(&self) -> Fields { Fields::new().with("title", self.title.as_str()) }
//!     fn relations() -> &'static [Relation] { &[Relation::has_many("comments", "comments", "post_id")] }
//!     fn attach(&mut self, relation: &str, rows: &[AnyRow]) -> Result<(), sqlx::Error> {
//!         if relation == "comments" {
//!             self.comments = rows.iter().map(Comment::from_row).collect::<Result<_, _>>()?;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use sqlx::any::AnyRow;
use sqlx::FromRow;

use crate::constants::PRIMARY_KEY_DEFAULT;
use crate::value::Fields;

// =============================================================================
// Relation
// =============================================================================

/// A has-many relation: rows of `table` whose `foreign_key` holds the
/// parent's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// Name used by `Query::preload` and `Query::association_key`
    pub name: &'static str,
    /// Related table
    pub table: &'static str,
    /// Column in `table` referencing the parent
    pub foreign_key: &'static str,
}

impl Relation {
    /// Declare a has-many relation.
    #[must_use]
    pub const fn has_many(
        name: &'static str,
        table: &'static str,
        foreign_key: &'static str,
    ) -> Self {
        Self {
            name,
            table,
            foreign_key,
        }
    }
}

/// Find a relation by name.
#[must_use]
pub fn find_relation(relations: &'static [Relation], name: &str) -> Option<&'static Relation> {
    relations.iter().find(|r| r.name == name)
}

// =============================================================================
// Model
// =============================================================================

/// A persisted entity.
pub trait Model: for<'r> FromRow<'r, AnyRow> + Send + Sync + Unpin + 'static {
    /// Table holding this entity.
    const TABLE: &'static str;

    /// Primary key column.
    const PRIMARY_KEY: &'static str = PRIMARY_KEY_DEFAULT;

    /// Current primary key; 0 before the first insert.
    fn id(&self) -> i64;

    /// Store the primary key assigned by the database.
    fn set_id(&mut self, id: i64);

    /// User-set columns, excluding the primary key.
    fn values(&self) -> Fields;

    /// Declared relations, available to preload and association queries.
    fn relations() -> &'static [Relation] {
        &[]
    }

    /// Decode preloaded rows of `relation` into this entity.
    ///
    /// Called once per parent with the rows referencing it, possibly none.
    fn attach(&mut self, relation: &str, rows: &[AnyRow]) -> Result<(), sqlx::Error> {
        let _ = (relation, rows);
        Ok(())
    }
}
