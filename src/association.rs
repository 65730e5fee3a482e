//! Association Resolution
//!
//! TigerStyle: Exactly one fetch strategy per list call, chosen up front.
//!
//! Precedence:
//! 1. `association_key` → fetch related rows instead of the main rows
//! 2. `preload`         → main rows plus one named relation
//! 3. `all_preload`     → main rows plus every declared relation
//! 4. otherwise         → main rows only

use crate::error::{StorageError, StorageResult};
use crate::model::{find_relation, Relation};
use crate::query::Query;

/// How a list call fetches its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Rows of the relation referencing the selected main rows
    Association(&'static Relation),
    /// Main rows with one relation attached
    Preload(&'static Relation),
    /// Main rows with every relation attached
    PreloadAll(&'static [Relation]),
    /// Main rows only
    Plain,
}

impl FetchStrategy {
    /// Pick the strategy for `query` given the model's declared relations.
    pub fn resolve(query: &Query, relations: &'static [Relation]) -> StorageResult<Self> {
        if let Some(name) = non_empty(query.association_key.as_deref()) {
            return lookup(relations, name).map(Self::Association);
        }
        if let Some(name) = non_empty(query.preload.as_deref()) {
            return lookup(relations, name).map(Self::Preload);
        }
        if query.all_preload {
            return Ok(Self::PreloadAll(relations));
        }
        Ok(Self::Plain)
    }

    /// True when the main rows are not fetched.
    #[must_use]
    pub fn is_association(&self) -> bool {
        matches!(self, Self::Association(_))
    }

    /// Relations to attach after the main fetch.
    #[must_use]
    pub fn preloads(&self) -> &'static [Relation] {
        match self {
            Self::Preload(rel) => std::slice::from_ref(*rel),
            Self::PreloadAll(rels) => *rels,
            Self::Association(_) | Self::Plain => &[],
        }
    }
}

fn non_empty(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty())
}

fn lookup(relations: &'static [Relation], name: &str) -> StorageResult<&'static Relation> {
    find_relation(relations, name).ok_or_else(|| StorageError::UnknownRelation(name.to_string()))
}
