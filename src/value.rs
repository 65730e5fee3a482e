//! Values and Column Maps
//!
//! TigerStyle: Explicit scalar types; every value reaches the database as a
//! bound parameter, never as SQL text.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};
use sqlx::any::AnyArguments;
use sqlx::Arguments;

// =============================================================================
// Value
// =============================================================================

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Arrays and objects, bound as their JSON text
    Json(serde_json::Value),
}

impl Value {
    /// Append this value to a statement's argument list.
    pub(crate) fn bind_to(&self, args: &mut AnyArguments<'_>) {
        match self {
            Self::Null => args.add(Option::<i64>::None),
            Self::Bool(v) => args.add(*v),
            Self::Int(v) => args.add(*v),
            Self::Float(v) => args.add(*v),
            Self::Text(v) => args.add(v.clone()),
            Self::Bytes(v) => args.add(v.clone()),
            Self::Json(v) => args.add(v.to_string()),
        }
    }

    /// True for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Int(i) => Self::from(i),
            Value::Float(f) => Self::from(f),
            Value::Text(s) => Self::String(s),
            Value::Bytes(b) => Self::from(b),
            Value::Json(j) => j,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// =============================================================================
// Fields
// =============================================================================

/// Column name to value mapping.
///
/// Keys iterate in sorted order, so statements built from the same mapping
/// always have the same text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields {
    inner: BTreeMap<String, Value>,
}

/// Equality conditions keyed by column.
pub type Filter = Fields;

/// Column assignments for an update.
pub type Changes = Fields;

impl Fields {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, builder style.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Add or replace a column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.insert(column.into(), value.into())
    }

    /// Look up a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.inner.get(column)
    }

    /// Remove a column.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.inner.remove(column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Column names in iteration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Entries in iteration order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.inner.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Fields {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================
