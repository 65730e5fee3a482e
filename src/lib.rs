//! Storekeep - Engine-Agnostic Persistence Facade
//!
//! TigerStyle: One CRUD surface over interchangeable relational engines,
//! with every caller-supplied column name checked before it reaches SQL.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Storage (SqlStorage)                  │
//! │  create · get · get_by · update · update_by · delete ·    │
//! │  delete_by · list · list_with · client                    │
//! ├──────────────────────────────────────────────────────────┤
//! │  filter       │ column-name validation                    │
//! │  query        │ Scope → WHERE / ORDER BY / LIMIT OFFSET   │
//! │  association  │ association > preload > all > plain       │
//! │  context      │ cancellation, deadlines, trace ids        │
//! ├──────────────────────────────────────────────────────────┤
//! │  connection   │ ConnectionFactory → Client (AnyPool)      │
//! │               │ SQLite file  |  MySQL server              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use storekeep::{Context, Fields, Query, SqlConfig, SqlStorage, Storage};
//! # use storekeep::Model;
//! # #[derive(sqlx::FromRow)]
//! # struct User { id: i64, name: String }
//! # impl Model for User {
//! #     const TABLE: &'static str = "users";
//! #     fn id(&self) -> i64 { self.id }
//! #     fn set_id(&mut self, id: i64) { self.id = id; }
//! #     fn values(&self) -> Fields { Fields::new().with("name", self.name.as_str()) }
//! # }
//!
//! # async fn run() -> storekeep::StorageResult<()> {
//! let cfg = SqlConfig::builder().database("./app.db").build().expect("config");
//! let storage = SqlStorage::connect(&cfg).await;
//! let ctx = Context::background();
//!
//! let mut user = User { id: 0, name: "ada".into() };
//! storage.create(&ctx, &mut user).await?;
//!
//! let mut users: Vec<User> = Vec::new();
//! let query = Query::new().with_filter("name", "ada").paginate(1, 20);
//! let total = storage.list(&ctx, &query, &mut users).await?;
//! # let _ = total;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod association;
pub mod config;
pub mod connection;
pub mod constants;
pub mod context;
pub mod error;
pub mod filter;
pub mod model;
pub mod query;
pub mod request;
pub mod storage;
mod trace;
pub mod value;

// Re-export common types
pub use association::FetchStrategy;
pub use config::{Engine, SqlConfig, SqlConfigBuilder};
pub use connection::{open, open_or_exit, Client, ConnectionFactory};
pub use context::{CancelHandle, Context};
pub use error::{ConfigError, ConnectError, ErrorKind, StorageError, StorageResult};
pub use filter::{is_valid_column_name, validate_filter};
pub use model::{Model, Relation};
pub use query::{Query, Scope, SortOrder, Statement, Window};
pub use request::PageRequest;
pub use storage::{SqlStorage, Storage};
pub use value::{Changes, Fields, Filter, Value};
