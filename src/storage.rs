//! Storage Facade
//!
//! TigerStyle: One CRUD surface, any supported engine.
//!
//! # Architecture
//!
//! ```text
//! caller ──► Storage (SqlStorage)
//!              │ validate keys            (filter)
//!              │ compile scope            (query)
//!              │ pick fetch strategy      (association, list only)
//!              ▼
//!            Context::run ──► Client (AnyPool) ──► SQLite | MySQL
//! ```
//!
//! # Error contract
//!
//! | Operation   | Zero rows matched        |
//! |-------------|--------------------------|
//! | `update`    | `Ok(())`                 |
//! | `update_by` | `Err(RecordNotFound)`    |
//! | `delete`    | `Ok(())`                 |
//! | `delete_by` | `Ok(())`, empty filter is `Err(EmptyFilter)` |
//!
//! Deletes are physical; there is no soft-delete column.

use std::collections::HashMap;
use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::any::{Any, AnyQueryResult, AnyRow};
use sqlx::{FromRow, Row};

use crate::association::FetchStrategy;
use crate::config::{Engine, SqlConfig};
use crate::connection::{self, Client};
use crate::context::Context;
use crate::error::{StorageError, StorageResult};
use crate::model::{Model, Relation};
use crate::query::{insert_statement, related_statement, Query, Scope, Statement};
use crate::trace;
use crate::value::{Changes, Filter};

// =============================================================================
// Storage Trait
// =============================================================================

/// Engine-independent CRUD operations.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Raw connection handle for anything the facade does not cover.
    fn client(&self) -> &Client;

    /// Insert `model`; a zero id is replaced with the generated key.
    async fn create<M: Model>(&self, ctx: &Context, model: &mut M) -> StorageResult<()>;

    /// Load one record by primary key.
    async fn get<M: Model>(&self, ctx: &Context, id: i64) -> StorageResult<M>;

    /// Load the first record matching `filter`.
    async fn get_by<M: Model>(&self, ctx: &Context, filter: &Filter) -> StorageResult<M>;

    /// Set `changes` on the record with `id`; matching nothing is not an error.
    async fn update<M: Model>(&self, ctx: &Context, id: i64, changes: &Changes)
        -> StorageResult<()>;

    /// Set `changes` on every record matching `filter`, returning the count.
    ///
    /// Matching nothing is [`StorageError::RecordNotFound`].
    async fn update_by<M: Model>(
        &self,
        ctx: &Context,
        filter: &Filter,
        changes: &Changes,
    ) -> StorageResult<u64>;

    /// Remove the record with `id`; removing nothing is not an error.
    async fn delete<M: Model>(&self, ctx: &Context, id: i64) -> StorageResult<()>;

    /// Remove every record matching a non-empty `filter`.
    async fn delete_by<M: Model>(&self, ctx: &Context, filter: &Filter) -> StorageResult<()>;

    /// Fill `items` with one page of records and return the filtered total.
    ///
    /// The total is only returned on success; when the count succeeds but a
    /// later fetch or preload fails, the error replaces it and `items` may
    /// already hold the main rows.
    async fn list<M: Model>(
        &self,
        ctx: &Context,
        query: &Query,
        items: &mut Vec<M>,
    ) -> StorageResult<i64>;

    /// Like [`Storage::list`], and fill `associated` when the query names an
    /// association key; `items` is left untouched in that case.
    async fn list_with<M: Model, A: Model>(
        &self,
        ctx: &Context,
        query: &Query,
        items: &mut Vec<M>,
        associated: &mut Vec<A>,
    ) -> StorageResult<i64>;
}

// =============================================================================
// SqlStorage
// =============================================================================

/// [`Storage`] over a shared [`Client`].
#[derive(Debug, Clone)]
pub struct SqlStorage {
    client: Client,
}

impl SqlStorage {
    /// Wrap an opened client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Open `cfg` and wrap it; exits the process if the database is unreachable.
    pub async fn connect(cfg: &SqlConfig) -> Self {
        Self::new(connection::open_or_exit(cfg).await)
    }

    async fn traced<T, F, R>(
        &self,
        ctx: &Context,
        stmt: &Statement,
        fut: F,
        rows: R,
    ) -> StorageResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
        R: FnOnce(&T) -> u64,
    {
        let started = Instant::now();
        let result = ctx.run(async { fut.await.map_err(StorageError::from) }).await;
        let elapsed = started.elapsed();

        let debug = self.client.is_debug();
        match &result {
            Ok(value) => trace::record(ctx, &stmt.sql, elapsed, Some(rows(value)), None, debug),
            Err(err) if err.is_not_found() => {
                trace::record(ctx, &stmt.sql, elapsed, Some(0), None, debug);
            }
            Err(err) => trace::record(ctx, &stmt.sql, elapsed, None, Some(err), debug),
        }
        result
    }

    async fn execute(&self, ctx: &Context, stmt: &Statement) -> StorageResult<AnyQueryResult> {
        let query = sqlx::query_with::<Any, _>(&stmt.sql, stmt.arguments());
        self.traced(ctx, stmt, query.execute(self.client.pool()), |r| {
            r.rows_affected()
        })
        .await
    }

    async fn fetch_one<T>(&self, ctx: &Context, stmt: &Statement) -> StorageResult<T>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let query = sqlx::query_as_with::<Any, T, _>(&stmt.sql, stmt.arguments());
        self.traced(ctx, stmt, query.fetch_one(self.client.pool()), |_| 1)
            .await
    }

    async fn fetch_all<T>(&self, ctx: &Context, stmt: &Statement) -> StorageResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let query = sqlx::query_as_with::<Any, T, _>(&stmt.sql, stmt.arguments());
        self.traced(ctx, stmt, query.fetch_all(self.client.pool()), |v| {
            v.len() as u64
        })
        .await
    }

    async fn fetch_rows(&self, ctx: &Context, stmt: &Statement) -> StorageResult<Vec<AnyRow>> {
        let query = sqlx::query_with::<Any, _>(&stmt.sql, stmt.arguments());
        self.traced(ctx, stmt, query.fetch_all(self.client.pool()), |v| {
            v.len() as u64
        })
        .await
    }

    async fn fetch_keys(&self, ctx: &Context, stmt: &Statement) -> StorageResult<Vec<i64>> {
        let query = sqlx::query_scalar_with::<Any, i64, _>(&stmt.sql, stmt.arguments());
        self.traced(ctx, stmt, query.fetch_all(self.client.pool()), |v| {
            v.len() as u64
        })
        .await
    }

    async fn fetch_key(&self, ctx: &Context, stmt: &Statement) -> StorageResult<i64> {
        let query = sqlx::query_scalar_with::<Any, i64, _>(&stmt.sql, stmt.arguments());
        self.traced(ctx, stmt, query.fetch_one(self.client.pool()), |_| 1)
            .await
    }

    async fn fetch_count(&self, ctx: &Context, stmt: &Statement) -> StorageResult<i64> {
        let query = sqlx::query_scalar_with::<Any, i64, _>(&stmt.sql, stmt.arguments());
        let total = self
            .traced(ctx, stmt, query.fetch_one(self.client.pool()), |_| 1)
            .await?;

        // Postcondition
        assert!(total >= 0, "count cannot be negative");
        Ok(total)
    }

    /// Attach the rows of `relation` to each parent in `items`.
    async fn preload<M: Model>(
        &self,
        ctx: &Context,
        relation: &'static Relation,
        items: &mut [M],
    ) -> StorageResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let keys: Vec<i64> = items.iter().map(Model::id).collect();
        let rows = self
            .fetch_rows(ctx, &related_statement(relation, &keys))
            .await?;

        let mut grouped: HashMap<i64, Vec<AnyRow>> = HashMap::new();
        for row in rows {
            let parent: i64 = row.try_get(relation.foreign_key)?;
            grouped.entry(parent).or_default().push(row);
        }

        for item in items.iter_mut() {
            let children = grouped.get(&item.id()).map_or(&[][..], Vec::as_slice);
            item.attach(relation.name, children)?;
        }
        Ok(())
    }

    async fn list_inner<M: Model, A: Model>(
        &self,
        ctx: &Context,
        query: &Query,
        items: &mut Vec<M>,
        associated: Option<&mut Vec<A>>,
    ) -> StorageResult<i64> {
        let scope = Scope::compile::<M>(query)?;
        let strategy = FetchStrategy::resolve(query, M::relations())?;

        if let FetchStrategy::Association(relation) = strategy {
            if associated.is_none() {
                return Err(StorageError::InvalidQuery(
                    "association query requires an association target".to_string(),
                ));
            }
            if relation.table != A::TABLE {
                return Err(StorageError::InvalidQuery(format!(
                    "association target table {} does not match relation {} ({})",
                    A::TABLE,
                    relation.name,
                    relation.table
                )));
            }
        }

        let total = self.fetch_count(ctx, &scope.count()).await?;

        match (strategy, associated) {
            (FetchStrategy::Association(relation), Some(target)) => {
                let keys = self.fetch_keys(ctx, &scope.select_keys()).await?;
                *target = if keys.is_empty() {
                    Vec::new()
                } else {
                    self.fetch_all(ctx, &related_statement(relation, &keys))
                        .await?
                };
            }
            (strategy, _) => {
                *items = self.fetch_all(ctx, &scope.select()).await?;
                for relation in strategy.preloads() {
                    self.preload(ctx, relation, items.as_mut_slice()).await?;
                }
            }
        }

        Ok(total)
    }
}

fn check_id(id: i64) -> StorageResult<()> {
    if id <= 0 {
        return Err(StorageError::InvalidId(id));
    }
    Ok(())
}

#[async_trait]
impl Storage for SqlStorage {
    fn client(&self) -> &Client {
        &self.client
    }

    async fn create<M: Model>(&self, ctx: &Context, model: &mut M) -> StorageResult<()> {
        let mut values = model.values();
        if model.id() != 0 {
            values.insert(M::PRIMARY_KEY, model.id());
        }

        let stmt = insert_statement(M::TABLE, &values)?;
        if model.id() != 0 {
            self.execute(ctx, &stmt).await?;
            return Ok(());
        }

        // The Any driver drops SQLite's rowid, so ask for the key directly.
        let id = match self.client.engine() {
            Engine::Sqlite => {
                self.fetch_key(ctx, &stmt.returning(M::PRIMARY_KEY))
                    .await?
            }
            Engine::MySql => self
                .execute(ctx, &stmt)
                .await?
                .last_insert_id()
                .ok_or(StorageError::MissingKey(M::TABLE))?,
        };
        if id <= 0 {
            return Err(StorageError::MissingKey(M::TABLE));
        }
        model.set_id(id);
        Ok(())
    }

    async fn get<M: Model>(&self, ctx: &Context, id: i64) -> StorageResult<M> {
        check_id(id)?;
        let stmt = Scope::of::<M>().key(id).first();
        let model: M = self.fetch_one(ctx, &stmt).await?;
        if model.id() != id {
            return Err(StorageError::InvalidQuery(format!(
                "{} row {} decoded with id {}; check the {} column mapping",
                M::TABLE,
                id,
                model.id(),
                M::PRIMARY_KEY
            )));
        }
        Ok(model)
    }

    async fn get_by<M: Model>(&self, ctx: &Context, filter: &Filter) -> StorageResult<M> {
        let stmt = Scope::of::<M>().filter(filter)?.first();
        self.fetch_one(ctx, &stmt).await
    }

    async fn update<M: Model>(
        &self,
        ctx: &Context,
        id: i64,
        changes: &Changes,
    ) -> StorageResult<()> {
        check_id(id)?;
        let stmt = Scope::of::<M>().key(id).update(changes)?;
        self.execute(ctx, &stmt).await?;
        Ok(())
    }

    async fn update_by<M: Model>(
        &self,
        ctx: &Context,
        filter: &Filter,
        changes: &Changes,
    ) -> StorageResult<u64> {
        let stmt = Scope::of::<M>().filter(filter)?.update(changes)?;
        let result = self.execute(ctx, &stmt).await?;

        match result.rows_affected() {
            0 => Err(StorageError::RecordNotFound),
            n => Ok(n),
        }
    }

    async fn delete<M: Model>(&self, ctx: &Context, id: i64) -> StorageResult<()> {
        check_id(id)?;
        let stmt = Scope::of::<M>().key(id).delete();
        self.execute(ctx, &stmt).await?;
        Ok(())
    }

    async fn delete_by<M: Model>(&self, ctx: &Context, filter: &Filter) -> StorageResult<()> {
        if filter.is_empty() {
            return Err(StorageError::EmptyFilter);
        }
        let stmt = Scope::of::<M>().filter(filter)?.delete();
        self.execute(ctx, &stmt).await?;
        Ok(())
    }

    async fn list<M: Model>(
        &self,
        ctx: &Context,
        query: &Query,
        items: &mut Vec<M>,
    ) -> StorageResult<i64> {
        self.list_inner::<M, M>(ctx, query, items, None).await
    }

    async fn list_with<M: Model, A: Model>(
        &self,
        ctx: &Context,
        query: &Query,
        items: &mut Vec<M>,
        associated: &mut Vec<A>,
    ) -> StorageResult<i64> {
        self.list_inner(ctx, query, items, Some(associated)).await
    }
}
