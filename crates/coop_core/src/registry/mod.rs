//! Generic per-entity persistence and change notification.
//!
//! # Responsibility
//! - Give every [`Entity`] typed CRUD, dynamic filtering, paging, relation
//!   preloading, DTO projection and topic dispatch without per-entity SQL.
//!
//! # Invariants
//! - A registry holds no per-call mutable state; it is shared behind `Arc`.
//! - Reads never return soft-deleted rows.
//! - Topics and payloads are computed from the persisted state, after the
//!   storage write succeeded. A failed write dispatches nothing.
//! - `*_with_tx` variants never commit or roll back the caller's transaction.
//! - Dispatch is not transactional with storage: non-tx mutations commit and
//!   then report `Dispatch` errors; `*_with_tx` mutations log them.

mod cache;
mod descriptor;
mod error;
mod handle;
mod preload;
mod sql;

pub use cache::RegistryCache;
pub use descriptor::{DeleteMode, Descriptor};
pub use error::{RegistryError, RegistryErrorKind, RegistryResult};
pub use handle::QueryHandle;
pub use preload::Relation;

use crate::context::Context;
use crate::db::value::{now_epoch_ms, opt_uuid_value, uuid_value};
use crate::model::{is_zero_value, Entity};
use crate::query::compiler::all_columns;
use crate::query::{
    compile, EntitySchema, FilterClause, FilterValue, Page, PageRequest, SortClause,
};
use crate::topic::{Action, Broker, DispatchError, TopicDispatcher};
use error::KindResult;
use log::{debug, info, warn};
use preload::{load_paths, merge_preloads, validate_paths};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sql::{query_count, query_entities, Statements};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Typed registry over model `T`, response DTO `R` and request DTO `Q`.
pub struct Registry<T: Entity, R, Q = ()> {
    descriptor: Descriptor<T, R>,
    dispatcher: TopicDispatcher,
    schema: EntitySchema,
    relations: Vec<Relation<T>>,
    statements: Statements,
    _request: PhantomData<fn() -> Q>,
}

impl<T: Entity, R: Serialize, Q> Registry<T, R, Q> {
    pub fn new(descriptor: Descriptor<T, R>, broker: Arc<dyn Broker>) -> Self {
        Self {
            descriptor,
            dispatcher: TopicDispatcher::new(broker),
            schema: EntitySchema::of::<T>(),
            relations: T::relations(),
            statements: Statements::of::<T>(),
            _request: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &Descriptor<T, R> {
        &self.descriptor
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Inserts `data` in its own transaction, then dispatches Created topics.
    ///
    /// A nil id is replaced with a fresh v4 id; audit timestamps are set.
    pub fn create(&self, ctx: &Context, conn: &mut Connection, data: &mut T) -> RegistryResult<()> {
        let started_at = Instant::now();
        self.in_own_tx(ctx, conn, "create", started_at, |conn| self.insert_row(conn, data))?;
        self.log_mutation("create", data.id(), started_at);
        self.notify_strict("create", Action::Create, data, started_at)
    }

    /// Inserts `data` inside the caller's transaction.
    pub fn create_with_tx(
        &self,
        ctx: &Context,
        tx: &Transaction<'_>,
        data: &mut T,
    ) -> RegistryResult<()> {
        let started_at = Instant::now();
        self.run(ctx, tx, "create_with_tx", started_at, |conn| {
            self.insert_row(conn, data)
        })?;
        self.log_mutation("create_with_tx", data.id(), started_at);
        self.notify_lenient("create_with_tx", Action::Create, data);
        Ok(())
    }

    /// Full-row update by id in its own transaction.
    ///
    /// On success `data` holds the persisted row.
    pub fn update_by_id(
        &self,
        ctx: &Context,
        conn: &mut Connection,
        id: Uuid,
        data: &mut T,
    ) -> RegistryResult<()> {
        let started_at = Instant::now();
        self.in_own_tx(ctx, conn, "update_by_id", started_at, |conn| {
            self.update_row(conn, id, data)
        })?;
        self.log_mutation("update_by_id", id, started_at);
        self.notify_strict("update_by_id", Action::Update, data, started_at)
    }

    pub fn update_by_id_with_tx(
        &self,
        ctx: &Context,
        tx: &Transaction<'_>,
        id: Uuid,
        data: &mut T,
    ) -> RegistryResult<()> {
        let started_at = Instant::now();
        self.run(ctx, tx, "update_by_id_with_tx", started_at, |conn| {
            self.update_row(conn, id, data)
        })?;
        self.log_mutation("update_by_id_with_tx", id, started_at);
        self.notify_lenient("update_by_id_with_tx", Action::Update, data);
        Ok(())
    }

    /// Deletes by id in its own transaction and returns the removed row.
    pub fn delete(&self, ctx: &Context, conn: &mut Connection, id: Uuid) -> RegistryResult<T> {
        let started_at = Instant::now();
        let removed = self.in_own_tx(ctx, conn, "delete", started_at, |conn| {
            self.delete_row(conn, id)
        })?;
        self.log_mutation("delete", id, started_at);
        self.notify_strict("delete", Action::Delete, &removed, started_at)?;
        Ok(removed)
    }

    pub fn delete_with_tx(
        &self,
        ctx: &Context,
        tx: &Transaction<'_>,
        id: Uuid,
    ) -> RegistryResult<T> {
        let started_at = Instant::now();
        let removed = self.run(ctx, tx, "delete_with_tx", started_at, |conn| {
            self.delete_row(conn, id)
        })?;
        self.log_mutation("delete_with_tx", id, started_at);
        self.notify_lenient("delete_with_tx", Action::Delete, &removed);
        Ok(removed)
    }

    /// Live row by id with default preloads.
    pub fn get_by_id(&self, ctx: &Context, conn: &Connection, id: Uuid) -> RegistryResult<T> {
        self.run(ctx, conn, "get_by_id", Instant::now(), |conn| {
            let preloads = self.preloads(&[])?;
            let mut row = self.fetch_by_id(conn, id)?;
            load_paths(&self.relations, conn, std::slice::from_mut(&mut row), &preloads)?;
            Ok(row)
        })
    }

    /// Query by example: every non-zero column of `example` is an equality
    /// filter.
    ///
    /// Zero values (`false`, `0`, empty text, nil ids) mean "not filtered",
    /// so they cannot be searched for; use [`Registry::arr_find`] instead.
    pub fn find(&self, ctx: &Context, conn: &Connection, example: &T) -> RegistryResult<Vec<T>> {
        self.run(ctx, conn, "find", Instant::now(), |conn| {
            let preloads = self.preloads(&[])?;
            self.fetch(conn, &self.example_filters(example), &[], &preloads, None)
        })
    }

    pub fn find_one(&self, ctx: &Context, conn: &Connection, example: &T) -> RegistryResult<T> {
        self.run(ctx, conn, "find_one", Instant::now(), |conn| {
            let preloads = self.preloads(&[])?;
            self.fetch(conn, &self.example_filters(example), &[], &preloads, Some((1, 0)))?
                .into_iter()
                .next()
                .ok_or(RegistryErrorKind::NotFound(None))
        })
    }

    pub fn count(&self, ctx: &Context, conn: &Connection, example: &T) -> RegistryResult<i64> {
        self.run(ctx, conn, "count", Instant::now(), |conn| {
            self.count_rows(conn, &self.example_filters(example))
        })
    }

    /// Every live row, newest first.
    pub fn list(&self, ctx: &Context, conn: &Connection) -> RegistryResult<Vec<T>> {
        self.run(ctx, conn, "list", Instant::now(), |conn| {
            let preloads = self.preloads(&[])?;
            self.fetch(conn, &[], &[], &preloads, None)
        })
    }

    /// Dynamic query: filters are ANDed, sorts applied in order, and
    /// `preloads` are added to the default preloads for this call.
    pub fn arr_find(
        &self,
        ctx: &Context,
        conn: &Connection,
        filters: &[FilterClause],
        sorts: &[SortClause],
        preloads: &[&str],
    ) -> RegistryResult<Vec<T>> {
        self.run(ctx, conn, "arr_find", Instant::now(), |conn| {
            let preloads = self.preloads(preloads)?;
            self.fetch(conn, filters, sorts, &preloads, None)
        })
    }

    pub fn arr_find_one(
        &self,
        ctx: &Context,
        conn: &Connection,
        filters: &[FilterClause],
        sorts: &[SortClause],
        preloads: &[&str],
    ) -> RegistryResult<T> {
        self.run(ctx, conn, "arr_find_one", Instant::now(), |conn| {
            let preloads = self.preloads(preloads)?;
            self.fetch(conn, filters, sorts, &preloads, Some((1, 0)))?
                .into_iter()
                .next()
                .ok_or(RegistryErrorKind::NotFound(None))
        })
    }

    pub fn arr_count(
        &self,
        ctx: &Context,
        conn: &Connection,
        filters: &[FilterClause],
    ) -> RegistryResult<i64> {
        self.run(ctx, conn, "arr_count", Instant::now(), |conn| {
            self.count_rows(conn, filters)
        })
    }

    /// One page of [`Registry::arr_find`] results plus the total count.
    pub fn find_page(
        &self,
        ctx: &Context,
        conn: &Connection,
        filters: &[FilterClause],
        sorts: &[SortClause],
        page: PageRequest,
    ) -> RegistryResult<Page<T>> {
        self.run(ctx, conn, "find_page", Instant::now(), |conn| {
            let preloads = self.preloads(&[])?;
            let total = self.count_rows(conn, filters)?;
            let offset = page.offset();
            if i64::try_from(offset).map_or(true, |offset| offset >= total) {
                return Ok(Page::new(Vec::new(), page, total));
            }
            let window = (page.page_size(), offset);
            let rows = self.fetch(conn, filters, sorts, &preloads, Some(window))?;
            Ok(Page::new(rows, page, total))
        })
    }

    /// Projects one model; `None` in, `None` out.
    pub fn to_model(&self, data: Option<&T>) -> Option<R> {
        data.map(self.descriptor.resource)
    }

    /// Projects a list of models; `None` in, `None` out.
    pub fn to_models(&self, data: Option<&[T]>) -> Option<Vec<R>> {
        data.map(|rows| rows.iter().map(self.descriptor.resource).collect())
    }

    /// Read-only raw access for grouped or aggregate reporting queries.
    pub fn client<'a>(&'a self, ctx: &Context, conn: &'a Connection) -> QueryHandle<'a> {
        QueryHandle::new(ctx.clone(), conn, &self.schema)
    }

    fn run<U>(
        &self,
        ctx: &Context,
        conn: &Connection,
        operation: &'static str,
        started_at: Instant,
        f: impl FnOnce(&Connection) -> KindResult<U>,
    ) -> RegistryResult<U> {
        if ctx.is_done() {
            return Err(self.fail(operation, started_at, RegistryErrorKind::Cancelled));
        }
        let result = {
            let _guard = ctx.interrupt_on(conn);
            f(conn)
        };
        result.map_err(|kind| self.fail(operation, started_at, kind))
    }

    fn in_own_tx<U>(
        &self,
        ctx: &Context,
        conn: &mut Connection,
        operation: &'static str,
        started_at: Instant,
        f: impl FnOnce(&Connection) -> KindResult<U>,
    ) -> RegistryResult<U> {
        if ctx.is_done() {
            return Err(self.fail(operation, started_at, RegistryErrorKind::Cancelled));
        }
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| self.fail(operation, started_at, err.into()))?;
        let value = self.run(ctx, &tx, operation, started_at, f)?;
        tx.commit()
            .map_err(|err| self.fail(operation, started_at, err.into()))?;
        Ok(value)
    }

    fn fail(
        &self,
        operation: &'static str,
        started_at: Instant,
        kind: RegistryErrorKind,
    ) -> RegistryError {
        let err = RegistryError::new(T::NAME, operation, kind);
        if err.is_not_found() {
            debug!(
                "event=registry_op module=registry status=not_found entity={} op={} duration_ms={}",
                T::NAME,
                operation,
                started_at.elapsed().as_millis()
            );
        } else {
            warn!(
                "event=registry_op module=registry status=error entity={} op={} duration_ms={} error_code={} error={}",
                T::NAME,
                operation,
                started_at.elapsed().as_millis(),
                err.code(),
                err.kind
            );
        }
        err
    }

    fn log_mutation(&self, operation: &'static str, id: Uuid, started_at: Instant) {
        info!(
            "event=registry_op module=registry status=ok entity={} op={} id={} duration_ms={}",
            T::NAME,
            operation,
            id,
            started_at.elapsed().as_millis()
        );
    }

    fn notify(&self, action: Action, data: &T) -> Result<(), DispatchError> {
        let topics = self.descriptor.topics(action, data);
        let payload = (self.descriptor.resource)(data);
        self.dispatcher.dispatch(&topics, &payload)
    }

    fn notify_strict(
        &self,
        operation: &'static str,
        action: Action,
        data: &T,
        started_at: Instant,
    ) -> RegistryResult<()> {
        self.notify(action, data)
            .map_err(|err| self.fail(operation, started_at, err.into()))
    }

    fn notify_lenient(&self, operation: &'static str, action: Action, data: &T) {
        if let Err(err) = self.notify(action, data) {
            warn!(
                "event=registry_dispatch module=registry status=error entity={} op={} id={} error={}",
                T::NAME,
                operation,
                data.id(),
                err
            );
        }
    }

    fn preloads(&self, extras: &[&str]) -> KindResult<Vec<String>> {
        let merged = merge_preloads(&self.descriptor.preloads, extras);
        validate_paths(&self.relations, &merged)?;
        Ok(merged)
    }

    fn example_filters(&self, example: &T) -> Vec<FilterClause> {
        let mut values = example.record().values();
        values.extend(example.values());
        all_columns::<T>()
            .into_iter()
            .zip(values)
            .filter(|(_, value)| !is_zero_value(value))
            .map(|(column, value)| FilterClause::eq(column, FilterValue::Scalar(value)))
            .collect()
    }

    fn fetch(
        &self,
        conn: &Connection,
        filters: &[FilterClause],
        sorts: &[SortClause],
        preloads: &[String],
        window: Option<(usize, usize)>,
    ) -> KindResult<Vec<T>> {
        let compiled = compile(&self.schema, filters, sorts)?;
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            self.statements.columns,
            compiled.from_sql(T::TABLE),
            compiled.where_sql(&self.statements.live),
            compiled.order_sql()
        );
        let mut params = compiled.params;
        if let Some((limit, offset)) = window {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
            params.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
        }
        let mut rows = query_entities::<T>(conn, &sql, params)?;
        load_paths(&self.relations, conn, &mut rows, preloads)?;
        Ok(rows)
    }

    fn count_rows(&self, conn: &Connection, filters: &[FilterClause]) -> KindResult<i64> {
        let compiled = compile(&self.schema, filters, &[])?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {};",
            compiled.from_sql(T::TABLE),
            compiled.where_sql(&self.statements.live)
        );
        query_count(conn, &sql, compiled.params)
    }

    fn fetch_by_id(&self, conn: &Connection, id: Uuid) -> KindResult<T> {
        let filters = [FilterClause::eq("id", id)];
        self.fetch(conn, &filters, &[], &[], Some((1, 0)))?
            .into_iter()
            .next()
            .ok_or(RegistryErrorKind::NotFound(Some(id)))
    }

    fn insert_row(&self, conn: &Connection, data: &mut T) -> KindResult<()> {
        let now = now_epoch_ms();
        let record = data.record_mut();
        if record.id.is_nil() {
            record.id = Uuid::new_v4();
        }
        if record.created_at == 0 {
            record.created_at = now;
        }
        record.updated_at = now;
        record.deleted_at = None;
        if record.updated_by_id.is_none() {
            record.updated_by_id = record.created_by_id;
        }

        let mut params = data.record().values();
        params.extend(data.values());
        conn.execute(&self.statements.insert, params_from_iter(params))?;
        Ok(())
    }

    fn update_row(&self, conn: &Connection, id: Uuid, data: &mut T) -> KindResult<()> {
        let now = now_epoch_ms();
        {
            let record = data.record_mut();
            record.id = id;
            record.updated_at = now;
        }

        let mut params = vec![
            Value::Integer(now),
            opt_uuid_value(data.record().updated_by_id),
        ];
        params.extend(data.values());
        params.push(uuid_value(id));
        let changed = conn.execute(&self.statements.update, params_from_iter(params))?;
        if changed == 0 {
            return Err(RegistryErrorKind::NotFound(Some(id)));
        }

        *data = self.fetch_by_id(conn, id)?;
        Ok(())
    }

    fn delete_row(&self, conn: &Connection, id: Uuid) -> KindResult<T> {
        let mut existing = self.fetch_by_id(conn, id)?;
        match self.descriptor.delete_mode {
            DeleteMode::Soft => {
                let now = now_epoch_ms();
                let changed = conn.execute(
                    &self.statements.soft_delete,
                    [Value::Integer(now), uuid_value(id)],
                )?;
                if changed == 0 {
                    return Err(RegistryErrorKind::NotFound(Some(id)));
                }
                let record = existing.record_mut();
                record.deleted_at = Some(now);
                record.updated_at = now;
            }
            DeleteMode::Hard => {
                conn.execute(&self.statements.hard_delete, [uuid_value(id)])?;
            }
        }
        Ok(existing)
    }
}

impl<T: Entity, R: Serialize, Q: DeserializeOwned> Registry<T, R, Q> {
    /// Decodes a wire request body into the request DTO of this registry.
    pub fn decode_request(&self, body: serde_json::Value) -> serde_json::Result<Q> {
        serde_json::from_value(body)
    }
}
