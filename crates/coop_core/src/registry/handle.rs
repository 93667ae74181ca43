//! Read-only escape hatch for reporting queries.

use super::error::{RegistryError, RegistryErrorKind, RegistryResult};
use super::sql::live_predicate;
use crate::context::Context;
use crate::query::compiler::quote;
use crate::query::{compile, EntitySchema, FilterClause, SchemaError};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Params, Row};

const OPERATION: &str = "client";

/// Raw SQL access to one entity table, limited to read-only statements.
pub struct QueryHandle<'a> {
    ctx: Context,
    conn: &'a Connection,
    schema: &'a EntitySchema,
}

impl<'a> QueryHandle<'a> {
    pub(crate) fn new(ctx: Context, conn: &'a Connection, schema: &'a EntitySchema) -> Self {
        Self { ctx, conn, schema }
    }

    pub fn table(&self) -> &'static str {
        self.schema.table
    }

    /// Predicate that excludes soft-deleted rows, for hand-written SQL.
    pub fn live_predicate(&self) -> String {
        live_predicate(self.schema.table)
    }

    /// Runs a read-only statement and maps every row.
    ///
    /// # Errors
    /// - `SchemaError::ReadOnlyViolation` when `sql` could write.
    pub fn query<U, P, F>(&self, sql: &str, params: P, map: F) -> RegistryResult<Vec<U>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<U>,
    {
        self.run(|conn| {
            let mut stmt = conn.prepare(sql)?;
            if !stmt.readonly() {
                return Err(SchemaError::ReadOnlyViolation(sql.to_string()).into());
            }
            let rows = stmt.query_map(params, map)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    /// `GROUP BY column` counts over live rows matching `filters`.
    pub fn count_by(
        &self,
        column: &str,
        filters: &[FilterClause],
    ) -> RegistryResult<Vec<(Value, i64)>> {
        self.run(|conn| {
            let resolved = self
                .schema
                .resolve_column(column)
                .ok_or_else(|| SchemaError::UnknownField {
                    entity: self.schema.entity,
                    field: column.to_string(),
                })?;
            let compiled = compile(self.schema, filters, &[])?;
            let group = format!("{}.{}", quote(self.schema.table), quote(resolved));
            let sql = format!(
                "SELECT {group}, COUNT(*) FROM {} WHERE {} GROUP BY {group} ORDER BY {group};",
                compiled.from_sql(self.schema.table),
                compiled.where_sql(&self.live_predicate()),
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(compiled.params), |row| {
                Ok((row.get::<_, Value>(0)?, row.get::<_, i64>(1)?))
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    fn run<U>(
        &self,
        f: impl FnOnce(&Connection) -> Result<U, RegistryErrorKind>,
    ) -> RegistryResult<U> {
        if self.ctx.is_done() {
            return Err(self.error(RegistryErrorKind::Cancelled));
        }
        let _guard = self.ctx.interrupt_on(self.conn);
        f(self.conn).map_err(|kind| self.error(kind))
    }

    fn error(&self, kind: RegistryErrorKind) -> RegistryError {
        RegistryError::new(self.schema.entity, OPERATION, kind)
    }
}
