//! SQL text shared by registry reads, writes and preloads.

use super::error::KindResult;
use crate::model::{Entity, Record, SYSTEM_COLUMNS};
use crate::query::compiler::{all_columns, quote};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

/// Statements rendered once per registry.
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    pub columns: String,
    pub live: String,
    pub insert: String,
    pub update: String,
    pub soft_delete: String,
    pub hard_delete: String,
}

impl Statements {
    pub fn of<T: Entity>() -> Self {
        let table = quote(T::TABLE);
        let columns = all_columns::<T>();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let assignments = T::COLUMNS
            .iter()
            .map(|column| format!("{} = ?", quote(column)))
            .collect::<Vec<_>>();
        let mut update_set = vec![
            "\"updated_at\" = ?".to_string(),
            "\"updated_by_id\" = ?".to_string(),
        ];
        update_set.extend(assignments);

        Self {
            columns: select_list::<T>(),
            live: live_predicate(T::TABLE),
            insert: format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders});",
                columns
                    .iter()
                    .map(|column| quote(column))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            update: format!(
                "UPDATE {table} SET {} WHERE \"id\" = ? AND \"deleted_at\" IS NULL;",
                update_set.join(", ")
            ),
            soft_delete: format!(
                "UPDATE {table} SET \"deleted_at\" = ?1, \"updated_at\" = ?1 WHERE \"id\" = ?2 AND \"deleted_at\" IS NULL;"
            ),
            hard_delete: format!("DELETE FROM {table} WHERE \"id\" = ?;"),
        }
    }
}

/// `"table"."column", ...` for every column of `T`.
pub(crate) fn select_list<T: Entity>() -> String {
    let table = quote(T::TABLE);
    SYSTEM_COLUMNS
        .iter()
        .chain(T::COLUMNS.iter())
        .map(|column| format!("{table}.{}", quote(column)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn live_predicate(table: &str) -> String {
    format!("{}.\"deleted_at\" IS NULL", quote(table))
}

pub(crate) fn decode<T: Entity>(row: &Row<'_>) -> rusqlite::Result<T> {
    T::from_row(Record::from_row(row)?, row)
}

/// Runs `sql` and decodes every row as `T`.
pub(crate) fn query_entities<T: Entity>(
    conn: &Connection,
    sql: &str,
    params: Vec<Value>,
) -> KindResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params), decode::<T>)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub(crate) fn query_count(conn: &Connection, sql: &str, params: Vec<Value>) -> KindResult<i64> {
    let count = conn.query_row(sql, params_from_iter(params), |row| row.get::<_, i64>(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::Statements;
    use crate::entities::Bank;

    #[test]
    fn statements_bind_system_then_business_columns() {
        let statements = Statements::of::<Bank>();
        assert!(statements.insert.starts_with(
            "INSERT INTO \"banks\" (\"id\", \"created_at\", \"created_by_id\", \"updated_at\""
        ));
        assert!(statements
            .update
            .contains("\"updated_at\" = ?, \"updated_by_id\" = ?, \"organization_id\" = ?"));
        assert_eq!(statements.live, "\"banks\".\"deleted_at\" IS NULL");
    }
}
