//! Column codecs shared by every entity mapping.
//!
//! UUIDs are stored as hyphenated lowercase text and timestamps as epoch
//! milliseconds, matching the schema in `migrations/`.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::Row;
use uuid::Uuid;

/// Current wall clock in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Renders epoch milliseconds as an RFC 3339 UTC string.
///
/// Out-of-range values render as an empty string instead of failing the
/// projection.
pub fn format_epoch_ms(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|value| value.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

pub fn uuid_value(id: Uuid) -> Value {
    Value::Text(id.to_string())
}

pub fn opt_uuid_value(id: Option<Uuid>) -> Value {
    id.map_or(Value::Null, uuid_value)
}

pub fn bool_value(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

/// Reads a non-null UUID column by name.
pub fn read_uuid(row: &Row<'_>, column: &str) -> rusqlite::Result<Uuid> {
    let index = row.as_ref().column_index(column)?;
    let text: String = row.get(index)?;
    parse_uuid(index, &text)
}

/// Reads a nullable UUID column by name.
pub fn read_opt_uuid(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<Uuid>> {
    let index = row.as_ref().column_index(column)?;
    match row.get::<_, Option<String>>(index)? {
        Some(text) => parse_uuid(index, &text).map(Some),
        None => Ok(None),
    }
}

fn parse_uuid(index: usize, text: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}
