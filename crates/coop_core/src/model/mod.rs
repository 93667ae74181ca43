//! Storage model contract shared by every registry-managed entity.
//!
//! # Responsibility
//! - Define the system columns every entity table carries.
//! - Define how an entity binds to and decodes from its table row.
//! - Define the tenant scope dimensions used by filters and topics.
//!
//! # Invariants
//! - `Entity::COLUMNS` and `Entity::values()` have the same length and order.
//! - A nil `Record::id` means "not persisted yet"; `create` assigns one.
//! - Tenant scope is an opaque filter dimension; isolation is the caller's job.

use crate::db::value::{format_epoch_ms, opt_uuid_value, read_opt_uuid, read_uuid, uuid_value};
use crate::query::FilterClause;
use crate::registry::Relation;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Columns present on every entity table, in bind order.
pub const SYSTEM_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "created_by_id",
    "updated_at",
    "updated_by_id",
    "deleted_at",
];

/// System fields embedded in every entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub id: Uuid,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub created_by_id: Option<Uuid>,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    pub updated_by_id: Option<Uuid>,
    /// Soft-delete tombstone, epoch milliseconds.
    pub deleted_at: Option<i64>,
}

impl Record {
    /// Unsaved record attributed to `user_id`.
    pub fn by(user_id: Option<Uuid>) -> Self {
        Self {
            created_by_id: user_id,
            updated_by_id: user_id,
            ..Self::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_nil()
    }

    pub fn values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.id),
            Value::Integer(self.created_at),
            opt_uuid_value(self.created_by_id),
            Value::Integer(self.updated_at),
            opt_uuid_value(self.updated_by_id),
            self.deleted_at.map_or(Value::Null, Value::Integer),
        ]
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: read_uuid(row, "id")?,
            created_at: row.get("created_at")?,
            created_by_id: read_opt_uuid(row, "created_by_id")?,
            updated_at: row.get("updated_at")?,
            updated_by_id: read_opt_uuid(row, "updated_by_id")?,
            deleted_at: row.get("deleted_at")?,
        })
    }

    pub fn to_response(&self) -> RecordResponse {
        RecordResponse {
            id: self.id,
            created_at: format_epoch_ms(self.created_at),
            created_by_id: self.created_by_id,
            updated_at: format_epoch_ms(self.updated_at),
            updated_by_id: self.updated_by_id,
        }
    }
}

/// Wire projection of [`Record`], flattened into every response DTO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResponse {
    pub id: Uuid,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<Uuid>,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by_id: Option<Uuid>,
}

/// A table-backed model managed by a registry.
///
/// Implementations are plain data; projection and topic computation live in
/// the registry descriptor, not on the model.
pub trait Entity: Clone + Send + Sync + 'static {
    /// snake_case name used in topics, logs and error context.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Non-system columns, in the order `values()` binds them.
    const COLUMNS: &'static [&'static str];

    fn record(&self) -> &Record;
    fn record_mut(&mut self) -> &mut Record;
    fn values(&self) -> Vec<Value>;
    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Relations that can be preloaded by name.
    fn relations() -> Vec<Relation<Self>> {
        Vec::new()
    }

    fn id(&self) -> Uuid {
        self.record().id
    }
}

/// The `(organization, branch)` ownership pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TenantScope {
    pub organization_id: Uuid,
    pub branch_id: Uuid,
}

impl TenantScope {
    pub fn new(organization_id: Uuid, branch_id: Uuid) -> Self {
        Self {
            organization_id,
            branch_id,
        }
    }

    /// Explicit equality filters selecting rows owned by this scope.
    pub fn filters(&self) -> Vec<FilterClause> {
        vec![
            FilterClause::eq("organization_id", self.organization_id),
            FilterClause::eq("branch_id", self.branch_id),
        ]
    }

    pub(crate) fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            organization_id: read_uuid(row, "organization_id")?,
            branch_id: read_uuid(row, "branch_id")?,
        })
    }

    pub(crate) fn values(&self) -> [Value; 2] {
        [uuid_value(self.organization_id), uuid_value(self.branch_id)]
    }
}

/// Entities owned by one organization branch.
pub trait TenantScoped: Entity {
    fn scope(&self) -> TenantScope;

    /// Foreign entities this row references, as `(topic segment, id)` pairs.
    fn topic_references(&self) -> Vec<(&'static str, Uuid)> {
        Vec::new()
    }

    fn organization_id(&self) -> Uuid {
        self.scope().organization_id
    }

    fn branch_id(&self) -> Uuid {
        self.scope().branch_id
    }
}

/// Returns whether a bound column value counts as "unset" for
/// query-by-example.
///
/// Zero integers, zero reals, empty text, the nil UUID and NULL are all
/// treated as unset, so an example cannot ask for `is_internal = false`.
pub(crate) fn is_zero_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Integer(value) => *value == 0,
        Value::Real(value) => *value == 0.0,
        Value::Text(text) => text.is_empty() || Uuid::parse_str(text).is_ok_and(|id| id.is_nil()),
        Value::Blob(bytes) => bytes.is_empty(),
    }
}
