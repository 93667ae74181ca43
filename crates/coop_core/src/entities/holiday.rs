use super::{tenant_relations, HasTenantRefs, TenantRefs, TenantResponse};
use crate::db::value::format_epoch_ms;
use crate::model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Holiday {
    pub record: Record,
    pub scope: TenantScope,
    pub name: String,
    pub description: String,
    /// Epoch milliseconds of the holiday date (UTC midnight).
    pub entry_date: i64,
    pub refs: TenantRefs,
}

impl Entity for Holiday {
    const NAME: &'static str = "holiday";
    const TABLE: &'static str = "holidays";
    const COLUMNS: &'static [&'static str] = &[
        "organization_id",
        "branch_id",
        "name",
        "description",
        "entry_date",
    ];

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn values(&self) -> Vec<Value> {
        let mut values = self.scope.values().to_vec();
        values.extend([
            Value::Text(self.name.clone()),
            Value::Text(self.description.clone()),
            Value::Integer(self.entry_date),
        ]);
        values
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            scope: TenantScope::read(row)?,
            name: row.get("name")?,
            description: row.get("description")?,
            entry_date: row.get("entry_date")?,
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        tenant_relations()
    }
}

impl TenantScoped for Holiday {
    fn scope(&self) -> TenantScope {
        self.scope
    }
}

impl HasTenantRefs for Holiday {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HolidayRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub entry_date: i64,
}

impl HolidayRequest {
    pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> Holiday {
        Holiday {
            record: Record::by(user_id),
            scope,
            name: self.name,
            description: self.description,
            entry_date: self.entry_date,
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolidayResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    pub name: String,
    pub description: String,
    pub entry_date: String,
}

pub fn holiday_resource(data: &Holiday) -> HolidayResponse {
    HolidayResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        name: data.name.clone(),
        description: data.description.clone(),
        entry_date: format_epoch_ms(data.entry_date),
    }
}

pub type HolidayRegistry = Registry<Holiday, HolidayResponse, HolidayRequest>;

pub fn holiday_descriptor(delete_mode: DeleteMode) -> Descriptor<Holiday, HolidayResponse> {
    Descriptor::tenant(holiday_resource, &[]).with_delete_mode(delete_mode)
}
