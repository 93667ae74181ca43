//! Loan lifecycle labels shown on loan ledgers.

use super::{tenant_relations, HasTenantRefs, TenantRefs, TenantResponse};
use crate::model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoanStatus {
    pub record: Record,
    pub scope: TenantScope,
    pub name: String,
    pub icon: String,
    /// Hex display color, e.g. `#22c55e`.
    pub color: String,
    pub description: String,
    pub refs: TenantRefs,
}

impl Entity for LoanStatus {
    const NAME: &'static str = "loan_status";
    const TABLE: &'static str = "loan_statuses";
    const COLUMNS: &'static [&'static str] = &[
        "organization_id",
        "branch_id",
        "name",
        "icon",
        "color",
        "description",
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
            Value::Text(self.icon.clone()),
            Value::Text(self.color.clone()),
            Value::Text(self.description.clone()),
        ]);
        values
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            scope: TenantScope::read(row)?,
            name: row.get("name")?,
            icon: row.get("icon")?,
            color: row.get("color")?,
            description: row.get("description")?,
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        tenant_relations()
    }
}

impl TenantScoped for LoanStatus {
    fn scope(&self) -> TenantScope {
        self.scope
    }
}

impl HasTenantRefs for LoanStatus {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoanStatusRequest {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
}

impl LoanStatusRequest {
    pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> LoanStatus {
        LoanStatus {
            record: Record::by(user_id),
            scope,
            name: self.name,
            icon: self.icon,
            color: self.color,
            description: self.description,
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanStatusResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub description: String,
}

pub fn loan_status_resource(data: &LoanStatus) -> LoanStatusResponse {
    LoanStatusResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        name: data.name.clone(),
        icon: data.icon.clone(),
        color: data.color.clone(),
        description: data.description.clone(),
    }
}

pub type LoanStatusRegistry = Registry<LoanStatus, LoanStatusResponse, LoanStatusRequest>;

pub fn loan_status_descriptor(delete_mode: DeleteMode) -> Descriptor<LoanStatus, LoanStatusResponse> {
    Descriptor::tenant(loan_status_resource, &[]).with_delete_mode(delete_mode)
}
