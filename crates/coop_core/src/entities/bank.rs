use super::{tenant_relations, HasTenantRefs, TenantRefs, TenantResponse};
use crate::model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bank {
    pub record: Record,
    pub scope: TenantScope,
    pub name: String,
    pub description: String,
    pub refs: TenantRefs,
}

impl Entity for Bank {
    const NAME: &'static str = "bank";
    const TABLE: &'static str = "banks";
    const COLUMNS: &'static [&'static str] =
        &["organization_id", "branch_id", "name", "description"];

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn values(&self) -> Vec<Value> {
        let mut values = self.scope.values().to_vec();
        values.push(Value::Text(self.name.clone()));
        values.push(Value::Text(self.description.clone()));
        values
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            scope: TenantScope::read(row)?,
            name: row.get("name")?,
            description: row.get("description")?,
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        tenant_relations()
    }
}

impl TenantScoped for Bank {
    fn scope(&self) -> TenantScope {
        self.scope
    }
}

impl HasTenantRefs for Bank {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BankRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl BankRequest {
    pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> Bank {
        Bank {
            record: Record::by(user_id),
            scope,
            name: self.name,
            description: self.description,
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    pub name: String,
    pub description: String,
}

pub fn bank_resource(data: &Bank) -> BankResponse {
    BankResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        name: data.name.clone(),
        description: data.description.clone(),
    }
}

pub type BankRegistry = Registry<Bank, BankResponse, BankRequest>;

pub fn bank_descriptor(delete_mode: DeleteMode) -> Descriptor<Bank, BankResponse> {
    Descriptor::tenant(bank_resource, &[]).with_delete_mode(delete_mode)
}
