use super::{tenant_relations, HasTenantRefs, TenantRefs, TenantResponse};
use crate::model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collateral {
    pub record: Record,
    pub scope: TenantScope,
    pub icon: String,
    pub name: String,
    pub description: String,
    pub refs: TenantRefs,
}

impl Entity for Collateral {
    const NAME: &'static str = "collateral";
    const TABLE: &'static str = "collaterals";
    const COLUMNS: &'static [&'static str] =
        &["organization_id", "branch_id", "icon", "name", "description"];

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn values(&self) -> Vec<Value> {
        let mut values = self.scope.values().to_vec();
        values.extend([
            Value::Text(self.icon.clone()),
            Value::Text(self.name.clone()),
            Value::Text(self.description.clone()),
        ]);
        values
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            scope: TenantScope::read(row)?,
            icon: row.get("icon")?,
            name: row.get("name")?,
            description: row.get("description")?,
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        tenant_relations()
    }
}

impl TenantScoped for Collateral {
    fn scope(&self) -> TenantScope {
        self.scope
    }
}

impl HasTenantRefs for Collateral {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollateralRequest {
    #[serde(default)]
    pub icon: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CollateralRequest {
    pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> Collateral {
        Collateral {
            record: Record::by(user_id),
            scope,
            icon: self.icon,
            name: self.name,
            description: self.description,
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollateralResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    pub icon: String,
    pub name: String,
    pub description: String,
}

pub fn collateral_resource(data: &Collateral) -> CollateralResponse {
    CollateralResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        icon: data.icon.clone(),
        name: data.name.clone(),
        description: data.description.clone(),
    }
}

pub type CollateralRegistry = Registry<Collateral, CollateralResponse, CollateralRequest>;

pub fn collateral_descriptor(delete_mode: DeleteMode) -> Descriptor<Collateral, CollateralResponse> {
    Descriptor::tenant(collateral_resource, &[]).with_delete_mode(delete_mode)
}
