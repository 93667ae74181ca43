//! Cash denominations accepted at a branch teller.

use super::{tenant_relations, HasTenantRefs, TenantRefs, TenantResponse};
use crate::model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BillAndCoins {
    pub record: Record,
    pub scope: TenantScope,
    pub name: String,
    pub value: f64,
    /// ISO 3166-1 alpha-2 code of the issuing country.
    pub country_code: String,
    pub refs: TenantRefs,
}

impl Entity for BillAndCoins {
    const NAME: &'static str = "bill_and_coins";
    const TABLE: &'static str = "bill_and_coins";
    const COLUMNS: &'static [&'static str] =
        &["organization_id", "branch_id", "name", "value", "country_code"];

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
            Value::Real(self.value),
            Value::Text(self.country_code.clone()),
        ]);
        values
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            scope: TenantScope::read(row)?,
            name: row.get("name")?,
            value: row.get("value")?,
            country_code: row.get("country_code")?,
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        tenant_relations()
    }
}

impl TenantScoped for BillAndCoins {
    fn scope(&self) -> TenantScope {
        self.scope
    }
}

impl HasTenantRefs for BillAndCoins {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BillAndCoinsRequest {
    pub name: String,
    pub value: f64,
    pub country_code: String,
}

impl BillAndCoinsRequest {
    pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> BillAndCoins {
        BillAndCoins {
            record: Record::by(user_id),
            scope,
            name: self.name,
            value: self.value,
            country_code: self.country_code,
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillAndCoinsResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    pub name: String,
    pub value: f64,
    pub country_code: String,
}

pub fn bill_and_coins_resource(data: &BillAndCoins) -> BillAndCoinsResponse {
    BillAndCoinsResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        name: data.name.clone(),
        value: data.value,
        country_code: data.country_code.clone(),
    }
}

pub type BillAndCoinsRegistry = Registry<BillAndCoins, BillAndCoinsResponse, BillAndCoinsRequest>;

pub fn bill_and_coins_descriptor(
    delete_mode: DeleteMode,
) -> Descriptor<BillAndCoins, BillAndCoinsResponse> {
    Descriptor::tenant(bill_and_coins_resource, &[]).with_delete_mode(delete_mode)
}
