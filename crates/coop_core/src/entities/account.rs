//! Deposit and loan account products offered by a branch.

use super::general_ledger::{general_ledger_definition_resource, GeneralLedgerDefinitionResponse};
use super::{tenant_relations, GeneralLedgerDefinition, HasTenantRefs, TenantRefs, TenantResponse};
use crate::db::value::{bool_value, opt_uuid_value, read_opt_uuid};
use crate::model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Account {
    pub record: Record,
    pub scope: TenantScope,
    pub general_ledger_definition_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub account_type: String,
    pub min_amount: f64,
    pub max_amount: f64,
    pub interest_standard: f64,
    pub is_internal: bool,
    pub definition: Option<Box<GeneralLedgerDefinition>>,
    pub refs: TenantRefs,
}

impl Entity for Account {
    const NAME: &'static str = "account";
    const TABLE: &'static str = "accounts";
    const COLUMNS: &'static [&'static str] = &[
        "organization_id",
        "branch_id",
        "general_ledger_definition_id",
        "name",
        "description",
        "account_type",
        "min_amount",
        "max_amount",
        "interest_standard",
        "is_internal",
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
            opt_uuid_value(self.general_ledger_definition_id),
            Value::Text(self.name.clone()),
            Value::Text(self.description.clone()),
            Value::Text(self.account_type.clone()),
            Value::Real(self.min_amount),
            Value::Real(self.max_amount),
            Value::Real(self.interest_standard),
            bool_value(self.is_internal),
        ]);
        values
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            scope: TenantScope::read(row)?,
            general_ledger_definition_id: read_opt_uuid(row, "general_ledger_definition_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            account_type: row.get("account_type")?,
            min_amount: row.get("min_amount")?,
            max_amount: row.get("max_amount")?,
            interest_standard: row.get("interest_standard")?,
            is_internal: row.get("is_internal")?,
            definition: None,
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        let mut relations = tenant_relations();
        relations.push(Relation::<Self>::belongs_to::<GeneralLedgerDefinition>(
            "GeneralLedgerDefinition",
            "general_ledger_definition_id",
            |account| account.general_ledger_definition_id,
            |account, definition| account.definition = definition.map(Box::new),
        ));
        relations
    }
}

impl TenantScoped for Account {
    fn scope(&self) -> TenantScope {
        self.scope
    }

    fn topic_references(&self) -> Vec<(&'static str, Uuid)> {
        self.general_ledger_definition_id
            .map(|id| ("general_ledger_definition", id))
            .into_iter()
            .collect()
    }
}

impl HasTenantRefs for Account {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountRequest {
    #[serde(default)]
    pub general_ledger_definition_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub account_type: String,
    #[serde(default)]
    pub min_amount: f64,
    #[serde(default)]
    pub max_amount: f64,
    #[serde(default)]
    pub interest_standard: f64,
    #[serde(default)]
    pub is_internal: bool,
}

impl AccountRequest {
    pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> Account {
        Account {
            record: Record::by(user_id),
            scope,
            general_ledger_definition_id: self.general_ledger_definition_id,
            name: self.name,
            description: self.description,
            account_type: self.account_type,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            interest_standard: self.interest_standard,
            is_internal: self.is_internal,
            definition: None,
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_ledger_definition_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub account_type: String,
    pub min_amount: f64,
    pub max_amount: f64,
    pub interest_standard: f64,
    pub is_internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_ledger_definition: Option<GeneralLedgerDefinitionResponse>,
}

pub fn account_resource(data: &Account) -> AccountResponse {
    AccountResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        general_ledger_definition_id: data.general_ledger_definition_id,
        name: data.name.clone(),
        description: data.description.clone(),
        account_type: data.account_type.clone(),
        min_amount: data.min_amount,
        max_amount: data.max_amount,
        interest_standard: data.interest_standard,
        is_internal: data.is_internal,
        general_ledger_definition: data
            .definition
            .as_deref()
            .map(general_ledger_definition_resource),
    }
}

pub type AccountRegistry = Registry<Account, AccountResponse, AccountRequest>;

pub fn account_descriptor(delete_mode: DeleteMode) -> Descriptor<Account, AccountResponse> {
    Descriptor::tenant(account_resource, &[]).with_delete_mode(delete_mode)
}
