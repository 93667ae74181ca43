//! Chart-of-accounts skeleton: groupings and the ledger definitions under them.

use super::{tenant_relations, HasTenantRefs, TenantRefs, TenantResponse};
use crate::db::value::{opt_uuid_value, read_opt_uuid};
use crate::model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneralLedgerAccountsGrouping {
    pub record: Record,
    pub scope: TenantScope,
    pub name: String,
    pub description: String,
    /// `debit` or `credit`.
    pub debit_credit: String,
    pub from_code: f64,
    pub to_code: f64,
    pub definitions: Vec<GeneralLedgerDefinition>,
    pub refs: TenantRefs,
}

impl Entity for GeneralLedgerAccountsGrouping {
    const NAME: &'static str = "general_ledger_accounts_grouping";
    const TABLE: &'static str = "general_ledger_accounts_groupings";
    const COLUMNS: &'static [&'static str] = &[
        "organization_id",
        "branch_id",
        "name",
        "description",
        "debit_credit",
        "from_code",
        "to_code",
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
            Value::Text(self.debit_credit.clone()),
            Value::Real(self.from_code),
            Value::Real(self.to_code),
        ]);
        values
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            scope: TenantScope::read(row)?,
            name: row.get("name")?,
            description: row.get("description")?,
            debit_credit: row.get("debit_credit")?,
            from_code: row.get("from_code")?,
            to_code: row.get("to_code")?,
            definitions: Vec::new(),
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        let mut relations = tenant_relations();
        relations.push(Relation::<Self>::has_many::<GeneralLedgerDefinition>(
            "GeneralLedgerDefinitions",
            "general_ledger_accounts_grouping_id",
            |definition| definition.general_ledger_accounts_grouping_id,
            |grouping, definitions| grouping.definitions = definitions,
        ));
        relations
    }
}

impl TenantScoped for GeneralLedgerAccountsGrouping {
    fn scope(&self) -> TenantScope {
        self.scope
    }
}

impl HasTenantRefs for GeneralLedgerAccountsGrouping {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneralLedgerAccountsGroupingRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub debit_credit: String,
    pub from_code: f64,
    pub to_code: f64,
}

impl GeneralLedgerAccountsGroupingRequest {
    pub fn into_model(
        self,
        scope: TenantScope,
        user_id: Option<Uuid>,
    ) -> GeneralLedgerAccountsGrouping {
        GeneralLedgerAccountsGrouping {
            record: Record::by(user_id),
            scope,
            name: self.name,
            description: self.description,
            debit_credit: self.debit_credit,
            from_code: self.from_code,
            to_code: self.to_code,
            definitions: Vec::new(),
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralLedgerAccountsGroupingResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    pub name: String,
    pub description: String,
    pub debit_credit: String,
    pub from_code: f64,
    pub to_code: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub general_ledger_definitions: Vec<GeneralLedgerDefinitionResponse>,
}

pub fn general_ledger_accounts_grouping_resource(
    data: &GeneralLedgerAccountsGrouping,
) -> GeneralLedgerAccountsGroupingResponse {
    GeneralLedgerAccountsGroupingResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        name: data.name.clone(),
        description: data.description.clone(),
        debit_credit: data.debit_credit.clone(),
        from_code: data.from_code,
        to_code: data.to_code,
        general_ledger_definitions: data
            .definitions
            .iter()
            .map(general_ledger_definition_resource)
            .collect(),
    }
}

pub type GeneralLedgerAccountsGroupingRegistry = Registry<
    GeneralLedgerAccountsGrouping,
    GeneralLedgerAccountsGroupingResponse,
    GeneralLedgerAccountsGroupingRequest,
>;

pub fn general_ledger_accounts_grouping_descriptor(
    delete_mode: DeleteMode,
) -> Descriptor<GeneralLedgerAccountsGrouping, GeneralLedgerAccountsGroupingResponse> {
    Descriptor::tenant(general_ledger_accounts_grouping_resource, &[])
        .with_delete_mode(delete_mode)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneralLedgerDefinition {
    pub record: Record,
    pub scope: TenantScope,
    pub general_ledger_accounts_grouping_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub general_ledger_type: String,
    pub index_position: i64,
    pub grouping: Option<Box<GeneralLedgerAccountsGrouping>>,
    pub refs: TenantRefs,
}

impl Entity for GeneralLedgerDefinition {
    const NAME: &'static str = "general_ledger_definition";
    const TABLE: &'static str = "general_ledger_definitions";
    const COLUMNS: &'static [&'static str] = &[
        "organization_id",
        "branch_id",
        "general_ledger_accounts_grouping_id",
        "name",
        "description",
        "general_ledger_type",
        "index_position",
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
            opt_uuid_value(self.general_ledger_accounts_grouping_id),
            Value::Text(self.name.clone()),
            Value::Text(self.description.clone()),
            Value::Text(self.general_ledger_type.clone()),
            Value::Integer(self.index_position),
        ]);
        values
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            scope: TenantScope::read(row)?,
            general_ledger_accounts_grouping_id: read_opt_uuid(
                row,
                "general_ledger_accounts_grouping_id",
            )?,
            name: row.get("name")?,
            description: row.get("description")?,
            general_ledger_type: row.get("general_ledger_type")?,
            index_position: row.get("index_position")?,
            grouping: None,
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        let mut relations = tenant_relations();
        relations.push(Relation::<Self>::belongs_to::<GeneralLedgerAccountsGrouping>(
            "GeneralLedgerAccountsGrouping",
            "general_ledger_accounts_grouping_id",
            |definition| definition.general_ledger_accounts_grouping_id,
            |definition, grouping| definition.grouping = grouping.map(Box::new),
        ));
        relations
    }
}

impl TenantScoped for GeneralLedgerDefinition {
    fn scope(&self) -> TenantScope {
        self.scope
    }

    fn topic_references(&self) -> Vec<(&'static str, Uuid)> {
        self.general_ledger_accounts_grouping_id
            .map(|id| ("general_ledger_accounts_grouping", id))
            .into_iter()
            .collect()
    }
}

impl HasTenantRefs for GeneralLedgerDefinition {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneralLedgerDefinitionRequest {
    #[serde(default)]
    pub general_ledger_accounts_grouping_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub general_ledger_type: String,
    #[serde(default)]
    pub index_position: i64,
}

impl GeneralLedgerDefinitionRequest {
    pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> GeneralLedgerDefinition {
        GeneralLedgerDefinition {
            record: Record::by(user_id),
            scope,
            general_ledger_accounts_grouping_id: self.general_ledger_accounts_grouping_id,
            name: self.name,
            description: self.description,
            general_ledger_type: self.general_ledger_type,
            index_position: self.index_position,
            grouping: None,
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralLedgerDefinitionResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_ledger_accounts_grouping_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub general_ledger_type: String,
    pub index_position: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_ledger_accounts_grouping: Option<Box<GeneralLedgerAccountsGroupingResponse>>,
}

pub fn general_ledger_definition_resource(
    data: &GeneralLedgerDefinition,
) -> GeneralLedgerDefinitionResponse {
    GeneralLedgerDefinitionResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        general_ledger_accounts_grouping_id: data.general_ledger_accounts_grouping_id,
        name: data.name.clone(),
        description: data.description.clone(),
        general_ledger_type: data.general_ledger_type.clone(),
        index_position: data.index_position,
        general_ledger_accounts_grouping: data
            .grouping
            .as_deref()
            .map(|grouping| Box::new(general_ledger_accounts_grouping_resource(grouping))),
    }
}

pub type GeneralLedgerDefinitionRegistry = Registry<
    GeneralLedgerDefinition,
    GeneralLedgerDefinitionResponse,
    GeneralLedgerDefinitionRequest,
>;

pub fn general_ledger_definition_descriptor(
    delete_mode: DeleteMode,
) -> Descriptor<GeneralLedgerDefinition, GeneralLedgerDefinitionResponse> {
    Descriptor::tenant(
        general_ledger_definition_resource,
        &["GeneralLedgerAccountsGrouping"],
    )
    .with_delete_mode(delete_mode)
}
