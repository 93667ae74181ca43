use super::{tenant_relations, HasTenantRefs, TenantRefs, TenantResponse};
use crate::db::value::{opt_uuid_value, read_opt_uuid};
use crate::model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemberClassification {
    pub record: Record,
    pub scope: TenantScope,
    pub name: String,
    pub description: String,
    pub member_types: Vec<MemberType>,
    pub refs: TenantRefs,
}

impl Entity for MemberClassification {
    const NAME: &'static str = "member_classification";
    const TABLE: &'static str = "member_classifications";
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
            member_types: Vec::new(),
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        let mut relations = tenant_relations();
        relations.push(Relation::<Self>::has_many::<MemberType>(
            "MemberTypes",
            "member_classification_id",
            |member_type| member_type.member_classification_id,
            |classification, member_types| classification.member_types = member_types,
        ));
        relations
    }
}

impl TenantScoped for MemberClassification {
    fn scope(&self) -> TenantScope {
        self.scope
    }
}

impl HasTenantRefs for MemberClassification {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberClassificationRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl MemberClassificationRequest {
    pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> MemberClassification {
        MemberClassification {
            record: Record::by(user_id),
            scope,
            name: self.name,
            description: self.description,
            member_types: Vec::new(),
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberClassificationResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub member_types: Vec<MemberTypeResponse>,
}

pub fn member_classification_resource(data: &MemberClassification) -> MemberClassificationResponse {
    MemberClassificationResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        name: data.name.clone(),
        description: data.description.clone(),
        member_types: data.member_types.iter().map(member_type_resource).collect(),
    }
}

pub type MemberClassificationRegistry =
    Registry<MemberClassification, MemberClassificationResponse, MemberClassificationRequest>;

pub fn member_classification_descriptor(
    delete_mode: DeleteMode,
) -> Descriptor<MemberClassification, MemberClassificationResponse> {
    Descriptor::tenant(member_classification_resource, &[]).with_delete_mode(delete_mode)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemberType {
    pub record: Record,
    pub scope: TenantScope,
    pub member_classification_id: Option<Uuid>,
    pub name: String,
    /// Prefix stamped on generated member numbers, e.g. `REG`.
    pub prefix: String,
    pub description: String,
    pub classification: Option<Box<MemberClassification>>,
    pub refs: TenantRefs,
}

impl Entity for MemberType {
    const NAME: &'static str = "member_type";
    const TABLE: &'static str = "member_types";
    const COLUMNS: &'static [&'static str] = &[
        "organization_id",
        "branch_id",
        "member_classification_id",
        "name",
        "prefix",
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
            opt_uuid_value(self.member_classification_id),
            Value::Text(self.name.clone()),
            Value::Text(self.prefix.clone()),
            Value::Text(self.description.clone()),
        ]);
        values
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            scope: TenantScope::read(row)?,
            member_classification_id: read_opt_uuid(row, "member_classification_id")?,
            name: row.get("name")?,
            prefix: row.get("prefix")?,
            description: row.get("description")?,
            classification: None,
            refs: TenantRefs::default(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        let mut relations = tenant_relations();
        relations.push(Relation::<Self>::belongs_to::<MemberClassification>(
            "MemberClassification",
            "member_classification_id",
            |member_type| member_type.member_classification_id,
            |member_type, classification| {
                member_type.classification = classification.map(Box::new)
            },
        ));
        relations
    }
}

impl TenantScoped for MemberType {
    fn scope(&self) -> TenantScope {
        self.scope
    }

    fn topic_references(&self) -> Vec<(&'static str, Uuid)> {
        self.member_classification_id
            .map(|id| ("member_classification", id))
            .into_iter()
            .collect()
    }
}

impl HasTenantRefs for MemberType {
    fn tenant_refs(&self) -> &TenantRefs {
        &self.refs
    }

    fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
        &mut self.refs
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberTypeRequest {
    #[serde(default)]
    pub member_classification_id: Option<Uuid>,
    pub name: String,
    pub prefix: String,
    #[serde(default)]
    pub description: String,
}

impl MemberTypeRequest {
    pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> MemberType {
        MemberType {
            record: Record::by(user_id),
            scope,
            member_classification_id: self.member_classification_id,
            name: self.name,
            prefix: self.prefix,
            description: self.description,
            classification: None,
            refs: TenantRefs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberTypeResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    #[serde(flatten)]
    pub tenant: TenantResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_classification_id: Option<Uuid>,
    pub name: String,
    pub prefix: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_classification: Option<Box<MemberClassificationResponse>>,
}

pub fn member_type_resource(data: &MemberType) -> MemberTypeResponse {
    MemberTypeResponse {
        record: data.record.to_response(),
        tenant: TenantResponse::of(data),
        member_classification_id: data.member_classification_id,
        name: data.name.clone(),
        prefix: data.prefix.clone(),
        description: data.description.clone(),
        member_classification: data
            .classification
            .as_deref()
            .map(|classification| Box::new(member_classification_resource(classification))),
    }
}

pub type MemberTypeRegistry = Registry<MemberType, MemberTypeResponse, MemberTypeRequest>;

pub fn member_type_descriptor(delete_mode: DeleteMode) -> Descriptor<MemberType, MemberTypeResponse> {
    Descriptor::tenant(member_type_resource, &["MemberClassification"])
        .with_delete_mode(delete_mode)
}
