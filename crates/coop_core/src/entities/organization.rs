//! Tenant anchors: organizations and their branches.

use crate::db::value::{bool_value, read_uuid, uuid_value};
use crate::model::{Entity, Record, RecordResponse};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use crate::topic::{entity_topics, Action};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Organization {
    pub record: Record,
    pub name: String,
    pub description: String,
    pub is_private: bool,
    pub branches: Vec<Branch>,
}

impl Entity for Organization {
    const NAME: &'static str = "organization";
    const TABLE: &'static str = "organizations";
    const COLUMNS: &'static [&'static str] = &["name", "description", "is_private"];

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.description.clone()),
            bool_value(self.is_private),
        ]
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            name: row.get("name")?,
            description: row.get("description")?,
            is_private: row.get("is_private")?,
            branches: Vec::new(),
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        vec![Relation::<Self>::has_many::<Branch>(
            "Branches",
            "organization_id",
            |branch| Some(branch.organization_id),
            |organization, branches| organization.branches = branches,
        )]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrganizationRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_private: bool,
}

impl OrganizationRequest {
    pub fn into_model(self, user_id: Option<Uuid>) -> Organization {
        Organization {
            record: Record::by(user_id),
            name: self.name,
            description: self.description,
            is_private: self.is_private,
            branches: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    pub name: String,
    pub description: String,
    pub is_private: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchResponse>,
}

pub fn organization_resource(data: &Organization) -> OrganizationResponse {
    OrganizationResponse {
        record: data.record.to_response(),
        name: data.name.clone(),
        description: data.description.clone(),
        is_private: data.is_private,
        branches: data.branches.iter().map(branch_resource).collect(),
    }
}

fn organization_topics(data: &Organization, action: Action) -> Vec<String> {
    entity_topics(Organization::NAME, action, data.id(), &[])
}

pub type OrganizationRegistry = Registry<Organization, OrganizationResponse, OrganizationRequest>;

pub fn organization_descriptor(delete_mode: DeleteMode) -> Descriptor<Organization, OrganizationResponse> {
    Descriptor {
        preloads: Vec::new(),
        resource: organization_resource,
        created: |data| organization_topics(data, Action::Create),
        updated: |data| organization_topics(data, Action::Update),
        deleted: |data| organization_topics(data, Action::Delete),
        delete_mode,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Branch {
    pub record: Record,
    pub organization_id: Uuid,
    pub name: String,
    pub branch_type: String,
    pub email: String,
    pub address: String,
    pub organization: Option<Box<Organization>>,
}

impl Entity for Branch {
    const NAME: &'static str = "branch";
    const TABLE: &'static str = "branches";
    const COLUMNS: &'static [&'static str] =
        &["organization_id", "name", "branch_type", "email", "address"];

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn values(&self) -> Vec<Value> {
        vec![
            uuid_value(self.organization_id),
            Value::Text(self.name.clone()),
            Value::Text(self.branch_type.clone()),
            Value::Text(self.email.clone()),
            Value::Text(self.address.clone()),
        ]
    }

    fn from_row(record: Record, row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record,
            organization_id: read_uuid(row, "organization_id")?,
            name: row.get("name")?,
            branch_type: row.get("branch_type")?,
            email: row.get("email")?,
            address: row.get("address")?,
            organization: None,
        })
    }

    fn relations() -> Vec<Relation<Self>> {
        vec![Relation::<Self>::belongs_to::<Organization>(
            "Organization",
            "organization_id",
            |branch| Some(branch.organization_id),
            |branch, organization| branch.organization = organization.map(Box::new),
        )]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BranchRequest {
    pub name: String,
    pub branch_type: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

impl BranchRequest {
    pub fn into_model(self, organization_id: Uuid, user_id: Option<Uuid>) -> Branch {
        Branch {
            record: Record::by(user_id),
            organization_id,
            name: self.name,
            branch_type: self.branch_type,
            email: self.email,
            address: self.address,
            organization: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchResponse {
    #[serde(flatten)]
    pub record: RecordResponse,
    pub organization_id: Uuid,
    pub name: String,
    pub branch_type: String,
    pub email: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Box<OrganizationResponse>>,
}

pub fn branch_resource(data: &Branch) -> BranchResponse {
    BranchResponse {
        record: data.record.to_response(),
        organization_id: data.organization_id,
        name: data.name.clone(),
        branch_type: data.branch_type.clone(),
        email: data.email.clone(),
        address: data.address.clone(),
        organization: data
            .organization
            .as_deref()
            .map(|organization| Box::new(organization_resource(organization))),
    }
}

fn branch_topics(data: &Branch, action: Action) -> Vec<String> {
    entity_topics(
        Branch::NAME,
        action,
        data.id(),
        &[("organization", data.organization_id)],
    )
}

pub type BranchRegistry = Registry<Branch, BranchResponse, BranchRequest>;

pub fn branch_descriptor(delete_mode: DeleteMode) -> Descriptor<Branch, BranchResponse> {
    Descriptor {
        preloads: vec!["Organization".to_string()],
        resource: branch_resource,
        created: |data| branch_topics(data, Action::Create),
        updated: |data| branch_topics(data, Action::Update),
        deleted: |data| branch_topics(data, Action::Delete),
        delete_mode,
    }
}
