//! Flat account taxonomies: classifications and categories.
//!
//! Both tables share the same shape, so the mapping is generated once.

use super::{tenant_relations, HasTenantRefs, TenantRefs, TenantResponse};
use crate::model::{Entity, Record, RecordResponse, TenantScope, TenantScoped};
use crate::registry::{DeleteMode, Descriptor, Registry, Relation};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! named_taxonomy {
    (
        $model:ident,
        $request:ident,
        $response:ident,
        $registry:ident,
        $resource:ident,
        $descriptor:ident,
        $name:literal,
        $table:literal
    ) => {
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $model {
            pub record: Record,
            pub scope: TenantScope,
            pub name: String,
            pub description: String,
            pub refs: TenantRefs,
        }

        impl Entity for $model {
            const NAME: &'static str = $name;
            const TABLE: &'static str = $table;
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

        impl TenantScoped for $model {
            fn scope(&self) -> TenantScope {
                self.scope
            }
        }

        impl HasTenantRefs for $model {
            fn tenant_refs(&self) -> &TenantRefs {
                &self.refs
            }

            fn tenant_refs_mut(&mut self) -> &mut TenantRefs {
                &mut self.refs
            }
        }

        #[derive(Debug, Clone, PartialEq, Deserialize)]
        pub struct $request {
            pub name: String,
            #[serde(default)]
            pub description: String,
        }

        impl $request {
            pub fn into_model(self, scope: TenantScope, user_id: Option<Uuid>) -> $model {
                $model {
                    record: Record::by(user_id),
                    scope,
                    name: self.name,
                    description: self.description,
                    refs: TenantRefs::default(),
                }
            }
        }

        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct $response {
            #[serde(flatten)]
            pub record: RecordResponse,
            #[serde(flatten)]
            pub tenant: TenantResponse,
            pub name: String,
            pub description: String,
        }

        pub fn $resource(data: &$model) -> $response {
            $response {
                record: data.record.to_response(),
                tenant: TenantResponse::of(data),
                name: data.name.clone(),
                description: data.description.clone(),
            }
        }

        pub type $registry = Registry<$model, $response, $request>;

        pub fn $descriptor(delete_mode: DeleteMode) -> Descriptor<$model, $response> {
            Descriptor::tenant($resource, &[]).with_delete_mode(delete_mode)
        }
    };
}

named_taxonomy!(
    AccountClassification,
    AccountClassificationRequest,
    AccountClassificationResponse,
    AccountClassificationRegistry,
    account_classification_resource,
    account_classification_descriptor,
    "account_classification",
    "account_classifications"
);

named_taxonomy!(
    AccountCategory,
    AccountCategoryRequest,
    AccountCategoryResponse,
    AccountCategoryRegistry,
    account_category_resource,
    account_category_descriptor,
    "account_category",
    "account_categories"
);
