//! Reference entities managed through the generic registry.
//!
//! # Responsibility
//! - Define models, request/response DTOs, projections and descriptors for
//!   the tenant anchors and the reference data seeded per branch.
//!
//! # Invariants
//! - Every branch-scoped table references `organizations` and `branches`.
//! - Projections are pure and never touch storage.

pub mod account;
pub mod account_taxonomy;
pub mod bank;
pub mod bill_and_coins;
pub mod collateral;
pub mod general_ledger;
pub mod holiday;
pub mod loan_status;
pub mod member;
pub mod organization;

pub use account::{Account, AccountRegistry, AccountRequest, AccountResponse};
pub use account_taxonomy::{
    AccountCategory, AccountCategoryRegistry, AccountCategoryRequest, AccountCategoryResponse,
    AccountClassification, AccountClassificationRegistry, AccountClassificationRequest,
    AccountClassificationResponse,
};
pub use bank::{Bank, BankRegistry, BankRequest, BankResponse};
pub use bill_and_coins::{
    BillAndCoins, BillAndCoinsRegistry, BillAndCoinsRequest, BillAndCoinsResponse,
};
pub use collateral::{Collateral, CollateralRegistry, CollateralRequest, CollateralResponse};
pub use general_ledger::{
    GeneralLedgerAccountsGrouping, GeneralLedgerAccountsGroupingRegistry,
    GeneralLedgerAccountsGroupingRequest, GeneralLedgerAccountsGroupingResponse,
    GeneralLedgerDefinition, GeneralLedgerDefinitionRegistry, GeneralLedgerDefinitionRequest,
    GeneralLedgerDefinitionResponse,
};
pub use holiday::{Holiday, HolidayRegistry, HolidayRequest, HolidayResponse};
pub use loan_status::{LoanStatus, LoanStatusRegistry, LoanStatusRequest, LoanStatusResponse};
pub use member::{
    MemberClassification, MemberClassificationRegistry, MemberClassificationRequest,
    MemberClassificationResponse, MemberType, MemberTypeRegistry, MemberTypeRequest,
    MemberTypeResponse,
};
pub use organization::{
    Branch, BranchRegistry, BranchRequest, BranchResponse, Organization, OrganizationRegistry,
    OrganizationRequest, OrganizationResponse,
};

use crate::model::{TenantScope, TenantScoped};
use crate::registry::Relation;
use serde::Serialize;
use uuid::Uuid;

/// Tenant anchors loaded through the `Organization` / `Branch` relations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TenantRefs {
    pub organization: Option<Box<Organization>>,
    pub branch: Option<Box<Branch>>,
}

/// Branch-scoped models that carry preloadable tenant anchors.
pub trait HasTenantRefs: TenantScoped {
    fn tenant_refs(&self) -> &TenantRefs;
    fn tenant_refs_mut(&mut self) -> &mut TenantRefs;
}

/// `Organization` and `Branch` relations shared by every branch-scoped model.
pub(crate) fn tenant_relations<T: HasTenantRefs>() -> Vec<Relation<T>> {
    vec![
        Relation::belongs_to::<Organization>(
            "Organization",
            "organization_id",
            |row: &T| Some(row.organization_id()),
            |row: &mut T, organization| {
                row.tenant_refs_mut().organization = organization.map(Box::new)
            },
        ),
        Relation::belongs_to::<Branch>(
            "Branch",
            "branch_id",
            |row: &T| Some(row.branch_id()),
            |row: &mut T, branch| row.tenant_refs_mut().branch = branch.map(Box::new),
        ),
    ]
}

/// Wire shape of the tenant columns, flattened into branch-scoped responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantResponse {
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchResponse>,
}

impl TenantResponse {
    pub fn of<T: HasTenantRefs>(data: &T) -> Self {
        let TenantScope {
            organization_id,
            branch_id,
        } = data.scope();
        let refs = data.tenant_refs();
        Self {
            organization_id,
            branch_id,
            organization: refs
                .organization
                .as_deref()
                .map(organization::organization_resource),
            branch: refs.branch.as_deref().map(organization::branch_resource),
        }
    }
}
