//! Application context shared by request handlers and background jobs.
//!
//! # Responsibility
//! - Own the registry cache, the broker and the delete policy.
//! - Hand out one shared registry per entity type.
//!
//! # Invariants
//! - Registries obtained from the same `Core` for the same type are the same
//!   `Arc`; two `Core`s never share registries.

use crate::config::CoreConfig;
use crate::entities::account::account_descriptor;
use crate::entities::account_taxonomy::{
    account_category_descriptor, account_classification_descriptor,
};
use crate::entities::bank::bank_descriptor;
use crate::entities::bill_and_coins::bill_and_coins_descriptor;
use crate::entities::collateral::collateral_descriptor;
use crate::entities::general_ledger::{
    general_ledger_accounts_grouping_descriptor, general_ledger_definition_descriptor,
};
use crate::entities::holiday::holiday_descriptor;
use crate::entities::loan_status::loan_status_descriptor;
use crate::entities::member::{member_classification_descriptor, member_type_descriptor};
use crate::entities::organization::{branch_descriptor, organization_descriptor};
use crate::entities::{
    AccountCategoryRegistry, AccountClassificationRegistry, AccountRegistry, BankRegistry,
    BillAndCoinsRegistry, BranchRegistry, CollateralRegistry,
    GeneralLedgerAccountsGroupingRegistry, GeneralLedgerDefinitionRegistry, HolidayRegistry,
    LoanStatusRegistry, MemberClassificationRegistry, MemberTypeRegistry, OrganizationRegistry,
};
use crate::model::Entity;
use crate::registry::{DeleteMode, Descriptor, Registry, RegistryCache};
use crate::topic::Broker;
use serde::Serialize;
use std::sync::Arc;

pub struct Core {
    cache: RegistryCache,
    broker: Arc<dyn Broker>,
    delete_mode: DeleteMode,
}

impl Core {
    pub fn new(broker: Arc<dyn Broker>, delete_mode: DeleteMode) -> Self {
        Self {
            cache: RegistryCache::new(),
            broker,
            delete_mode,
        }
    }

    pub fn from_config(config: &CoreConfig, broker: Arc<dyn Broker>) -> Self {
        Self::new(broker, config.delete_mode)
    }

    pub fn cache(&self) -> &RegistryCache {
        &self.cache
    }

    pub fn broker(&self) -> Arc<dyn Broker> {
        Arc::clone(&self.broker)
    }

    pub fn delete_mode(&self) -> DeleteMode {
        self.delete_mode
    }

    /// Shared registry for `T`, built from `descriptor` on first use.
    pub fn registry<T, R, Q>(
        &self,
        descriptor: fn(DeleteMode) -> Descriptor<T, R>,
    ) -> Arc<Registry<T, R, Q>>
    where
        T: Entity,
        R: Serialize + 'static,
        Q: 'static,
    {
        self.cache.get_or_init(|| {
            Registry::new(descriptor(self.delete_mode), Arc::clone(&self.broker))
        })
    }

    pub fn organizations(&self) -> Arc<OrganizationRegistry> {
        self.registry(organization_descriptor)
    }

    pub fn branches(&self) -> Arc<BranchRegistry> {
        self.registry(branch_descriptor)
    }

    pub fn banks(&self) -> Arc<BankRegistry> {
        self.registry(bank_descriptor)
    }

    pub fn bill_and_coins(&self) -> Arc<BillAndCoinsRegistry> {
        self.registry(bill_and_coins_descriptor)
    }

    pub fn holidays(&self) -> Arc<HolidayRegistry> {
        self.registry(holiday_descriptor)
    }

    pub fn general_ledger_accounts_groupings(&self) -> Arc<GeneralLedgerAccountsGroupingRegistry> {
        self.registry(general_ledger_accounts_grouping_descriptor)
    }

    pub fn general_ledger_definitions(&self) -> Arc<GeneralLedgerDefinitionRegistry> {
        self.registry(general_ledger_definition_descriptor)
    }

    pub fn accounts(&self) -> Arc<AccountRegistry> {
        self.registry(account_descriptor)
    }

    pub fn account_classifications(&self) -> Arc<AccountClassificationRegistry> {
        self.registry(account_classification_descriptor)
    }

    pub fn account_categories(&self) -> Arc<AccountCategoryRegistry> {
        self.registry(account_category_descriptor)
    }

    pub fn member_classifications(&self) -> Arc<MemberClassificationRegistry> {
        self.registry(member_classification_descriptor)
    }

    pub fn member_types(&self) -> Arc<MemberTypeRegistry> {
        self.registry(member_type_descriptor)
    }

    pub fn collaterals(&self) -> Arc<CollateralRegistry> {
        self.registry(collateral_descriptor)
    }

    pub fn loan_statuses(&self) -> Arc<LoanStatusRegistry> {
        self.registry(loan_status_descriptor)
    }
}
