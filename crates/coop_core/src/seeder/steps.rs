//! Seed and destroy functions of the default onboarding steps.

use super::data::{
    ACCOUNTS, ACCOUNT_CATEGORIES, ACCOUNT_CLASSIFICATIONS, BANKS, BILLS_AND_COINS, COLLATERALS,
    COUNTRY_CODE, GENERAL_LEDGER, HOLIDAYS, LOAN_STATUSES, MEMBER_CLASSIFICATIONS, MEMBER_TYPES,
};
use super::SeedScope;
use crate::app::Core;
use crate::context::Context;
use crate::entities::{
    AccountCategoryRequest, AccountClassificationRequest, AccountRequest, BankRequest,
    BillAndCoinsRequest, CollateralRequest, GeneralLedgerAccountsGroupingRequest,
    GeneralLedgerDefinitionRequest, HolidayRequest, LoanStatusRequest,
    MemberClassificationRequest, MemberTypeRequest,
};
use crate::model::{Entity, TenantScope, TenantScoped};
use crate::registry::{Registry, RegistryResult};
use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::Transaction;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

fn create_all<T, R, Q>(
    registry: &Registry<T, R, Q>,
    ctx: &Context,
    tx: &Transaction<'_>,
    rows: impl IntoIterator<Item = T>,
) -> RegistryResult<Vec<T>>
where
    T: Entity,
    R: Serialize,
{
    rows.into_iter()
        .map(|mut row| {
            registry.create_with_tx(ctx, tx, &mut row)?;
            Ok(row)
        })
        .collect()
}

/// Deletes every live row of the scope one by one, stopping at the first
/// failure.
fn destroy_scoped<T, R, Q>(
    registry: &Registry<T, R, Q>,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize>
where
    T: TenantScoped,
    R: Serialize,
{
    let rows = registry.arr_find(ctx, tx, &scope.filters(), &[], &[])?;
    for row in &rows {
        registry.delete_with_tx(ctx, tx, row.id())?;
    }
    Ok(rows.len())
}

/// Name to id index of rows already seeded in the scope.
fn index_by_name<T, R, Q>(
    registry: &Registry<T, R, Q>,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
    name: fn(&T) -> &str,
) -> RegistryResult<HashMap<String, Uuid>>
where
    T: TenantScoped,
    R: Serialize,
{
    Ok(registry
        .arr_find(ctx, tx, &scope.filters(), &[], &[])?
        .iter()
        .map(|row| (name(row).to_string(), row.id()))
        .collect())
}

pub(super) fn seed_banks(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let rows = BANKS.iter().map(|(name, description)| {
        BankRequest {
            name: name.to_string(),
            description: description.to_string(),
        }
        .into_model(seed.scope, seed.user_id)
    });
    Ok(create_all(&core.banks(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_banks(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.banks(), ctx, tx, scope)
}

pub(super) fn seed_bill_and_coins(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let rows = BILLS_AND_COINS.iter().map(|(name, value)| {
        BillAndCoinsRequest {
            name: name.to_string(),
            value: *value,
            country_code: COUNTRY_CODE.to_string(),
        }
        .into_model(seed.scope, seed.user_id)
    });
    Ok(create_all(&core.bill_and_coins(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_bill_and_coins(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.bill_and_coins(), ctx, tx, scope)
}

fn midnight_utc_ms(year: i32, month: u32, day: u32) -> Option<i64> {
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(0, 0, 0)
        .map(|date| date.and_utc().timestamp_millis())
}

pub(super) fn seed_holidays(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let year = Utc::now().year();
    let rows = HOLIDAYS
        .iter()
        .filter_map(|(month, day, name, description)| {
            midnight_utc_ms(year, *month, *day).map(|entry_date| HolidayRequest {
                name: name.to_string(),
                description: description.to_string(),
                entry_date,
            })
        })
        .map(|request| request.into_model(seed.scope, seed.user_id));
    Ok(create_all(&core.holidays(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_holidays(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.holidays(), ctx, tx, scope)
}

/// Groupings first, then the definitions pointing at them.
pub(super) fn seed_general_ledger(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let groupings = core.general_ledger_accounts_groupings();
    let definitions = core.general_ledger_definitions();
    let mut created = 0;

    for grouping_seed in GENERAL_LEDGER {
        let mut grouping = GeneralLedgerAccountsGroupingRequest {
            name: grouping_seed.name.to_string(),
            description: grouping_seed.description.to_string(),
            debit_credit: grouping_seed.debit_credit.to_string(),
            from_code: grouping_seed.from_code,
            to_code: grouping_seed.to_code,
        }
        .into_model(seed.scope, seed.user_id);
        groupings.create_with_tx(ctx, tx, &mut grouping)?;
        created += 1;

        let rows = grouping_seed
            .definitions
            .iter()
            .enumerate()
            .map(|(position, (name, description))| {
                GeneralLedgerDefinitionRequest {
                    general_ledger_accounts_grouping_id: Some(grouping.id()),
                    name: name.to_string(),
                    description: description.to_string(),
                    general_ledger_type: grouping_seed.name.to_string(),
                    index_position: position as i64,
                }
                .into_model(seed.scope, seed.user_id)
            });
        created += create_all(&definitions, ctx, tx, rows)?.len();
    }
    Ok(created)
}

pub(super) fn destroy_general_ledger(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    let definitions = destroy_scoped(&core.general_ledger_definitions(), ctx, tx, scope)?;
    let groupings = destroy_scoped(&core.general_ledger_accounts_groupings(), ctx, tx, scope)?;
    Ok(definitions + groupings)
}

pub(super) fn seed_accounts(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let definitions = index_by_name(
        &core.general_ledger_definitions(),
        ctx,
        tx,
        &seed.scope,
        |definition| definition.name.as_str(),
    )?;
    let rows = ACCOUNTS.iter().map(|account| {
        AccountRequest {
            general_ledger_definition_id: definitions.get(account.definition).copied(),
            name: account.name.to_string(),
            description: account.description.to_string(),
            account_type: account.account_type.to_string(),
            min_amount: account.min_amount,
            max_amount: account.max_amount,
            interest_standard: account.interest_standard,
            is_internal: account.is_internal,
        }
        .into_model(seed.scope, seed.user_id)
    });
    Ok(create_all(&core.accounts(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_accounts(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.accounts(), ctx, tx, scope)
}

pub(super) fn seed_account_classifications(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let rows = ACCOUNT_CLASSIFICATIONS.iter().map(|(name, description)| {
        AccountClassificationRequest {
            name: name.to_string(),
            description: description.to_string(),
        }
        .into_model(seed.scope, seed.user_id)
    });
    Ok(create_all(&core.account_classifications(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_account_classifications(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.account_classifications(), ctx, tx, scope)
}

pub(super) fn seed_account_categories(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let rows = ACCOUNT_CATEGORIES.iter().map(|(name, description)| {
        AccountCategoryRequest {
            name: name.to_string(),
            description: description.to_string(),
        }
        .into_model(seed.scope, seed.user_id)
    });
    Ok(create_all(&core.account_categories(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_account_categories(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.account_categories(), ctx, tx, scope)
}

pub(super) fn seed_member_classifications(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let rows = MEMBER_CLASSIFICATIONS.iter().map(|(name, description)| {
        MemberClassificationRequest {
            name: name.to_string(),
            description: description.to_string(),
        }
        .into_model(seed.scope, seed.user_id)
    });
    Ok(create_all(&core.member_classifications(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_member_classifications(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.member_classifications(), ctx, tx, scope)
}

pub(super) fn seed_member_types(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let classifications = index_by_name(
        &core.member_classifications(),
        ctx,
        tx,
        &seed.scope,
        |classification| classification.name.as_str(),
    )?;
    let rows = MEMBER_TYPES
        .iter()
        .map(|(classification, name, prefix, description)| {
            MemberTypeRequest {
                member_classification_id: classifications.get(*classification).copied(),
                name: name.to_string(),
                prefix: prefix.to_string(),
                description: description.to_string(),
            }
            .into_model(seed.scope, seed.user_id)
        });
    Ok(create_all(&core.member_types(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_member_types(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.member_types(), ctx, tx, scope)
}

pub(super) fn seed_collaterals(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let rows = COLLATERALS.iter().map(|(icon, name, description)| {
        CollateralRequest {
            icon: icon.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
        .into_model(seed.scope, seed.user_id)
    });
    Ok(create_all(&core.collaterals(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_collaterals(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.collaterals(), ctx, tx, scope)
}

pub(super) fn seed_loan_statuses(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    seed: &SeedScope,
) -> RegistryResult<usize> {
    let rows = LOAN_STATUSES.iter().map(|(name, icon, color, description)| {
        LoanStatusRequest {
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            description: description.to_string(),
        }
        .into_model(seed.scope, seed.user_id)
    });
    Ok(create_all(&core.loan_statuses(), ctx, tx, rows)?.len())
}

pub(super) fn destroy_loan_statuses(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    scope: &TenantScope,
) -> RegistryResult<usize> {
    destroy_scoped(&core.loan_statuses(), ctx, tx, scope)
}

#[cfg(test)]
mod tests {
    use super::midnight_utc_ms;

    #[test]
    fn holiday_dates_are_utc_midnight() {
        assert_eq!(midnight_utc_ms(1970, 1, 2), Some(86_400_000));
        assert_eq!(midnight_utc_ms(2023, 2, 30), None);
    }
}
