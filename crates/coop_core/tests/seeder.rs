mod common;

use common::{fixture, fixture_with, Fixture};
use coop_core::entities::{BranchRequest, OrganizationRequest};
use coop_core::{
    default_steps, Context, Core, DeleteMode, FilterClause, OrganizationSeeder, RegistryResult,
    SagaPhase, SeedScope, TenantScope,
};
use rusqlite::Transaction;

const REFERENCE_TABLES: &[&str] = &[
    "banks",
    "bill_and_coins",
    "holidays",
    "general_ledger_accounts_groupings",
    "general_ledger_definitions",
    "accounts",
    "account_classifications",
    "account_categories",
    "member_classifications",
    "member_types",
    "collaterals",
    "loan_statuses",
];

fn live_counts(fx: &Fixture, scope: TenantScope) -> Vec<i64> {
    let filters = scope.filters();
    let (core, ctx, conn) = (&fx.core, &fx.ctx, &fx.conn);
    vec![
        core.banks().arr_count(ctx, conn, &filters).unwrap(),
        core.bill_and_coins().arr_count(ctx, conn, &filters).unwrap(),
        core.holidays().arr_count(ctx, conn, &filters).unwrap(),
        core.general_ledger_accounts_groupings()
            .arr_count(ctx, conn, &filters)
            .unwrap(),
        core.general_ledger_definitions()
            .arr_count(ctx, conn, &filters)
            .unwrap(),
        core.accounts().arr_count(ctx, conn, &filters).unwrap(),
        core.account_classifications()
            .arr_count(ctx, conn, &filters)
            .unwrap(),
        core.account_categories().arr_count(ctx, conn, &filters).unwrap(),
        core.member_classifications()
            .arr_count(ctx, conn, &filters)
            .unwrap(),
        core.member_types().arr_count(ctx, conn, &filters).unwrap(),
        core.collaterals().arr_count(ctx, conn, &filters).unwrap(),
        core.loan_statuses().arr_count(ctx, conn, &filters).unwrap(),
    ]
}

fn stored_rows(fx: &Fixture) -> i64 {
    REFERENCE_TABLES.iter().map(|table| fx.count_rows(table)).sum()
}

fn seed(fx: &mut Fixture, seeder: &OrganizationSeeder, scope: TenantScope) {
    let tx = fx.conn.transaction().unwrap();
    seeder
        .seed(&fx.core, &fx.ctx, &tx, &SeedScope::new(scope, None))
        .unwrap();
    tx.commit().unwrap();
}

fn failing_lookup(
    core: &Core,
    ctx: &Context,
    tx: &Transaction<'_>,
    _: &SeedScope,
) -> RegistryResult<usize> {
    core.accounts()
        .arr_find(ctx, tx, &[FilterClause::eq("no_such_column", 1)], &[], &[])
        .map(|rows| rows.len())
}

#[test]
fn onboarding_creates_tenant_and_every_reference_table() {
    let mut fx = fixture();
    let user = uuid::Uuid::new_v4();

    let tx = fx.conn.transaction().unwrap();
    let onboarded = OrganizationSeeder::default()
        .onboard(
            &fx.core,
            &fx.ctx,
            &tx,
            OrganizationRequest {
                name: "Lands Horizon Cooperative".to_string(),
                description: String::new(),
                is_private: false,
            },
            BranchRequest {
                name: "Main".to_string(),
                branch_type: "main".to_string(),
                email: String::new(),
                address: String::new(),
            },
            Some(user),
        )
        .unwrap();
    tx.commit().unwrap();

    let report = &onboarded.report;
    assert_eq!(report.phase, SagaPhase::Seed);
    assert_eq!(report.steps.len(), 11);
    assert_eq!(report.rows_for("bank"), Some(8));
    assert_eq!(report.rows_for("bill_and_coins"), Some(13));
    assert_eq!(report.rows_for("holiday"), Some(11));
    assert_eq!(report.rows_for("general_ledger"), Some(15));
    assert_eq!(report.rows_for("account"), Some(7));
    assert_eq!(report.rows_for("member_type"), Some(4));
    assert_eq!(report.total_rows(), 85);

    let scope = TenantScope::new(onboarded.organization.record.id, onboarded.branch.record.id);
    assert_eq!(
        live_counts(&fx, scope),
        vec![8, 13, 11, 5, 10, 7, 5, 6, 3, 4, 6, 7]
    );
    assert_eq!(onboarded.branch.organization_id, onboarded.organization.record.id);

    let linked = fx
        .core
        .accounts()
        .arr_count(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::is_not_null("general_ledger_definition_id")],
        )
        .unwrap();
    assert_eq!(linked, 7);
    let unclassified = fx
        .core
        .member_types()
        .arr_find(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::is_null("member_classification_id")],
            &[],
            &[],
        )
        .unwrap();
    assert_eq!(unclassified.len(), 1);
    assert_eq!(unclassified[0].prefix, "CLS");
    assert_eq!(unclassified[0].record.created_by_id, Some(user));
}

#[test]
fn failing_step_aborts_and_rollback_leaves_no_rows() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    let seeder =
        OrganizationSeeder::default().with_step("account", |step| step.with_seed(failing_lookup));

    let tx = fx.conn.transaction().unwrap();
    let err = seeder
        .seed(&fx.core, &fx.ctx, &tx, &SeedScope::new(scope, None))
        .unwrap_err();
    tx.rollback().unwrap();

    assert_eq!(err.phase, SagaPhase::Seed);
    assert_eq!(err.step, "account");
    assert_eq!(err.position, 5);
    assert_eq!(
        err.completed,
        vec!["bank", "bill_and_coins", "holiday", "general_ledger"]
    );
    assert!(err.source.is_schema());
    assert!(err.to_string().starts_with("seed aborted at step 5 `account`"));

    assert_eq!(stored_rows(&fx), 0);
    assert!(live_counts(&fx, scope).iter().all(|count| *count == 0));
}

#[test]
fn retry_after_rollback_starts_from_first_step() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    let broken =
        OrganizationSeeder::default().with_step("collateral", |step| step.with_seed(failing_lookup));

    let tx = fx.conn.transaction().unwrap();
    assert!(broken
        .seed(&fx.core, &fx.ctx, &tx, &SeedScope::new(scope, None))
        .is_err());
    tx.rollback().unwrap();

    seed(&mut fx, &OrganizationSeeder::default(), scope);
    assert_eq!(live_counts(&fx, scope)[0], 8);
    assert_eq!(stored_rows(&fx), 85);
}

#[test]
fn soft_destroy_hides_every_seeded_row() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    let seeder = OrganizationSeeder::default();
    seed(&mut fx, &seeder, scope);

    let tx = fx.conn.transaction().unwrap();
    let report = seeder.destroy(&fx.core, &fx.ctx, &tx, &scope).unwrap();
    tx.commit().unwrap();

    assert_eq!(report.phase, SagaPhase::Destroy);
    let order: Vec<&str> = report.steps.iter().map(|step| step.name).collect();
    let mut expected: Vec<&str> = default_steps().iter().map(|step| step.name).collect();
    expected.reverse();
    assert_eq!(order, expected);
    assert_eq!(report.total_rows(), 85);

    assert!(live_counts(&fx, scope).iter().all(|count| *count == 0));
    assert_eq!(stored_rows(&fx), 85);
}

#[test]
fn hard_destroy_in_reverse_order_removes_every_row() {
    let mut fx = fixture_with(DeleteMode::Hard);
    let scope = fx.tenant("Coop");
    let seeder = OrganizationSeeder::default();
    seed(&mut fx, &seeder, scope);

    let tx = fx.conn.transaction().unwrap();
    seeder.destroy(&fx.core, &fx.ctx, &tx, &scope).unwrap();
    tx.commit().unwrap();

    assert_eq!(stored_rows(&fx), 0);
    assert_eq!(fx.count_rows("branches"), 1);
}

#[test]
fn hard_destroy_in_seed_order_hits_foreign_keys() {
    let mut fx = fixture_with(DeleteMode::Hard);
    let scope = fx.tenant("Coop");
    seed(&mut fx, &OrganizationSeeder::default(), scope);

    let forward = OrganizationSeeder::new(default_steps().into_iter().rev().collect());
    let tx = fx.conn.transaction().unwrap();
    let err = forward
        .destroy(&fx.core, &fx.ctx, &tx, &scope)
        .unwrap_err();
    tx.rollback().unwrap();

    assert_eq!(err.phase, SagaPhase::Destroy);
    assert_eq!(err.step, "general_ledger");
    assert_eq!(err.position, 4);
    assert_eq!(err.source.code(), "storage");
    assert_eq!(stored_rows(&fx), 85);
}

#[test]
fn destroy_only_touches_its_own_scope() {
    let mut fx = fixture_with(DeleteMode::Hard);
    let first = fx.tenant("First");
    let second = fx.tenant("Second");
    let seeder = OrganizationSeeder::default();
    seed(&mut fx, &seeder, first);
    seed(&mut fx, &seeder, second);

    let tx = fx.conn.transaction().unwrap();
    seeder.destroy(&fx.core, &fx.ctx, &tx, &first).unwrap();
    tx.commit().unwrap();

    assert!(live_counts(&fx, first).iter().all(|count| *count == 0));
    assert_eq!(
        live_counts(&fx, second),
        vec![8, 13, 11, 5, 10, 7, 5, 6, 3, 4, 6, 7]
    );
}

#[test]
fn cancelled_context_aborts_at_first_step() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    let ctx = Context::background();
    ctx.cancel();

    let tx = fx.conn.transaction().unwrap();
    let err = OrganizationSeeder::default()
        .seed(&fx.core, &ctx, &tx, &SeedScope::new(scope, None))
        .unwrap_err();
    tx.rollback().unwrap();

    assert_eq!(err.position, 1);
    assert!(err.completed.is_empty());
    assert!(err.source.is_cancelled());
}
