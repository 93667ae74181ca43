mod common;

use common::{fixture, Fixture};
use coop_core::entities::{
    Account, AccountRequest, Bank, GeneralLedgerAccountsGrouping,
    GeneralLedgerAccountsGroupingRequest, GeneralLedgerDefinition, GeneralLedgerDefinitionRequest,
};
use coop_core::{
    FilterClause, FilterOp, FilterValue, PageRequest, RegistryErrorKind, SchemaError, SortClause,
    TenantScope,
};
use rusqlite::types::Value;

struct Ledger {
    grouping: GeneralLedgerAccountsGrouping,
    cash: GeneralLedgerDefinition,
    loans: GeneralLedgerDefinition,
}

fn ledger(fx: &mut Fixture, scope: TenantScope) -> Ledger {
    let mut grouping = GeneralLedgerAccountsGroupingRequest {
        name: "Assets".to_string(),
        description: String::new(),
        debit_credit: "debit".to_string(),
        from_code: 1000.0,
        to_code: 1999.0,
    }
    .into_model(scope, None);
    fx.core
        .general_ledger_accounts_groupings()
        .create(&fx.ctx, &mut fx.conn, &mut grouping)
        .unwrap();

    let mut definitions = ["Cash on Hand", "Loans Receivable"]
        .into_iter()
        .enumerate()
        .map(|(position, name)| {
            let mut definition = GeneralLedgerDefinitionRequest {
                general_ledger_accounts_grouping_id: Some(grouping.record.id),
                name: name.to_string(),
                description: String::new(),
                general_ledger_type: "Assets".to_string(),
                index_position: position as i64,
            }
            .into_model(scope, None);
            fx.core
                .general_ledger_definitions()
                .create(&fx.ctx, &mut fx.conn, &mut definition)
                .unwrap();
            definition
        })
        .collect::<Vec<_>>();

    let loans = definitions.pop().unwrap();
    let cash = definitions.pop().unwrap();
    Ledger {
        grouping,
        cash,
        loans,
    }
}

fn account(
    fx: &mut Fixture,
    scope: TenantScope,
    definition: Option<&GeneralLedgerDefinition>,
    name: &str,
    account_type: &str,
    max_amount: f64,
    is_internal: bool,
) -> Account {
    let mut account = AccountRequest {
        general_ledger_definition_id: definition.map(|definition| definition.record.id),
        name: name.to_string(),
        description: String::new(),
        account_type: account_type.to_string(),
        min_amount: 0.0,
        max_amount,
        interest_standard: 0.0,
        is_internal,
    }
    .into_model(scope, None);
    fx.core
        .accounts()
        .create(&fx.ctx, &mut fx.conn, &mut account)
        .unwrap();
    account
}

fn names(accounts: &[Account]) -> Vec<&str> {
    accounts.iter().map(|account| account.name.as_str()).collect()
}

struct Seeded {
    fx: Fixture,
    scope: TenantScope,
    ledger: Ledger,
}

fn seeded() -> Seeded {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    let ledger = ledger(&mut fx, scope);
    account(&mut fx, scope, Some(&ledger.cash), "Cash", "Other", 0.0, true);
    account(&mut fx, scope, Some(&ledger.loans), "Regular Loan", "Loan", 500_000.0, false);
    account(&mut fx, scope, Some(&ledger.loans), "Emergency Loan", "Loan", 50_000.0, false);
    account(&mut fx, scope, None, "Savings", "Deposit", 1_000_000.0, false);
    Seeded { fx, scope, ledger }
}

#[test]
fn filters_are_anded_and_sorted_in_order() {
    let Seeded { fx, scope, .. } = seeded();
    let mut filters = scope.filters();
    filters.push(FilterClause::eq("account_type", "Loan"));
    filters.push(FilterClause::gte("max_amount", 10_000.0));

    let found = fx
        .core
        .accounts()
        .arr_find(&fx.ctx, &fx.conn, &filters, &[SortClause::asc("name")], &[])
        .unwrap();
    assert_eq!(names(&found), vec!["Emergency Loan", "Regular Loan"]);

    let by_amount = fx
        .core
        .accounts()
        .arr_find(
            &fx.ctx,
            &fx.conn,
            &filters,
            &[SortClause::desc("maxAmount")],
            &[],
        )
        .unwrap();
    assert_eq!(names(&by_amount), vec!["Regular Loan", "Emergency Loan"]);
}

#[test]
fn default_order_is_newest_first() {
    let Seeded { fx, .. } = seeded();
    let all = fx.core.accounts().list(&fx.ctx, &fx.conn).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all
        .windows(2)
        .all(|pair| pair[0].record.created_at >= pair[1].record.created_at));
}

#[test]
fn set_range_pattern_and_null_operators() {
    let Seeded { fx, .. } = seeded();
    let accounts = fx.core.accounts();
    let find = |filters: &[FilterClause]| {
        let mut found = accounts
            .arr_find(&fx.ctx, &fx.conn, filters, &[SortClause::asc("name")], &[])
            .unwrap();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    };

    assert_eq!(
        names(&find(&[FilterClause::is_in("account_type", ["Deposit", "Other"])])),
        vec!["Cash", "Savings"]
    );
    assert_eq!(
        names(&find(&[FilterClause::not_in("account_type", ["Loan"])])),
        vec!["Cash", "Savings"]
    );
    assert!(find(&[FilterClause::is_in("account_type", Vec::<&str>::new())]).is_empty());
    assert_eq!(
        names(&find(&[FilterClause::between("max_amount", 10_000.0, 600_000.0)])),
        vec!["Emergency Loan", "Regular Loan"]
    );
    assert_eq!(
        names(&find(&[FilterClause::like("name", "%Loan")])),
        vec!["Emergency Loan", "Regular Loan"]
    );
    assert_eq!(
        names(&find(&[FilterClause::is_null("general_ledger_definition_id")])),
        vec!["Savings"]
    );
    assert_eq!(
        names(&find(&[FilterClause::eq(
            "general_ledger_definition_id",
            None::<uuid::Uuid>
        )])),
        vec!["Savings"]
    );
    assert_eq!(find(&[FilterClause::is_not_null("GeneralLedgerDefinitionID")]).len(), 3);
    assert_eq!(
        names(&find(&[FilterClause::not_eq("account_type", "Loan")])),
        vec!["Cash", "Savings"]
    );
}

#[test]
fn wire_operators_parse_before_compiling() {
    let Seeded { fx, .. } = seeded();
    let clause = FilterClause::parse("max_amount", ">", 100_000.0).unwrap();
    assert_eq!(clause.op, FilterOp::Gt);
    let found = fx
        .core
        .accounts()
        .arr_find(&fx.ctx, &fx.conn, &[clause], &[SortClause::asc("name")], &[])
        .unwrap();
    assert_eq!(names(&found), vec!["Regular Loan", "Savings"]);
}

#[test]
fn dotted_fields_filter_through_belongs_to_relations() {
    let Seeded { fx, scope, .. } = seeded();
    let found = fx
        .core
        .accounts()
        .arr_find(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::eq("GeneralLedgerDefinition.name", "Loans Receivable")],
            &[SortClause::asc("GeneralLedgerDefinition.index_position"), SortClause::asc("name")],
            &[],
        )
        .unwrap();
    assert_eq!(names(&found), vec!["Emergency Loan", "Regular Loan"]);

    let in_branch = fx
        .core
        .accounts()
        .arr_count(&fx.ctx, &fx.conn, &[FilterClause::eq("Branch.name", "Coop main")])
        .unwrap();
    assert_eq!(in_branch, 4);

    let other = fx
        .core
        .accounts()
        .arr_count(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::eq("Branch.id", uuid::Uuid::new_v4())],
        )
        .unwrap();
    assert_eq!(other, 0);

    let in_scope = fx
        .core
        .accounts()
        .arr_count(&fx.ctx, &fx.conn, &[FilterClause::eq("Branch.id", scope.branch_id)])
        .unwrap();
    assert_eq!(in_scope, 4);
}

#[test]
fn unknown_fields_and_bad_shapes_are_schema_errors() {
    let Seeded { fx, .. } = seeded();
    let accounts = fx.core.accounts();

    let err = accounts
        .arr_find(&fx.ctx, &fx.conn, &[FilterClause::eq("no_such_column", 1)], &[], &[])
        .unwrap_err();
    assert!(err.is_schema());
    assert!(matches!(
        err.kind,
        RegistryErrorKind::Schema(SchemaError::UnknownField { ref field, .. }) if field == "no_such_column"
    ));

    let err = accounts
        .arr_find(&fx.ctx, &fx.conn, &[], &[SortClause::asc("nope")], &[])
        .unwrap_err();
    assert!(err.is_schema());

    let err = accounts
        .arr_count(&fx.ctx, &fx.conn, &[FilterClause::eq("Nope.name", "x")])
        .unwrap_err();
    assert!(matches!(
        err.kind,
        RegistryErrorKind::Schema(SchemaError::UnknownRelation { .. })
    ));

    let err = accounts
        .arr_count(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::new("account_type", FilterOp::Eq, FilterValue::list(["Loan"]))],
        )
        .unwrap_err();
    assert!(err.is_schema());

    assert!(SortClause::parse("name", "sideways").is_err());
}

#[test]
fn find_by_example_ignores_zero_values() {
    let Seeded { fx, scope, ledger } = seeded();
    let accounts = fx.core.accounts();

    let example = Account {
        scope,
        account_type: "Loan".to_string(),
        ..Account::default()
    };
    assert_eq!(accounts.find(&fx.ctx, &fx.conn, &example).unwrap().len(), 2);
    assert_eq!(accounts.count(&fx.ctx, &fx.conn, &example).unwrap(), 2);

    // `is_internal = false` is indistinguishable from "not set".
    let external_only = Account {
        scope,
        is_internal: false,
        ..Account::default()
    };
    assert_eq!(accounts.find(&fx.ctx, &fx.conn, &external_only).unwrap().len(), 4);
    let external = accounts
        .arr_find(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::eq("is_internal", false)],
            &[],
            &[],
        )
        .unwrap();
    assert_eq!(external.len(), 3);

    let one = accounts
        .find_one(
            &fx.ctx,
            &fx.conn,
            &Account {
                general_ledger_definition_id: Some(ledger.cash.record.id),
                ..Account::default()
            },
        )
        .unwrap();
    assert_eq!(one.name, "Cash");

    let err = accounts
        .find_one(
            &fx.ctx,
            &fx.conn,
            &Account {
                name: "Missing".to_string(),
                ..Account::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err.kind, RegistryErrorKind::NotFound(None)));
}

#[test]
fn arr_find_one_returns_first_by_sort_or_not_found() {
    let Seeded { fx, .. } = seeded();
    let accounts = fx.core.accounts();
    let first = accounts
        .arr_find_one(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::eq("account_type", "Loan")],
            &[SortClause::desc("max_amount")],
            &[],
        )
        .unwrap();
    assert_eq!(first.name, "Regular Loan");

    assert!(accounts
        .arr_find_one(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::eq("account_type", "Share")],
            &[],
            &[],
        )
        .unwrap_err()
        .is_not_found());
}

#[test]
fn nested_preloads_batch_load_every_level() {
    let Seeded { fx, ledger, .. } = seeded();

    let accounts = fx
        .core
        .accounts()
        .arr_find(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::is_not_null("general_ledger_definition_id")],
            &[SortClause::asc("name")],
            &["GeneralLedgerDefinition.GeneralLedgerAccountsGrouping", "Organization"],
        )
        .unwrap();
    assert_eq!(accounts.len(), 3);
    for account in &accounts {
        let definition = account.definition.as_deref().unwrap();
        assert_eq!(Some(definition.record.id), account.general_ledger_definition_id);
        let grouping = definition.grouping.as_deref().unwrap();
        assert_eq!(grouping.record.id, ledger.grouping.record.id);
        assert_eq!(account.refs.organization.as_deref().unwrap().name, "Coop");
        assert!(account.refs.branch.is_none());
    }

    let response = fx.core.accounts().to_model(Some(&accounts[0])).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["general_ledger_definition"]["name"], "Cash on Hand");
    assert_eq!(
        json["general_ledger_definition"]["general_ledger_accounts_grouping"]["name"],
        "Assets"
    );
    assert_eq!(json["organization"]["name"], "Coop");
}

#[test]
fn has_many_preload_groups_children_by_parent() {
    let Seeded { fx, ledger, .. } = seeded();

    let grouping = fx
        .core
        .general_ledger_accounts_groupings()
        .arr_find_one(
            &fx.ctx,
            &fx.conn,
            &[FilterClause::eq("id", ledger.grouping.record.id)],
            &[],
            &["general_ledger_definitions"],
        )
        .unwrap();
    let children: Vec<&str> = grouping
        .definitions
        .iter()
        .map(|definition| definition.name.as_str())
        .collect();
    assert_eq!(children, vec!["Cash on Hand", "Loans Receivable"]);
}

#[test]
fn default_preloads_apply_to_every_read() {
    let Seeded { fx, ledger, .. } = seeded();
    let definition = fx
        .core
        .general_ledger_definitions()
        .get_by_id(&fx.ctx, &fx.conn, ledger.loans.record.id)
        .unwrap();
    assert_eq!(definition.grouping.as_deref().unwrap().name, "Assets");
}

#[test]
fn invalid_preload_paths_fail_before_querying() {
    let Seeded { fx, .. } = seeded();
    let accounts = fx.core.accounts();

    let err = accounts
        .arr_find(&fx.ctx, &fx.conn, &[], &[], &["Nope"])
        .unwrap_err();
    assert!(matches!(
        err.kind,
        RegistryErrorKind::Schema(SchemaError::UnknownRelation { .. })
    ));

    let err = accounts
        .arr_find(&fx.ctx, &fx.conn, &[], &[], &["GeneralLedgerDefinition.Nope"])
        .unwrap_err();
    assert!(err.is_schema());

    let err = accounts
        .arr_find(&fx.ctx, &fx.conn, &[], &[], &["GeneralLedgerDefinition..Organization"])
        .unwrap_err();
    assert!(matches!(
        err.kind,
        RegistryErrorKind::Schema(SchemaError::InvalidRelationPath(_))
    ));
}

#[test]
fn find_page_reports_window_and_totals() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    for index in 0..25 {
        fx.bank(scope, &format!("Bank {index:02}"));
    }
    let banks = fx.core.banks();

    let page = banks
        .find_page(
            &fx.ctx,
            &fx.conn,
            &scope.filters(),
            &[SortClause::asc("name")],
            PageRequest::new(2, 10),
        )
        .unwrap();
    assert_eq!(page.total_size, 25);
    assert_eq!(page.total_page, 3);
    assert_eq!(page.page_index, 2);
    let page_names: Vec<&str> = page.data.iter().map(|bank: &Bank| bank.name.as_str()).collect();
    assert_eq!(page_names, vec!["Bank 20", "Bank 21", "Bank 22", "Bank 23", "Bank 24"]);

    let beyond = banks
        .find_page(&fx.ctx, &fx.conn, &[], &[], PageRequest::new(9, 10))
        .unwrap();
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.total_size, 25);

    let projected = page.map(|bank| banks.to_model(Some(&bank)));
    assert_eq!(projected.data.len(), 5);
}

#[test]
fn find_page_with_zero_size_uses_default_window() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    for index in 0..12 {
        fx.bank(scope, &format!("Bank {index:02}"));
    }

    let page = fx
        .core
        .banks()
        .find_page(&fx.ctx, &fx.conn, &[], &[], PageRequest::new(0, 0))
        .unwrap();
    assert_eq!(page.page_size, 10);
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.total_size, 12);
    assert_eq!(page.total_page, 2);
}

#[test]
fn find_page_far_past_the_end_is_empty() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    for name in ["North", "South", "East"] {
        fx.bank(scope, name);
    }

    let page = fx
        .core
        .banks()
        .find_page(&fx.ctx, &fx.conn, &[], &[], PageRequest::new(usize::MAX, 10))
        .unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.total_size, 3);
    assert_eq!(page.total_page, 1);
    assert_eq!(page.page_index, usize::MAX);
}

#[test]
fn query_handle_accepts_only_read_statements() {
    let Seeded { fx, scope, .. } = seeded();
    let accounts = fx.core.accounts();
    let handle = accounts.client(&fx.ctx, &fx.conn);
    assert_eq!(handle.table(), "accounts");

    let sql = format!(
        "SELECT name FROM accounts WHERE {} AND is_internal = 1 ORDER BY name;",
        handle.live_predicate()
    );
    let internal: Vec<String> = handle.query(&sql, [], |row| row.get(0)).unwrap();
    assert_eq!(internal, vec!["Cash".to_string()]);

    let err = handle
        .query("DELETE FROM accounts;", [], |row| row.get::<_, i64>(0))
        .unwrap_err();
    assert!(matches!(
        err.kind,
        RegistryErrorKind::Schema(SchemaError::ReadOnlyViolation(_))
    ));
    assert_eq!(fx.count_rows("accounts"), 4);

    let grouped = handle.count_by("accountType", &scope.filters()).unwrap();
    assert_eq!(
        grouped,
        vec![
            (Value::Text("Deposit".to_string()), 1),
            (Value::Text("Loan".to_string()), 2),
            (Value::Text("Other".to_string()), 1),
        ]
    );
}

#[test]
fn soft_deleted_rows_are_invisible_to_every_read() {
    let Seeded { mut fx, scope, .. } = seeded();
    let accounts = fx.core.accounts();
    let savings = accounts
        .arr_find_one(&fx.ctx, &fx.conn, &[FilterClause::eq("name", "Savings")], &[], &[])
        .unwrap();
    accounts.delete(&fx.ctx, &mut fx.conn, savings.record.id).unwrap();

    assert_eq!(accounts.arr_count(&fx.ctx, &fx.conn, &scope.filters()).unwrap(), 3);
    assert!(accounts
        .arr_find(&fx.ctx, &fx.conn, &[FilterClause::eq("name", "Savings")], &[], &[])
        .unwrap()
        .is_empty());
    let grouped = accounts
        .client(&fx.ctx, &fx.conn)
        .count_by("account_type", &[])
        .unwrap();
    assert!(grouped
        .iter()
        .all(|(value, _)| value != &Value::Text("Deposit".to_string())));
}
