mod common;

use common::fixture;
use coop_core::entities::BankRequest;
use coop_core::{Context, RegistryErrorKind};
use std::time::{Duration, Instant};

#[test]
fn cancelled_context_fails_before_touching_storage() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    let ctx = Context::background();
    ctx.cancel();

    let mut bank = BankRequest {
        name: "BDO".to_string(),
        description: String::new(),
    }
    .into_model(scope, None);
    let err = fx
        .core
        .banks()
        .create(&ctx, &mut fx.conn, &mut bank)
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.code(), "cancelled");
    assert!(!bank.record.is_persisted());
    assert_eq!(fx.count_rows("banks"), 0);
    assert!(fx.broker.published().is_empty());

    let err = fx
        .core
        .banks()
        .list(&ctx.with_timeout(Duration::from_secs(60)), &fx.conn)
        .unwrap_err();
    assert!(matches!(err.kind, RegistryErrorKind::Cancelled));
}

#[test]
fn expired_deadline_is_cancelled() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    let expired = Context::background().with_deadline(Instant::now());

    let err = fx
        .core
        .banks()
        .arr_count(&expired, &fx.conn, &scope.filters())
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn deadline_interrupts_running_statement_and_connection_recovers() {
    let mut fx = fixture();
    let scope = fx.tenant("Coop");
    fx.bank(scope, "BDO");
    let banks = fx.core.banks();

    let ctx = Context::background().with_timeout(Duration::from_millis(50));
    let started_at = Instant::now();
    let err = banks
        .client(&ctx, &fx.conn)
        .query(
            "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n)
             SELECT count(*) FROM n;",
            [],
            |row| row.get::<_, i64>(0),
        )
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.operation, "client");
    assert!(started_at.elapsed() < Duration::from_secs(10));

    let count = banks
        .arr_count(&fx.ctx, &fx.conn, &scope.filters())
        .unwrap();
    assert_eq!(count, 1);
}
