use coop_core::{Core, DeleteMode, MemoryBroker};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_accessors_share_one_registry() {
    let core = Core::new(Arc::new(MemoryBroker::new()), DeleteMode::Soft);
    let barrier = Barrier::new(8);

    let registries: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    (core.accounts(), core.member_types())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let (accounts, member_types) = &registries[0];
    assert!(registries
        .iter()
        .all(|(a, m)| Arc::ptr_eq(a, accounts) && Arc::ptr_eq(m, member_types)));
    assert_eq!(core.cache().len(), 2);
}

#[test]
fn registries_follow_core_delete_mode() {
    let core = Core::new(Arc::new(MemoryBroker::new()), DeleteMode::Hard);
    assert_eq!(core.delete_mode(), DeleteMode::Hard);
    assert_eq!(core.banks().descriptor().delete_mode, DeleteMode::Hard);
    assert_eq!(
        core.general_ledger_definitions().descriptor().preloads,
        vec!["GeneralLedgerAccountsGrouping".to_string()]
    );
}
