//! Concurrent same-user operations must serialize per record: no lost
//! debits, no double-spends, no quota overruns.

use berrybank::catalog::Catalog;
use berrybank::ledger::{purchase, try_draw, LedgerError, LedgerStoreBuilder};
use tempfile::TempDir;

#[test]
fn concurrent_purchases_never_double_spend() {
    let dir = TempDir::new().expect("tempdir");
    let store = LedgerStoreBuilder::new(dir.path()).open().expect("store");
    let catalog = Catalog::standard();

    // Exactly one unit price of steel: at most one buyer may observe
    // sufficient funds.
    store
        .update_balance("double", |bal| {
            bal.amount = 20;
            Ok(())
        })
        .expect("fund");

    let successes = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| purchase(&store, &catalog, "double", "steel", 1).is_ok())
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .filter(|ok| *ok)
            .count()
    });

    assert_eq!(successes, 1, "exactly one purchase may succeed");
    assert_eq!(store.balance("double").expect("balance").amount, 0);
    assert_eq!(store.inventory("double").expect("inventory").item_count("steel"), 1);
}

#[test]
fn concurrent_credits_are_not_lost() {
    let dir = TempDir::new().expect("tempdir");
    let store = LedgerStoreBuilder::new(dir.path()).open().expect("store");
    let catalog = Catalog::standard();

    store
        .update_balance("hoarder", |bal| {
            bal.amount = 10_000;
            Ok(())
        })
        .expect("fund");

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..5 {
                    purchase(&store, &catalog, "hoarder", "wood", 1).expect("cheap buy");
                }
            });
        }
    });

    // 20 purchases at 5 berries each, every debit and credit accounted for.
    assert_eq!(store.balance("hoarder").expect("balance").amount, 10_000 - 100);
    assert_eq!(store.inventory("hoarder").expect("inventory").item_count("wood"), 20);
}

#[test]
fn concurrent_draws_respect_capacity() {
    let dir = TempDir::new().expect("tempdir");
    let store = LedgerStoreBuilder::new(dir.path()).open().expect("store");

    let successes = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let mut ok = 0usize;
                    for _ in 0..3 {
                        match try_draw(&store, "rush", 1, 5) {
                            Ok(_) => ok += 1,
                            Err(LedgerError::QuotaExceeded { .. }) => {}
                            Err(other) => panic!("unexpected error: {other}"),
                        }
                    }
                    ok
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("thread")).sum::<usize>()
    });

    assert_eq!(successes, 5, "12 attempts against capacity 5");
    let record = store.pull("rush", 1).expect("get").expect("record");
    assert_eq!(record.used, 5);
    assert_eq!(record.total_pulls, 5);
}
