//! Isolated counter tests
//!
//! - Pairs of increments and decrements from independent callers
//! - Mixed async and thread callers
//! - Version accounting

use crate::*;
use cellguard::{run_on_threads, CallerGroup, LockedCell, Operation, StateCell, Step};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hundred_pairs_net_zero() {
    let counter = zero_counter();

    let mut tasks = Vec::new();
    for i in 0..200 {
        let counter = counter.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                counter.increment().await
            } else {
                counter.decrement().await
            }
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(counter.value().await.unwrap(), 0);
    assert_eq!(counter.handle().read().await.unwrap().version, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_ten_increments_ten_decrements_via_group() {
    let counter = zero_counter();
    let mut group = CallerGroup::new();
    for _ in 0..10 {
        group.spawn(counter.handle().clone(), vec![Step::Apply(Operation::Increment)]);
        group.spawn(counter.handle().clone(), vec![Step::Apply(Operation::Decrement)]);
    }
    assert_eq!(group.len(), 20);

    let reports = group.join_all().await;
    assert_eq!(reports.len(), 20);
    assert!(reports.iter().all(|r| r.applied == 1 && r.failed == 0));
    assert_eq!(reports.iter().map(|r| r.net_delta).sum::<i64>(), 0);
    assert_eq!(counter.value().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_callers_share_async_counter() {
    let counter = zero_counter();
    let handle = Arc::new(counter.handle().clone());

    let scripts = (0..4)
        .map(|_| vec![Operation::Increment; 25])
        .collect();
    let reports = tokio::task::spawn_blocking(move || run_on_threads(handle, scripts))
        .await
        .unwrap();

    assert_eq!(reports.iter().map(|r| r.applied).sum::<usize>(), 100);
    assert_eq!(counter.value().await.unwrap(), 100);
}

#[test]
fn test_locked_counter_pairs_net_zero() {
    let cell = Arc::new(LockedCell::new(StateCell::counter("locked", 0)));
    let scripts = (0..10)
        .map(|i| {
            if i % 2 == 0 {
                vec![Operation::Increment; 10]
            } else {
                vec![Operation::Decrement; 10]
            }
        })
        .collect();

    let reports = run_on_threads(Arc::clone(&cell), scripts);
    assert!(reports.iter().all(|r| r.applied == 10));
    let after = cell.read().unwrap();
    assert_eq!(after.value.units(), 0);
    assert_eq!(after.version, 100);
}

#[tokio::test]
async fn test_counter_on_deck_is_wrong_kind() {
    let collector = Collector::spawn("sam", ["car"]);
    let err = collector.handle().apply(Operation::Increment).await.unwrap_err();
    assert!(err.is_operation_failed());
    assert_eq!(collector.deck().await.unwrap(), deck(&["car"]));
}
