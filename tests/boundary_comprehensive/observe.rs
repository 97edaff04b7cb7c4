//! Observer tests
//!
//! Subscribers see committed snapshots and the final state.

use crate::*;
use cellguard::{BoundaryStatus, CellValue};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_sees_final_counter() {
    let counter = zero_counter();
    let mut watch = counter.watch();
    assert_eq!(watch.name(), "counter");
    assert_eq!(watch.current().value, CellValue::Counter(0));

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let counter = counter.clone();
        tasks.push(tokio::spawn(async move { counter.increment().await }));
    }
    let seen = watch
        .wait_for(|applied| applied.value == CellValue::Counter(10))
        .await
        .unwrap();
    assert_eq!(seen.version, 10);
    for task in tasks {
        task.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_watch_sees_trade_on_both_sides() {
    let (sam, tim, _) = trade_collectors(&["car", "boat"]);
    let mut sam_watch = sam.watch();
    let mut tim_watch = tim.watch();

    sam.send("car", &tim).await.unwrap();

    let after = sam_watch.changed().await.unwrap();
    assert_eq!(after.value, CellValue::Deck(deck(&["boat"])));
    let after = tim_watch.changed().await.unwrap();
    assert_eq!(after.value, CellValue::Deck(deck(&["car"])));
}

#[tokio::test]
async fn test_metrics_after_mixed_outcomes() {
    let (sam, tim, _) = trade_collectors(&["car"]);
    sam.send("car", &tim).await.unwrap();
    assert!(sam.send("car", &tim).await.is_err());

    let metrics = sam.handle().metrics();
    assert_eq!(metrics.applied, 1);
    assert_eq!(metrics.rejected, 1);
    assert_eq!(metrics.pending, 0);
    assert_eq!(sam.handle().status(), BoundaryStatus::Idle);
}
