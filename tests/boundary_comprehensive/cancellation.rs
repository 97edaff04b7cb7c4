//! Cancellation and shutdown tests
//!
//! - Cancelled callers skip their remaining steps
//! - Cancelled operations leave the cell untouched, whether they were
//!   waiting for mailbox space or already queued
//! - Operations the worker has started run to completion
//! - Closed boundaries refuse new work

use crate::*;
use cellguard::{BoundaryConfig, CallerGroup, CancelToken, Error, Operation, Step, Token};
use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Counter with room for a single queued operation
fn tight_counter() -> Counter {
    Counter::spawn_with("counter", 0, BoundaryConfig::default().mailbox_capacity(1))
}

/// Poll `fut` once; it must still be waiting
fn assert_pending<F: Future + ?Sized>(fut: Pin<&mut F>, cx: &mut Context<'_>) {
    assert!(fut.poll(cx).is_pending());
}

#[tokio::test]
async fn test_cancelled_group_has_no_effect() {
    let counter = zero_counter();
    let mut group = CallerGroup::new();
    for _ in 0..5 {
        group.spawn(
            counter.handle().clone(),
            vec![Step::Apply(Operation::Increment); 3],
        );
    }
    // Current-thread runtime: no caller has been polled yet
    group.cancel();

    let reports = group.join_all().await;
    assert!(reports.iter().all(|r| r.cancelled == 3 && r.applied == 0));
    assert_eq!(counter.value().await.unwrap(), 0);
    assert_eq!(counter.handle().read().await.unwrap().version, 0);
}

#[tokio::test]
async fn test_cancelled_send_keeps_card() {
    let (sam, tim, _) = trade_collectors(&["car"]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = sam.send_cancellable("car", &tim, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(sam.deck().await.unwrap(), deck(&["car"]));
    assert!(tim.deck().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_uncancelled_token_does_not_interfere() {
    let counter = zero_counter();
    let cancel = CancelToken::new();
    assert_eq!(counter.increment_cancellable(&cancel).await.unwrap(), 1);
    assert_eq!(counter.decrement_cancellable(&cancel).await.unwrap(), 0);

    let (sam, tim, _) = trade_collectors(&["car"]);
    assert!(sam.send_cancellable(Token::from("car"), &tim, &cancel).await.unwrap().is_empty());
    assert_eq!(tim.deck().await.unwrap(), deck(&["car"]));
}

#[tokio::test]
async fn test_shutdown_refuses_new_operations() {
    let counter = zero_counter();
    counter.increment().await.unwrap();

    counter.handle().shutdown();
    counter.handle().closed().await;
    assert!(counter.handle().is_closed());

    let err = counter.increment().await.unwrap_err();
    assert!(matches!(err, Error::Closed(ref name) if name == "counter"));
}

#[tokio::test]
async fn test_send_to_closed_collector_returns_card() {
    let (sam, tim, _) = trade_collectors(&["car"]);
    tim.handle().shutdown();
    tim.handle().closed().await;

    let err = sam.send("car", &tim).await.unwrap_err();
    assert!(matches!(err, Error::Closed(_)));
    assert_eq!(sam.deck().await.unwrap(), deck(&["car"]));
}

#[tokio::test]
async fn test_operation_cancelled_while_queued_is_never_applied() {
    let counter = tight_counter();
    let cancel = CancelToken::new();
    let mut queued = Box::pin(counter.increment_cancellable(&cancel));

    // In the mailbox; the worker has not run yet
    poll_fn(|cx| {
        assert_pending(queued.as_mut(), cx);
        Poll::Ready(())
    })
    .await;
    assert_eq!(counter.handle().metrics().pending, 1);
    cancel.cancel();

    assert!(queued.await.unwrap_err().is_cancelled());
    assert_eq!(counter.value().await.unwrap(), 0);
    let metrics = counter.handle().metrics();
    assert_eq!(metrics.cancelled, 1);
    assert_eq!(metrics.pending, 0);
}

#[tokio::test]
async fn test_operation_cancelled_while_mailbox_full_is_never_applied() {
    let counter = tight_counter();
    let cancel = CancelToken::new();
    let mut first = Box::pin(counter.increment());
    let mut second = Box::pin(counter.increment_cancellable(&cancel));

    // First fills the mailbox, second waits for space
    poll_fn(|cx| {
        assert_pending(first.as_mut(), cx);
        assert_pending(second.as_mut(), cx);
        Poll::Ready(())
    })
    .await;
    cancel.cancel();

    assert!(second.await.unwrap_err().is_cancelled());
    assert_eq!(first.await.unwrap(), 1);
    assert_eq!(counter.value().await.unwrap(), 1);
    let metrics = counter.handle().metrics();
    assert_eq!(metrics.cancelled, 1);
    assert_eq!(metrics.pending, 0);
}

#[tokio::test]
async fn test_started_operation_runs_to_completion() {
    let counter = tight_counter();
    let cancel = CancelToken::new();
    let mut watch = counter.watch();
    let mut op = Box::pin(counter.increment_cancellable(&cancel));

    poll_fn(|cx| {
        assert_pending(op.as_mut(), cx);
        Poll::Ready(())
    })
    .await;
    // Let the worker apply it, then cancel before collecting the reply
    watch.wait_for(|applied| applied.version >= 1).await.unwrap();
    cancel.cancel();

    assert_eq!(op.await.unwrap(), 1);
    assert_eq!(counter.value().await.unwrap(), 1);
    assert_eq!(counter.handle().metrics().cancelled, 0);
}

#[tokio::test]
async fn test_dropped_caller_while_mailbox_full_leaves_no_trace() {
    let counter = tight_counter();
    let mut first = Box::pin(counter.increment());
    let mut second = Box::pin(counter.increment());

    poll_fn(|cx| {
        assert_pending(first.as_mut(), cx);
        assert_pending(second.as_mut(), cx);
        Poll::Ready(())
    })
    .await;
    drop(second);

    assert_eq!(first.await.unwrap(), 1);
    assert_eq!(counter.value().await.unwrap(), 1);
    assert_eq!(counter.handle().metrics().pending, 0);
}
