//! Unguarded baseline tests
//!
//! The racy variants are forced into their bad interleavings with a gate, so
//! the anomalies show up on every run.

use crate::*;
use cellguard::{RaceWindow, RacyCounter, RiskyCollector, Token};
use std::sync::Arc;
use std::thread;

#[test]
fn test_racy_counter_loses_gated_update() {
    let counter = Arc::new(RacyCounter::with_window("racy", 0, RaceWindow::gate(2)));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || counter.increment())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // Both threads read 0 before either wrote
    assert_eq!(counter.get(), 1);
}

#[test]
fn test_racy_counter_is_fine_without_contention() {
    let counter = RacyCounter::new("racy", 0);
    for _ in 0..10 {
        counter.increment();
    }
    for _ in 0..10 {
        counter.decrement();
    }
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_risky_collector_duplicates_gated_card() {
    let sam = Arc::new(RiskyCollector::with_window(
        "sam",
        deck(&["car", "boat"]),
        RaceWindow::gate(2),
    ));
    let tim = Arc::new(RiskyCollector::new("tim", deck(&[])));
    let adam = Arc::new(RiskyCollector::new("adam", deck(&[])));

    let handles: Vec<_> = [Arc::clone(&tim), Arc::clone(&adam)]
        .into_iter()
        .map(|to| {
            let sam = Arc::clone(&sam);
            thread::spawn(move || sam.send("car", &to))
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let car = Token::from("car");
    assert_eq!(sam.deck(), deck(&["boat"]));
    assert!(tim.deck().contains(&car));
    assert!(adam.deck().contains(&car));
}

#[test]
fn test_risky_collector_rejects_missing_card() {
    let sam = RiskyCollector::new("sam", deck(&["boat"]));
    let tim = RiskyCollector::new("tim", deck(&[]));
    assert!(!sam.send("car", &tim));
    assert!(tim.deck().is_empty());
}
