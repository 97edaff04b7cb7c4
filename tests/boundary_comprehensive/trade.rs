//! Card trade tests
//!
//! - Two concurrent sends of one card: exactly one wins
//! - Missing cards leave both sides unchanged
//! - Conservation under many concurrent trades

use crate::*;
use cellguard::{CallerGroup, Error, Outcome, Step, Token};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_car_sent_to_two_collectors_exactly_once() {
    let (sam, tim, adam) = trade_collectors(&["car", "boat"]);

    let a = {
        let (sam, tim) = (sam.clone(), tim.clone());
        tokio::spawn(async move { sam.try_send("car", &tim).await })
    };
    let b = {
        let (sam, adam) = (sam.clone(), adam.clone());
        tokio::spawn(async move { sam.try_send("car", &adam).await })
    };
    let sent = [a.await.unwrap(), b.await.unwrap()];

    assert_eq!(sent.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(sam.deck().await.unwrap(), deck(&["boat"]));
    let tim_deck = tim.deck().await.unwrap();
    let adam_deck = adam.deck().await.unwrap();
    assert_eq!(tim_deck.len() + adam_deck.len(), 1);
    assert!(tim_deck.contains(&Token::from("car")) ^ adam_deck.contains(&Token::from("car")));
    assert_eq!(total_cards(&[&sam, &tim, &adam]).await, 2);
}

#[tokio::test]
async fn test_missing_card_leaves_decks_unchanged() {
    let (sam, tim, _) = trade_collectors(&["boat"]);

    let err = sam.send("car", &tim).await.unwrap_err();
    assert!(matches!(err, Error::OperationFailed(_)));
    assert_eq!(sam.deck().await.unwrap(), deck(&["boat"]));
    assert!(tim.deck().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_send_then_send_back() {
    let (sam, tim, _) = trade_collectors(&["car"]);

    assert!(sam.send("car", &tim).await.unwrap().is_empty());
    assert_eq!(tim.send("car", &sam).await.unwrap(), deck(&[]));
    assert_eq!(sam.deck().await.unwrap(), deck(&["car"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_group_trades_report_one_winner() {
    let (sam, tim, adam) = trade_collectors(&["car", "boat", "plane"]);

    let mut group = CallerGroup::new();
    for to in [&tim, &adam] {
        group.spawn(
            sam.handle().clone(),
            ["car", "boat", "plane"]
                .into_iter()
                .map(|card| Step::Transfer {
                    token: Token::from(card),
                    to: to.handle().clone(),
                })
                .collect(),
        );
    }
    let reports = group.join_all().await;

    // Every card went to exactly one receiver
    assert_eq!(reports.iter().map(|r| r.applied).sum::<usize>(), 3);
    assert_eq!(reports.iter().map(|r| r.failed).sum::<usize>(), 3);
    for report in &reports {
        for outcome in &report.outcomes {
            if let Outcome::Failed { reason, .. } = outcome {
                assert!(reason.contains("not in the deck"), "{}", reason);
            }
        }
    }
    assert!(sam.deck().await.unwrap().is_empty());
    assert_eq!(total_cards(&[&sam, &tim, &adam]).await, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_round_robin_trades_conserve_cards() {
    let cards = ["car", "boat", "plane", "house", "bike", "kite"];
    let (sam, tim, adam) = trade_collectors(&cards);
    let ring = [sam.clone(), tim.clone(), adam.clone()];

    let mut tasks = Vec::new();
    for round in 0..60usize {
        let from = ring[round % 3].clone();
        let to = ring[(round + 1) % 3].clone();
        let card = cards[round % cards.len()];
        tasks.push(tokio::spawn(async move { from.try_send(card, &to).await }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mut all = Vec::new();
    for c in &ring {
        all.extend(c.deck().await.unwrap().iter().cloned());
    }
    all.sort();
    let expected: Vec<Token> = deck(&cards).iter().cloned().collect();
    assert_eq!(all, expected);
}

#[tokio::test]
async fn test_send_dropped_after_removal_still_arrives() {
    let (sam, tim, _) = trade_collectors(&["car"]);
    let mut sam_watch = sam.watch();
    let mut tim_watch = tim.watch();

    // Give up on the send once the card has left sam
    tokio::select! {
        biased;
        _ = sam_watch.wait_for(|applied| applied.version >= 1) => {}
        _ = sam.send("car", &tim) => {}
    }

    let arrived = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        tim_watch.wait_for(|applied| applied.version >= 1),
    )
    .await
    .expect("card should arrive")
    .unwrap();
    assert_eq!(arrived.value.as_deck(), Some(&deck(&["car"])));
    assert!(sam.deck().await.unwrap().is_empty());
    assert_eq!(total_cards(&[&sam, &tim]).await, 1);
}
