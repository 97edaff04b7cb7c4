//! Demo runner tests

use cellguard::{Demo, Error};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_counter_race_isolated_is_consistent() {
    let demo = Demo::builder().pairs(50).seed(1).naive(true).build().unwrap();
    let report = demo.counter_race().await.unwrap();

    assert!(report.is_consistent());
    assert_eq!(report.applied, 100);
    assert_eq!(report.pairs, 50);
    // The racy value depends on scheduling; it only has to exist
    assert!(report.naive_final.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_card_trade_safe_and_naive() {
    let demo = Demo::builder()
        .deck(["car", "boat"])
        .card("car")
        .naive(true)
        .build()
        .unwrap();
    let report = demo.card_trade().await.unwrap();

    assert_eq!(report.card, "car");
    assert_eq!(report.safe.successes, 1);
    assert!(report.safe.conserved());
    assert_eq!(report.safe.decks["sam"].len(), 1);

    let naive = report.naive.unwrap();
    assert!(!naive.conserved());
    assert_eq!(naive.cards_after, 3);
}

#[tokio::test]
async fn test_card_trade_of_missing_card() {
    let demo = Demo::builder().deck(["boat"]).card("car").build().unwrap();
    let report = demo.card_trade().await.unwrap();

    assert_eq!(report.safe.successes, 0);
    assert!(report.safe.conserved());
    assert!(report.naive.is_none());
}

#[test]
fn test_invalid_config() {
    assert!(matches!(
        Demo::builder().card("").build(),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_report_serializes() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let report = runtime
        .block_on(Demo::builder().pairs(3).build().unwrap().counter_race())
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["isolated_final"], 0);
    assert!(json["naive_final"].is_null());
}
