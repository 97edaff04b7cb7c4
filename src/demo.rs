//! Demo scenarios.
//!
//! This module provides the `Demo` struct, which runs the two comparisons the
//! crate exists to show: an isolated counter against a racy one, and a safe
//! card trade against a risky one. Everything a scenario needs comes from its
//! [`DemoConfig`]; no state outlives a call.

use crate::error::{Error, Result};
use crate::primitives::{Collector, Counter};
use cellguard_concurrency::{CallerGroup, RaceWindow, RacyCounter, RiskyCollector, Step};
use cellguard_core::{BoundaryConfig, Deck, Operation, Token};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;
use tracing::{info, warn};

/// Largest accepted `pairs` value
pub const MAX_PAIRS: usize = 100_000;

/// OS threads used by the racy counter run
const RACY_THREADS: usize = 16;

/// Scenario settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Increment/decrement pairs issued by the counter scenario
    pub pairs: usize,
    /// Starting deck of the sending collector
    pub deck: Vec<String>,
    /// Card both trades try to send
    pub card: String,
    /// Also run the unguarded baselines
    pub naive: bool,
    /// Seed for caller ordering; random when unset
    pub seed: Option<u64>,
    /// Boundary settings for every cell
    pub boundary: BoundaryConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            pairs: 100,
            deck: ["car", "boat", "plane", "house"]
                .into_iter()
                .map(String::from)
                .collect(),
            card: "car".to_string(),
            naive: false,
            seed: None,
            boundary: BoundaryConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.pairs > MAX_PAIRS {
            return Err(Error::InvalidConfig(format!(
                "pairs: {} exceeds the maximum of {}",
                self.pairs, MAX_PAIRS
            )));
        }
        Token::parse(self.card.as_str())
            .map_err(|e| Error::InvalidConfig(format!("card: {}", e)))?;
        for card in &self.deck {
            Token::parse(card.as_str())
                .map_err(|e| Error::InvalidConfig(format!("deck: {}", e)))?;
        }
        Ok(())
    }
}

/// Scenario runner.
///
/// # Example
///
/// ```ignore
/// let demo = Demo::builder().pairs(10).naive(true).build()?;
/// let report = demo.counter_race().await?;
/// assert_eq!(report.isolated_final, 0);
/// ```
#[derive(Debug, Clone)]
pub struct Demo {
    config: DemoConfig,
}

impl Demo {
    /// Create a demo from a validated config.
    pub fn new(config: DemoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a builder for demo configuration.
    pub fn builder() -> DemoBuilder {
        DemoBuilder::new()
    }

    /// The active configuration.
    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    /// Run `pairs` increments and `pairs` decrements as separate concurrent
    /// callers against one isolated counter starting at 0.
    ///
    /// With `naive` set, the same workload also runs on OS threads against a
    /// [`RacyCounter`], whose result depends on scheduling.
    pub async fn counter_race(&self) -> Result<CounterReport> {
        let pairs = self.config.pairs;
        let counter = Counter::spawn_with("counter", 0, self.config.boundary.clone());

        let mut ops: Vec<Operation> = (0..pairs)
            .flat_map(|_| [Operation::Increment, Operation::Decrement])
            .collect();
        self.shuffle(&mut ops);

        let mut group = CallerGroup::new();
        for op in ops {
            group.spawn(counter.handle().clone(), vec![Step::Apply(op)]);
        }
        let reports = group.join_all().await;
        let applied = reports.iter().map(|r| r.applied).sum();
        let isolated_final = counter.value().await?;
        counter.handle().shutdown();
        info!(pairs, isolated_final, "Isolated counter finished");

        let naive_final = if self.config.naive {
            let value = tokio::task::spawn_blocking(move || racy_counter_run(pairs))
                .await
                .map_err(|e| Error::Internal(format!("naive counter: {}", e)))?;
            if value != 0 {
                warn!(value, "Racy counter lost updates");
            }
            Some(value)
        } else {
            None
        };

        Ok(CounterReport {
            start: 0,
            pairs,
            applied,
            isolated_final,
            naive_final,
        })
    }

    /// Have one collector send the same card to two others at once.
    ///
    /// The safe trade uses isolated collectors: exactly one send succeeds.
    /// With `naive` set, the trade is repeated with risky collectors whose
    /// check and removal are forced apart, so both sends pass the check and
    /// the card is duplicated.
    pub async fn card_trade(&self) -> Result<TradeReport> {
        let card = Token::parse(self.config.card.as_str())
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let deck: Deck = self.config.deck.iter().map(String::as_str).collect();
        let boundary = self.config.boundary.clone();

        let sam = Collector::spawn_with("sam", deck.iter().cloned(), boundary.clone());
        let tim = Collector::spawn_with("tim", Vec::<Token>::new(), boundary.clone());
        let adam = Collector::spawn_with("adam", Vec::<Token>::new(), boundary);

        let mut targets = vec![tim.clone(), adam.clone()];
        self.shuffle(&mut targets);
        let mut group = CallerGroup::new();
        for to in targets {
            group.spawn(
                sam.handle().clone(),
                vec![Step::Transfer {
                    token: card.clone(),
                    to: to.handle().clone(),
                }],
            );
        }
        let successes = group.join_all().await.iter().map(|r| r.applied).sum();

        let mut decks = BTreeMap::new();
        for collector in [&sam, &tim, &adam] {
            decks.insert(collector.name().to_string(), collector.deck().await?);
            collector.handle().shutdown();
        }
        let safe = TradeOutcome::new(deck.len(), successes, decks);
        info!(card = %card, successes, conserved = safe.conserved(), "Safe trade finished");

        let naive = if self.config.naive {
            let card = card.clone();
            let outcome = tokio::task::spawn_blocking(move || risky_trade_run(deck, card))
                .await
                .map_err(|e| Error::Internal(format!("naive trade: {}", e)))?;
            if !outcome.conserved() {
                warn!(
                    before = outcome.cards_before,
                    after = outcome.cards_after,
                    "Risky trade duplicated a card"
                );
            }
            Some(outcome)
        } else {
            None
        };

        Ok(TradeReport {
            card: card.to_string(),
            safe,
            naive,
        })
    }

    fn shuffle<T>(&self, items: &mut [T]) {
        match self.config.seed {
            Some(seed) => items.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => items.shuffle(&mut rand::thread_rng()),
        }
    }
}

/// Spread `pairs` increment/decrement pairs over a fixed set of threads
/// sharing one racy counter.
fn racy_counter_run(pairs: usize) -> i64 {
    let counter = Arc::new(RacyCounter::with_window("racy", 0, RaceWindow::Yield));
    let threads = pairs.clamp(1, RACY_THREADS);
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let share = pairs / threads + usize::from(i < pairs % threads);
            let counter = Arc::clone(&counter);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..share {
                    counter.increment();
                    counter.decrement();
                }
            })
        })
        .collect();
    for h in handles {
        if let Err(panic) = h.join() {
            std::panic::resume_unwind(panic);
        }
    }
    counter.get()
}

/// Two threads send the same card from one risky collector, gated so both
/// pass the ownership check before either removes it.
fn risky_trade_run(deck: Deck, card: Token) -> TradeOutcome {
    let cards_before = deck.len();
    let sam = Arc::new(RiskyCollector::with_window("sam", deck, RaceWindow::gate(2)));
    let tim = Arc::new(RiskyCollector::new("tim", Deck::new()));
    let adam = Arc::new(RiskyCollector::new("adam", Deck::new()));

    let handles: Vec<_> = [Arc::clone(&tim), Arc::clone(&adam)]
        .into_iter()
        .map(|to| {
            let sam = Arc::clone(&sam);
            let card = card.clone();
            thread::spawn(move || sam.send(card, &to))
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| match h.join() {
            Ok(removed) => removed as usize,
            Err(panic) => std::panic::resume_unwind(panic),
        })
        .sum();

    let decks = [&sam, &tim, &adam]
        .into_iter()
        .map(|c| (c.name().to_string(), c.deck()))
        .collect();
    TradeOutcome::new(cards_before, successes, decks)
}

/// Result of [`Demo::counter_race`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterReport {
    /// Starting value of both counters
    pub start: i64,
    /// Increment/decrement pairs issued
    pub pairs: usize,
    /// Operations the isolated counter applied
    pub applied: usize,
    /// Final value of the isolated counter
    pub isolated_final: i64,
    /// Final value of the racy counter, if it ran
    pub naive_final: Option<i64>,
}

impl CounterReport {
    /// Whether the isolated counter ended where it started.
    pub fn is_consistent(&self) -> bool {
        self.isolated_final == self.start
    }
}

/// Decks after one trade scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeOutcome {
    /// Sends reported as successful
    pub successes: usize,
    /// Cards across all collectors before the trade
    pub cards_before: usize,
    /// Cards across all collectors after the trade
    pub cards_after: usize,
    /// Deck of each collector, by name
    pub decks: BTreeMap<String, Deck>,
}

impl TradeOutcome {
    fn new(cards_before: usize, successes: usize, decks: BTreeMap<String, Deck>) -> Self {
        let cards_after = decks.values().map(Deck::len).sum();
        Self {
            successes,
            cards_before,
            cards_after,
            decks,
        }
    }

    /// Whether no card was duplicated or lost.
    pub fn conserved(&self) -> bool {
        self.cards_before == self.cards_after
    }
}

/// Result of [`Demo::card_trade`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReport {
    /// Card both sends targeted
    pub card: String,
    /// Trade between isolated collectors
    pub safe: TradeOutcome,
    /// Trade between risky collectors, if it ran
    pub naive: Option<TradeOutcome>,
}

/// Builder for demo configuration.
///
/// # Example
///
/// ```ignore
/// let demo = Demo::builder()
///     .pairs(10)
///     .deck(["car", "boat"])
///     .card("car")
///     .seed(7)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DemoBuilder {
    config: DemoConfig,
}

impl DemoBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of increment/decrement pairs.
    pub fn pairs(mut self, pairs: usize) -> Self {
        self.config.pairs = pairs;
        self
    }

    /// Set the sending collector's starting deck.
    pub fn deck<I, S>(mut self, cards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.deck = cards.into_iter().map(Into::into).collect();
        self
    }

    /// Set the card both trades send.
    pub fn card(mut self, card: impl Into<String>) -> Self {
        self.config.card = card.into();
        self
    }

    /// Also run the unguarded baselines.
    pub fn naive(mut self, naive: bool) -> Self {
        self.config.naive = naive;
        self
    }

    /// Fix the caller ordering.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the mailbox capacity of every cell.
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.boundary = self.config.boundary.mailbox_capacity(capacity);
        self
    }

    /// Enable or disable per-operation debug events.
    pub fn trace_operations(mut self, enabled: bool) -> Self {
        self.config.boundary = self.config.boundary.trace_operations(enabled);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Demo> {
        Demo::new(self.config)
    }
}
