//! Unguarded variants, kept for comparison
//!
//! These types perform the same operations as the boundaries in this crate
//! but without serializing them. They are memory safe (atomics and short
//! lock scopes) yet logically racy: each operation is a check followed by an
//! act, and other callers can run in between.
//!
//! - [`RacyCounter`]: load, then store. Concurrent updates get lost.
//! - [`RiskyCollector`]: check the deck, then remove, then hand the card over
//!   regardless of whether the removal happened. Cards get duplicated.
//!
//! A [`RaceWindow`] widens the gap between check and act. With
//! [`RaceWindow::Gate`] the race is reproducible: every participant is parked
//! after its check until all of them have checked.

use cellguard_core::{Deck, Token};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;
use tracing::{debug, warn};

/// What a naive operation does between its check and its act
#[derive(Clone, Default)]
pub enum RaceWindow {
    /// Nothing; the race depends on scheduling luck
    #[default]
    None,
    /// Yield the thread
    Yield,
    /// Sleep for a fixed time
    Sleep(Duration),
    /// Wait until every party has reached the window
    Gate(Arc<Barrier>),
}

impl RaceWindow {
    /// Gate shared by `parties` concurrent operations
    pub fn gate(parties: usize) -> Self {
        RaceWindow::Gate(Arc::new(Barrier::new(parties)))
    }

    fn open(&self) {
        match self {
            RaceWindow::None => {}
            RaceWindow::Yield => std::thread::yield_now(),
            RaceWindow::Sleep(d) => std::thread::sleep(*d),
            RaceWindow::Gate(barrier) => {
                barrier.wait();
            }
        }
    }
}

impl fmt::Debug for RaceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceWindow::None => f.write_str("None"),
            RaceWindow::Yield => f.write_str("Yield"),
            RaceWindow::Sleep(d) => f.debug_tuple("Sleep").field(d).finish(),
            RaceWindow::Gate(_) => f.write_str("Gate"),
        }
    }
}

/// Counter whose read-modify-write is not atomic
#[derive(Debug)]
pub struct RacyCounter {
    name: String,
    value: AtomicI64,
    window: RaceWindow,
}

impl RacyCounter {
    /// Create a counter starting at `start`
    pub fn new(name: impl Into<String>, start: i64) -> Self {
        Self::with_window(name, start, RaceWindow::None)
    }

    /// Create a counter that opens `window` between its load and its store
    pub fn with_window(name: impl Into<String>, start: i64, window: RaceWindow) -> Self {
        Self {
            name: name.into(),
            value: AtomicI64::new(start),
            window,
        }
    }

    /// Name of the counter
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add one; may overwrite a concurrent update
    pub fn increment(&self) {
        self.update(1);
    }

    /// Subtract one; may overwrite a concurrent update
    pub fn decrement(&self) {
        self.update(-1);
    }

    /// Current value
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    fn update(&self, delta: i64) {
        let seen = self.value.load(Ordering::SeqCst);
        self.window.open();
        self.value.store(seen.wrapping_add(delta), Ordering::SeqCst);
    }
}

/// Card collector that trades without isolation
#[derive(Debug)]
pub struct RiskyCollector {
    name: String,
    deck: Mutex<Deck>,
    window: RaceWindow,
}

impl RiskyCollector {
    /// Create a collector holding `deck`
    pub fn new(name: impl Into<String>, deck: Deck) -> Self {
        Self::with_window(name, deck, RaceWindow::None)
    }

    /// Create a collector that opens `window` between its check and its removal
    pub fn with_window(name: impl Into<String>, deck: Deck, window: RaceWindow) -> Self {
        Self {
            name: name.into(),
            deck: Mutex::new(deck),
            window,
        }
    }

    /// Name of the collector
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send `card` to `to`
    ///
    /// Returns whether this collector actually removed the card. The card is
    /// handed over whenever the initial check passed, even if the removal
    /// found it already gone.
    pub fn send(&self, card: impl Into<Token>, to: &RiskyCollector) -> bool {
        let card = card.into();
        if !self.deck.lock().contains(&card) {
            debug!(collector = %self.name, card = %card, "Card not in deck");
            return false;
        }

        self.window.open();

        let removed = self.deck.lock().remove(&card);
        if removed {
            debug!(from = %self.name, to = %to.name, card = %card, "Card removed");
        } else {
            warn!(from = %self.name, to = %to.name, card = %card, "Card vanished after check");
        }
        to.receive(card);
        removed
    }

    /// Add `card` to this collector's deck
    pub fn receive(&self, card: Token) {
        self.deck.lock().insert(card);
    }

    /// Copy of the current deck
    pub fn deck(&self) -> Deck {
        self.deck.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_racy_counter_sequential_is_correct() {
        let counter = RacyCounter::new("c", 0);
        for _ in 0..10 {
            counter.increment();
        }
        counter.decrement();
        assert_eq!(counter.get(), 9);
    }

    #[test]
    fn test_racy_counter_gate_loses_update() {
        let counter = Arc::new(RacyCounter::with_window("c", 0, RaceWindow::gate(2)));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || counter.increment())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // Both loaded 0 before either stored.
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_risky_collector_sequential_is_correct() {
        let sam = RiskyCollector::new("sam", ["car", "boat"].into_iter().collect());
        let tim = RiskyCollector::new("tim", Deck::new());
        let adam = RiskyCollector::new("adam", Deck::new());

        assert!(sam.send("car", &tim));
        assert!(!sam.send("car", &adam));
        assert_eq!(sam.deck().len(), 1);
        assert_eq!(tim.deck().len(), 1);
        assert!(adam.deck().is_empty());
    }

    #[test]
    fn test_risky_collector_gate_duplicates_card() {
        let sam = Arc::new(RiskyCollector::with_window(
            "sam",
            ["car", "boat"].into_iter().collect(),
            RaceWindow::gate(2),
        ));
        let tim = Arc::new(RiskyCollector::new("tim", Deck::new()));
        let adam = Arc::new(RiskyCollector::new("adam", Deck::new()));

        let handles: Vec<_> = [Arc::clone(&tim), Arc::clone(&adam)]
            .into_iter()
            .map(|target| {
                let sam = Arc::clone(&sam);
                thread::spawn(move || sam.send("car", &target))
            })
            .collect();
        let removed: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(removed.iter().filter(|r| **r).count(), 1);
        assert_eq!(sam.deck(), ["boat"].into_iter().collect::<Deck>());
        assert!(tim.deck().contains(&Token::from("car")));
        assert!(adam.deck().contains(&Token::from("car")));
        // Two cards at the start, three now.
        assert_eq!(sam.deck().len() + tim.deck().len() + adam.deck().len(), 3);
    }
}
