//! Isolation Boundary Comprehensive Test Suite
//!
//! End-to-end checks through the public `cellguard` API:
//!
//! 1. Concurrent increments and decrements on an isolated counter cancel out
//! 2. Concurrent card sends never duplicate or lose a card
//! 3. Cancelled operations have no effect
//! 4. Unguarded baselines show the anomalies the boundaries prevent
//! 5. Observers see every committed end state
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test boundary_comprehensive
//!
//! # Trade tests only
//! cargo test --test boundary_comprehensive trade::
//! ```

use cellguard::{Collector, Counter, Deck};

// Test modules
pub mod cancellation;
pub mod counter;
pub mod demo;
pub mod naive;
pub mod observe;
pub mod trade;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Build a deck from card names
pub fn deck(cards: &[&str]) -> Deck {
    cards.iter().copied().collect()
}

/// Spawn the three collectors of the trade scenario
pub fn trade_collectors(cards: &[&str]) -> (Collector, Collector, Collector) {
    (
        Collector::spawn("sam", cards.iter().copied()),
        Collector::spawn("tim", Vec::<&str>::new()),
        Collector::spawn("adam", Vec::<&str>::new()),
    )
}

/// Total cards held across collectors
pub async fn total_cards(collectors: &[&Collector]) -> usize {
    let mut total = 0;
    for c in collectors {
        total += c.deck().await.unwrap().len();
    }
    total
}

/// Spawn a counter starting at zero
pub fn zero_counter() -> Counter {
    Counter::spawn("counter", 0)
}
