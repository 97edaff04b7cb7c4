//! Card collector primitive.
//!
//! A collector owns a deck of cards behind an isolation boundary. Cards move
//! between collectors with [`Collector::send`]; a card is never duplicated
//! or lost, however many trades run at once.
//!
//! # Example
//!
//! ```ignore
//! use cellguard::prelude::*;
//!
//! let sam = Collector::spawn("sam", ["car", "boat"]);
//! let tim = Collector::spawn("tim", Vec::<&str>::new());
//!
//! assert!(sam.try_send("car", &tim).await);
//! assert!(!sam.try_send("car", &tim).await); // already gone
//! ```

use crate::error::Result;
use cellguard_concurrency::{CancelToken, CellHandle, CellWatch};
use cellguard_core::{BoundaryConfig, Deck, Operation, StateCell, Token};
use tracing::debug;

/// Deck of cards behind an isolation boundary.
///
/// Cloning shares the same collector.
#[derive(Debug, Clone)]
pub struct Collector {
    handle: CellHandle,
}

impl Collector {
    /// Spawn a collector holding `cards` on the current tokio runtime.
    pub fn spawn<I, T>(name: impl Into<String>, cards: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        Self::spawn_with(name, cards, BoundaryConfig::default())
    }

    /// Spawn with explicit boundary settings.
    pub fn spawn_with<I, T>(name: impl Into<String>, cards: I, config: BoundaryConfig) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        let deck: Deck = cards.into_iter().collect();
        Self {
            handle: CellHandle::spawn_with(StateCell::deck(name, deck), config),
        }
    }

    /// Send `card` to `to`.
    ///
    /// Returns this collector's deck after the card left. Fails without
    /// effect if the card is not here.
    pub async fn send(&self, card: impl Into<Token>, to: &Collector) -> Result<Deck> {
        let applied = self.handle.transfer(card, &to.handle).await?;
        Ok(applied.value.as_deck().cloned().unwrap_or_default())
    }

    /// Send `card` to `to` unless `cancel` fires before it leaves.
    pub async fn send_cancellable(
        &self,
        card: impl Into<Token>,
        to: &Collector,
        cancel: &CancelToken,
    ) -> Result<Deck> {
        let applied = self
            .handle
            .transfer_cancellable(card, &to.handle, cancel)
            .await?;
        Ok(applied.value.as_deck().cloned().unwrap_or_default())
    }

    /// Send `card` to `to`, reporting success as a flag.
    pub async fn try_send(&self, card: impl Into<Token>, to: &Collector) -> bool {
        let card = card.into();
        match self.send(card.clone(), to).await {
            Ok(_) => true,
            Err(e) => {
                debug!(from = %self.name(), to = %to.name(), card = %card, error = %e, "Send failed");
                false
            }
        }
    }

    /// Add a card to this collector.
    pub async fn receive(&self, card: impl Into<Token>) -> Result<Deck> {
        let applied = self.handle.apply(Operation::Insert(card.into())).await?;
        Ok(applied.value.as_deck().cloned().unwrap_or_default())
    }

    /// Current deck, read through the boundary.
    pub async fn deck(&self) -> Result<Deck> {
        let applied = self.handle.read().await?;
        Ok(applied.value.as_deck().cloned().unwrap_or_default())
    }

    /// Collector name. Does not enter the boundary.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Observe committed decks.
    pub fn watch(&self) -> CellWatch {
        self.handle.subscribe()
    }

    /// The underlying boundary handle.
    pub fn handle(&self) -> &CellHandle {
        &self.handle
    }
}
