//! Primitive wrappers for the unified API.
//!
//! Each primitive owns one state cell behind an actor boundary:
//!
//! - [`Counter`]: increments and decrements
//! - [`Collector`]: a deck of cards that can be traded

mod collector;
mod counter;

pub use collector::Collector;
pub use counter::Counter;
