//! Report rendering.

use cellguard::{CounterReport, Error, TradeOutcome, TradeReport};
use serde::Serialize;
use std::fmt::Write;

/// How reports are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub fn format_counter(report: &CounterReport, mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return to_json(report);
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "isolated counter: {} -> {} after {} operations ({})",
        report.start,
        report.isolated_final,
        report.applied,
        if report.is_consistent() { "consistent" } else { "INCONSISTENT" }
    );
    match report.naive_final {
        Some(value) if value == report.start => {
            let _ = write!(out, "racy counter:     {} -> {} (no updates lost this run)", report.start, value);
        }
        Some(value) => {
            let _ = write!(
                out,
                "racy counter:     {} -> {} ({} lost updates)",
                report.start,
                value,
                (value - report.start).abs()
            );
        }
        None => out.truncate(out.trim_end().len()),
    }
    out
}

pub fn format_trade(report: &TradeReport, mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return to_json(report);
    }
    let mut out = format_outcome("isolated", &report.card, &report.safe);
    if let Some(naive) = &report.naive {
        out.push('\n');
        out.push_str(&format_outcome("risky", &report.card, naive));
    }
    out
}

fn format_outcome(label: &str, card: &str, outcome: &TradeOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} trade of {:?}: {} of 2 sends succeeded, {} cards before, {} after{}",
        label,
        card,
        outcome.successes,
        outcome.cards_before,
        outcome.cards_after,
        if outcome.conserved() { "" } else { " (DUPLICATED)" }
    );
    for (name, deck) in &outcome.decks {
        let _ = writeln!(out, "  {:<5} {}", name, deck);
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::json!({ "error": err.to_string() }).to_string(),
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(text) => text,
        Err(e) => format_error(&Error::from(e), OutputMode::Json),
    }
}
