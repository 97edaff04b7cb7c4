//! ArgMatches → scenario conversion.

use cellguard::{Demo, DemoConfig};
use clap::ArgMatches;

/// Scenario selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Counter,
    Trade,
}

/// Everything needed to run one invocation.
#[derive(Debug)]
pub struct CliAction {
    pub scenario: Scenario,
    pub demo: Demo,
}

/// Translate parsed arguments into a validated demo.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let mut config = DemoConfig::default();
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }
    if let Some(capacity) = matches.get_one::<usize>("mailbox") {
        config.boundary = config.boundary.mailbox_capacity(*capacity);
    }

    let scenario = match matches.subcommand() {
        Some(("counter", sub)) => {
            if let Some(tasks) = sub.get_one::<usize>("tasks") {
                config.pairs = *tasks;
            }
            config.naive = sub.get_flag("naive");
            Scenario::Counter
        }
        Some(("trade", sub)) => {
            if let Some(card) = sub.get_one::<String>("card") {
                config.card = card.clone();
            }
            if let Some(deck) = sub.get_many::<String>("deck") {
                config.deck = deck.cloned().collect();
            }
            config.naive = sub.get_flag("naive");
            Scenario::Trade
        }
        Some((other, _)) => return Err(format!("unknown command '{}'", other)),
        None => return Err("no command given".to_string()),
    };

    let demo = Demo::new(config).map_err(|e| e.to_string())?;
    Ok(CliAction { scenario, demo })
}
