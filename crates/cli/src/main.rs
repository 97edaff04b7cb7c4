//! cellguard CLI: run the isolation demos from a shell.
//!
//! - `cellguard counter [--tasks N] [--naive]`: increment/decrement pairs
//! - `cellguard trade [--card C] [--deck a,b] [--naive]`: concurrent card sends
//!
//! Global flags: `--json` for machine-readable reports, `-v`/`-vv` for logs,
//! `--seed` to fix caller ordering, `--mailbox` to size cell mailboxes.
//! `RUST_LOG` overrides the `-v` level.

mod commands;
mod format;
mod parse;

use std::process;

use cellguard::{Demo, Error};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_counter, format_error, format_trade, OutputMode};
use parse::{matches_to_action, Scenario};

fn main() {
    let matches = build_cli().get_matches();

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    init_tracing(matches.get_count("verbose"));

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format_error(&Error::from(e), output_mode));
            process::exit(1);
        }
    };

    let exit_code = runtime.block_on(run(action.scenario, &action.demo, output_mode));
    process::exit(exit_code);
}

async fn run(scenario: Scenario, demo: &Demo, mode: OutputMode) -> i32 {
    debug!(?scenario, config = ?demo.config(), "Running scenario");
    let rendered = match scenario {
        Scenario::Counter => demo.counter_race().await.map(|r| format_counter(&r, mode)),
        Scenario::Trade => demo.card_trade().await.map(|r| format_trade(&r, mode)),
    };
    match rendered {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            if e.is_serious() {
                error!(error = %e, "Scenario aborted");
            }
            eprintln!("{}", format_error(&e, mode));
            1
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
