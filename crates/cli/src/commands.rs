//! Clap command tree.

use clap::{Arg, ArgAction, Command};

/// Build the top-level command.
pub fn build_cli() -> Command {
    Command::new("cellguard")
        .about("Compare isolated and unguarded shared state under contention")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print reports as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .global(true)
                .value_parser(clap::value_parser!(u64))
                .help("Fix the order in which callers are started"),
        )
        .arg(
            Arg::new("mailbox")
                .long("mailbox")
                .global(true)
                .value_parser(clap::value_parser!(usize))
                .help("Mailbox capacity of every cell"),
        )
        .subcommand(
            Command::new("counter")
                .about("Run increment/decrement pairs against one counter")
                .arg(
                    Arg::new("tasks")
                        .long("tasks")
                        .short('n')
                        .value_parser(clap::value_parser!(usize))
                        .default_value("100")
                        .help("Number of increment/decrement pairs"),
                )
                .arg(naive_arg()),
        )
        .subcommand(
            Command::new("trade")
                .about("Send one card to two collectors at once")
                .arg(
                    Arg::new("card")
                        .long("card")
                        .default_value("car")
                        .help("Card both sends target"),
                )
                .arg(
                    Arg::new("deck")
                        .long("deck")
                        .value_delimiter(',')
                        .default_value("car,boat,plane,house")
                        .help("Starting deck of the sender, comma separated"),
                )
                .arg(naive_arg()),
        )
}

fn naive_arg() -> Arg {
    Arg::new("naive")
        .long("naive")
        .action(ArgAction::SetTrue)
        .help("Also run the unguarded variant")
}
