use clap::Command;
use skyledger_lib::commands::{self, PoolCliOptions};
use skyledger_lib::logger;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("skyledger")
        .about("Unspent output pool tools.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args(commands::pool_args())
        .subcommand(commands::add_command())
        .subcommand(commands::spend_command())
        .subcommand(commands::balances_command())
        .subcommand(commands::fingerprint_command())
        .subcommand(commands::list_command())
        .get_matches();

    let options = PoolCliOptions::parse(&matches)?;
    logger::init(options.log_level())?;

    match matches.subcommand() {
        Some(("add", matches)) => commands::run_add_command(&options, matches),
        Some(("spend", matches)) => commands::run_spend_command(&options, matches),
        Some(("balances", matches)) => commands::run_balances_command(&options, matches),
        Some(("fingerprint", _)) => commands::run_fingerprint_command(&options),
        Some(("list", _)) => commands::run_list_command(&options),
        _ => panic!("Should report help."),
    }
}
