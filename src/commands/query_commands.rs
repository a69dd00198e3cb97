use crate::commands::PoolCliOptions;
use crate::{Address, UxOut};
use clap::{Arg, ArgMatches, Command};
use std::error::Error;

pub fn balances_command() -> Command<'static> {
    Command::new("balances")
        .about("Prints coins and coin-hours held by each of the given addresses.")
        .arg(
            Arg::new("addresses")
                .value_name("ADDRESS")
                .multiple_values(true)
                .takes_value(true)
                .required(true)
                .index(1),
        )
}

pub fn fingerprint_command() -> Command<'static> {
    Command::new("fingerprint").about("Prints the xor hash of all unspent outputs.")
}

pub fn list_command() -> Command<'static> {
    Command::new("list").about("Prints all unspent outputs in pool order.")
}

pub fn run_balances_command(
    pool_options: &PoolCliOptions,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let addresses = matches
        .values_of("addresses")
        .map(|v| v.collect())
        .unwrap_or_else(|| vec![])
        .into_iter()
        .map(str::parse)
        .collect::<Result<Vec<Address>, _>>()?;
    let (_, pool) = pool_options.open_pool()?;

    let outputs = pool.all_for_addresses(&addresses);
    let mut requested = outputs.keys().collect::<Vec<&Address>>();
    requested.sort();
    for address in requested {
        let owned = &outputs[address];
        let (coins, coin_hours) = balance(owned, pool_options.now());
        println!(
            "{}: coins: {} coin-hours: {} outputs: {}",
            address,
            coins,
            coin_hours,
            owned.len()
        );
    }
    Ok(())
}

/// Total coins and coin-hours at `now` of the outputs, saturating.
fn balance(outputs: &[UxOut], now: u64) -> (u64, u64) {
    outputs.iter().fold((0u64, 0u64), |(coins, hours), ux_out| {
        (
            coins.saturating_add(ux_out.coins()),
            hours.saturating_add(ux_out.coin_hours(now)),
        )
    })
}

pub fn run_fingerprint_command(pool_options: &PoolCliOptions) -> Result<(), Box<dyn Error>> {
    let (_, pool) = pool_options.open_pool()?;
    println!("{} ({} unspent outputs)", pool.xor_hash(), pool.len());
    Ok(())
}

pub fn run_list_command(pool_options: &PoolCliOptions) -> Result<(), Box<dyn Error>> {
    let (_, pool) = pool_options.open_pool()?;
    for ux_out in pool.iter() {
        println!(
            "{} coin-hours: {}",
            ux_out,
            ux_out.coin_hours(pool_options.now())
        );
    }
    Ok(())
}
