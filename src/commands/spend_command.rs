use crate::commands::PoolCliOptions;
use crate::Sha256;
use clap::{Arg, ArgMatches, Command};
use log::warn;
use std::error::Error;

struct SpendCliOptions {
    hashes: Vec<Sha256>,
    block_seq: u64,
}

impl SpendCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let hashes = matches
            .values_of("hashes")
            .map(|v| v.collect())
            .unwrap_or_else(|| vec![])
            .into_iter()
            .map(Sha256::from_hex)
            .collect::<Result<Vec<Sha256>, _>>()?;
        Ok(Self {
            hashes,
            block_seq: matches.value_of_t::<u64>("block_seq")?,
        })
    }
}

pub fn spend_command() -> Command<'static> {
    Command::new("spend")
        .about("Removes the given outputs from the pool.")
        .arg(
            Arg::new("hashes")
                .value_name("HASH")
                .help("Hex-encoded hashes of the outputs to spend.")
                .multiple_values(true)
                .takes_value(true)
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("block_seq")
                .long("block-seq")
                .value_name("SEQ")
                .help("Sequence of the block that spends the outputs.")
                .takes_value(true)
                .required(false)
                .default_value("0"),
        )
}

pub fn run_spend_command(
    pool_options: &PoolCliOptions,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let options = SpendCliOptions::parse(matches)?;
    let (mut bucket, mut pool) = pool_options.open_pool()?;

    let spent = pool.delete_multiple(&options.hashes);
    for hash in &options.hashes {
        if !spent.iter().any(|ux_out| ux_out.hash() == *hash) {
            warn!("Unspent output not found: {}", hash);
        }
    }

    pool_options.save_pool(&mut bucket, &pool)?;
    for ux_out in spent {
        let ux_out = ux_out.spent_in(options.block_seq);
        println!("{} spent in block {}", ux_out, ux_out.head().spend_seq());
    }
    Ok(())
}
