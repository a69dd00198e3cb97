use crate::commands::PoolCliOptions;
use crate::{Address, Sha256, UxBody, UxHead, UxOut};
use clap::{Arg, ArgMatches, Command};
use std::error::Error;

struct AddCliOptions {
    src_transaction: Sha256,
    address: Address,
    coins: u64,
    hours: u64,
    time: Option<u64>,
    block_seq: u64,
}

impl AddCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let time = if matches.is_present("time") {
            Some(matches.value_of_t::<u64>("time")?)
        } else {
            None
        };
        Ok(Self {
            src_transaction: Sha256::from_hex(matches.value_of("src_transaction").unwrap_or(""))?,
            address: matches.value_of("address").unwrap_or("").parse()?,
            coins: matches.value_of_t::<u64>("coins")?,
            hours: matches.value_of_t::<u64>("hours")?,
            time,
            block_seq: matches.value_of_t::<u64>("block_seq")?,
        })
    }
}

pub fn add_command() -> Command<'static> {
    Command::new("add")
        .about("Adds an unspent output to the pool and prints its hash.")
        .arg(
            Arg::new("src_transaction")
                .long("src-transaction")
                .value_name("HASH")
                .help("Hex-encoded hash of the transaction that created the output.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("address")
                .long("address")
                .value_name("ADDRESS")
                .help("Address of the receiver.")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("coins")
                .long("coins")
                .value_name("COINS")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("hours")
                .long("hours")
                .value_name("HOURS")
                .help("Coin-hours carried by the output when it is created.")
                .takes_value(true)
                .required(false)
                .default_value("0"),
        )
        .arg(
            Arg::new("time")
                .long("time")
                .value_name("UNIX_SECONDS")
                .help("Creation time of the output. Defaults to --now.")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::new("block_seq")
                .long("block-seq")
                .value_name("SEQ")
                .help("Sequence of the block that created the output.")
                .takes_value(true)
                .required(false)
                .default_value("0"),
        )
}

pub fn run_add_command(
    pool_options: &PoolCliOptions,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let options = AddCliOptions::parse(matches)?;
    let (mut bucket, mut pool) = pool_options.open_pool()?;

    let head = UxHead::new(
        options.time.unwrap_or_else(|| pool_options.now()),
        options.block_seq,
    );
    let body = UxBody::new(
        options.src_transaction,
        options.address,
        options.coins,
        options.hours,
    );
    let hash = pool.add(UxOut::new(head, body))?;

    pool_options.save_pool(&mut bucket, &pool)?;
    println!("{}", hash);
    Ok(())
}
