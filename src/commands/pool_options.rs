use crate::{FileBucket, UnspentPool, UnspentStore};
use chrono::Utc;
use clap::{Arg, ArgMatches};
use log::{info, Level};
use std::convert::TryFrom;
use std::error::Error;
use std::path::PathBuf;

/// Options shared by all pool commands.
pub struct PoolCliOptions {
    store: PathBuf,
    log_level: Level,
    now: u64,
}

impl PoolCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let now = if matches.is_present("now") {
            matches.value_of_t::<u64>("now")?
        } else {
            // Clocks before the epoch count as the epoch.
            u64::try_from(Utc::now().timestamp()).unwrap_or(0)
        };
        Ok(Self {
            store: PathBuf::from(matches.value_of("store").unwrap_or("unspent.db")),
            log_level: matches.value_of_t::<Level>("log_level")?,
            now,
        })
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }

    /// The time at which coin-hours are computed (seconds from Unix Epoch).
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Opens the bucket and loads the pool stored in it.
    pub fn open_pool(&self) -> Result<(FileBucket, UnspentPool), Box<dyn Error>> {
        let bucket = FileBucket::open(&self.store)?;
        let pool = UnspentStore::load(&bucket)?;
        Ok((bucket, pool))
    }

    /// Writes the pool back to the bucket and persists it.
    pub fn save_pool(
        &self,
        bucket: &mut FileBucket,
        pool: &UnspentPool,
    ) -> Result<(), Box<dyn Error>> {
        UnspentStore::save(pool, bucket)?;
        bucket.flush()?;
        info!(
            "Saved {} unspents to {}, xor hash: {}",
            pool.len(),
            bucket.path().display(),
            pool.xor_hash()
        );
        Ok(())
    }
}

pub fn pool_args() -> Vec<Arg<'static>> {
    vec![
        Arg::new("store")
            .long("store")
            .value_name("PATH")
            .help("File in which the unspent pool is stored.")
            .takes_value(true)
            .required(false)
            .default_value("unspent.db"),
        Arg::new("log_level")
            .long("log-level")
            .value_name("LEVEL")
            .help("One of: error, warn, info, debug, trace.")
            .takes_value(true)
            .required(false)
            .default_value("info"),
        Arg::new("now")
            .long("now")
            .value_name("UNIX_SECONDS")
            .help("Time at which coin-hours are computed. Defaults to the current time.")
            .takes_value(true)
            .required(false),
    ]
}
