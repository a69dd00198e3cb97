use crate::ux_out::codec;
use crate::{Bucket, Error, Result, Sha256, UnspentPool, UxOut};
use bincode::Options;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How an unspent output is stored in a bucket, keyed by its hash.
/// The position restores the pool order on load.
#[derive(Serialize, Deserialize)]
struct StoredUxOut {
    position: u64,
    ux_out: UxOut,
}

/// Moves an unspent pool in and out of a bucket.
pub struct UnspentStore;

impl UnspentStore {
    /// Writes every output of the pool to the bucket and removes keys of outputs that are no
    /// longer in the pool.
    pub fn save<B: Bucket>(pool: &UnspentPool, bucket: &mut B) -> Result<()> {
        let live = pool.hashes().into_iter().collect::<HashSet<Sha256>>();
        let mut stale = vec![];
        bucket.for_each(|key, _| {
            let is_live = Sha256::from_slice(key)
                .map(|hash| live.contains(&hash))
                .unwrap_or(false);
            if !is_live {
                stale.push(key.to_vec());
            }
            Ok(())
        })?;
        for key in &stale {
            bucket.delete(key)?;
        }

        for (position, ux_out) in pool.iter().enumerate() {
            let stored = StoredUxOut {
                position: position as u64,
                ux_out: ux_out.clone(),
            };
            let value = codec().serialize(&stored).map_err(Error::Encode)?;
            bucket.put(ux_out.hash().as_slice(), value)?;
        }
        debug!(
            "Saved {} unspents, removed {} stale keys",
            pool.len(),
            stale.len()
        );
        Ok(())
    }

    /// Reads the pool back from the bucket in the order it was saved.
    /// Fails on values that don't decode or are stored under a key other than their hash.
    pub fn load<B: Bucket>(bucket: &B) -> Result<UnspentPool> {
        let mut stored = Vec::with_capacity(bucket.len());
        bucket.for_each(|key, value| {
            let entry: StoredUxOut = codec().deserialize(value).map_err(Error::Decode)?;
            let hash = entry.ux_out.hash();
            if hash.as_slice() != key {
                return Err(Error::Inconsistent(format!(
                    "output {} is stored under key {}",
                    hash,
                    hex::encode(key)
                )));
            }
            stored.push(entry);
            Ok(())
        })?;
        stored.sort_by_key(|entry| entry.position);

        let pool = UnspentPool::from_outputs(stored.into_iter().map(|entry| entry.ux_out))?;
        pool.verify()?;
        info!(
            "Loaded {} unspents, xor hash: {}",
            pool.len(),
            pool.xor_hash()
        );
        Ok(pool)
    }
}
