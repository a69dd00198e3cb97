use crate::{Address, Error, Result, Sha256, UxOut};
use log::{debug, trace};
use std::collections::HashMap;

/// Represents an output stored in the pool, which is an implementation detail of the pool, so
/// it's not part of the API.
#[derive(Debug, Clone, Eq, PartialEq)]
struct Entry {
    // Equivalent to `ux_out.hash()`, kept to avoid rehashing when positions shift.
    hash: Sha256,
    ux_out: UxOut,
}

/// The set of all unspent transaction outputs.
///
/// Outputs are kept in the order they were added and indexed by their hash.
/// The pool also maintains the XOR of all hashes it contains, which two nodes can compare to
/// check whether they agree on the unspent outputs.
///
/// Every mutation keeps the following in sync:
///   - `index[h] == i` if and only if the output at position `i` has hash `h`.
///   - `xor_hash` is the XOR of all keys in `index`.
///   - No two outputs share a hash.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UnspentPool {
    entries: Vec<Entry>,
    // Position of each output in `entries`, indexed by its hash.
    index: HashMap<Sha256, usize>,
    xor_hash: Sha256,
}

impl UnspentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool from the outputs in the given order.
    /// Fails if two outputs have the same hash.
    pub fn from_outputs<I>(outputs: I) -> Result<Self>
    where
        I: IntoIterator<Item = UxOut>,
    {
        let mut pool = Self::new();
        for ux_out in outputs {
            pool.add(ux_out)?;
        }
        Ok(pool)
    }

    /// Adds the output to the end of the pool and returns its hash.
    ///
    /// The pool is left untouched if an output with the same hash already exists.
    pub fn add(&mut self, ux_out: UxOut) -> Result<Sha256> {
        let hash = ux_out.hash();
        if self.index.contains_key(&hash) {
            return Err(Error::DuplicateOutput(hash));
        }
        let position = self.entries.len();
        self.entries.push(Entry { hash, ux_out });
        self.index.insert(hash, position);
        self.xor_hash ^= hash;
        trace!("Added unspent {} at {}, xor hash: {}", hash, position, self.xor_hash);
        Ok(hash)
    }

    /// Returns the output with the given hash, or None if it's not in the pool.
    pub fn get(&self, hash: &Sha256) -> Option<&UxOut> {
        self.index
            .get(hash)
            .map(|position| &self.entries[*position].ux_out)
    }

    /// Returns whether or not an output with the given hash is in the pool.
    pub fn has(&self, hash: &Sha256) -> bool {
        self.index.contains_key(hash)
    }

    /// Removes the output with the given hash and returns it.
    /// Does nothing if the hash is not in the pool.
    ///
    /// The remaining outputs keep their order, so every output after the removed one moves
    /// one position down.
    pub fn delete(&mut self, hash: &Sha256) -> Option<UxOut> {
        let position = self.index.remove(hash)?;
        let entry = self.entries.remove(position);
        self.reindex_from(position);
        self.xor_hash ^= entry.hash;
        trace!("Deleted unspent {} at {}, xor hash: {}", hash, position, self.xor_hash);
        Some(entry.ux_out)
    }

    /// Removes all outputs with the given hashes and returns them in the order of the hashes.
    /// Hashes that are not in the pool are ignored.
    ///
    /// The result is the same as calling `delete` for each hash, but positions are repaired
    /// once, starting from the lowest removed position.
    pub fn delete_multiple(&mut self, hashes: &[Sha256]) -> Vec<UxOut> {
        let mut positions = Vec::with_capacity(hashes.len());
        let mut lowest = self.entries.len();
        for hash in hashes {
            // Positions are still the ones before any removal, because nothing has moved yet.
            if let Some(position) = self.index.remove(hash) {
                lowest = lowest.min(position);
                self.xor_hash ^= *hash;
                positions.push(position);
            }
        }
        if positions.is_empty() {
            return vec![];
        }

        let mut tail = self
            .entries
            .drain(lowest..)
            .map(Some)
            .collect::<Vec<Option<Entry>>>();
        let removed = positions
            .iter()
            .filter_map(|position| tail[position - lowest].take())
            .map(|entry| entry.ux_out)
            .collect::<Vec<UxOut>>();
        self.entries.extend(tail.into_iter().flatten());
        self.reindex_from(lowest);

        debug!(
            "Deleted {} unspents starting at {}, xor hash: {}",
            removed.len(),
            lowest,
            self.xor_hash
        );
        removed
    }

    /// Returns all unspent outputs owned by the address, in pool order.
    pub fn all_for_address(&self, address: &Address) -> Vec<UxOut> {
        self.iter()
            .filter(|ux_out| ux_out.address() == address)
            .cloned()
            .collect()
    }

    /// Returns the unspent outputs for each of the addresses, in pool order.
    /// Every requested address has an entry, even if it owns no outputs.
    pub fn all_for_addresses(&self, addresses: &[Address]) -> HashMap<Address, Vec<UxOut>> {
        let mut outputs = addresses
            .iter()
            .map(|address| (address.clone(), vec![]))
            .collect::<HashMap<Address, Vec<UxOut>>>();
        for ux_out in self.iter() {
            if let Some(bucket) = outputs.get_mut(ux_out.address()) {
                bucket.push(ux_out.clone());
            }
        }
        outputs
    }

    /// Returns the total number of coins owned by the address.
    pub fn coins_for_address(&self, address: &Address) -> u64 {
        self.iter()
            .filter(|ux_out| ux_out.address() == address)
            .fold(0u64, |total, ux_out| total.saturating_add(ux_out.coins()))
    }

    /// Returns the total coin-hours owned by the address at `now`.
    pub fn coin_hours_for_address(&self, address: &Address, now: u64) -> u64 {
        self.iter()
            .filter(|ux_out| ux_out.address() == address)
            .fold(0u64, |total, ux_out| {
                total.saturating_add(ux_out.coin_hours(now))
            })
    }

    /// The XOR of the hashes of all outputs in the pool.
    /// Pools with the same outputs have the same xor hash, regardless of the order.
    pub fn xor_hash(&self) -> &Sha256 {
        &self.xor_hash
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the outputs in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &UxOut> {
        self.entries.iter().map(|entry| &entry.ux_out)
    }

    /// Returns the hashes of all outputs in pool order.
    pub fn hashes(&self) -> Vec<Sha256> {
        self.entries.iter().map(|entry| entry.hash).collect()
    }

    /// Recomputes the index and the xor hash from the outputs and checks that they match.
    pub fn verify(&self) -> Result<()> {
        if self.index.len() != self.entries.len() {
            return Err(Error::Inconsistent(format!(
                "{} outputs but {} indexed hashes",
                self.entries.len(),
                self.index.len()
            )));
        }
        let mut xor_hash = Sha256::default();
        for (position, entry) in self.entries.iter().enumerate() {
            let hash = entry.ux_out.hash();
            if hash != entry.hash {
                return Err(Error::Inconsistent(format!(
                    "output at {} hashes to {} but is stored as {}",
                    position, hash, entry.hash
                )));
            }
            match self.index.get(&hash) {
                Some(indexed) if *indexed == position => {}
                Some(indexed) => {
                    return Err(Error::Inconsistent(format!(
                        "output {} is at {} but indexed at {}",
                        hash, position, indexed
                    )))
                }
                None => {
                    return Err(Error::Inconsistent(format!(
                        "output {} at {} is not indexed",
                        hash, position
                    )))
                }
            }
            xor_hash ^= hash;
        }
        if xor_hash != self.xor_hash {
            return Err(Error::Inconsistent(format!(
                "xor hash is {} but outputs hash to {}",
                self.xor_hash, xor_hash
            )));
        }
        Ok(())
    }

    /// Points the index at the current position of every output from `start` onwards.
    fn reindex_from(&mut self, start: usize) {
        for (position, entry) in self.entries.iter().enumerate().skip(start) {
            self.index.insert(entry.hash, position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{UxBody, UxHead};
    use quickcheck_macros::quickcheck;

    fn address(name: &str) -> Address {
        Address::new(name.to_string())
    }

    fn ux_out(owner: &str, seed: u64) -> UxOut {
        UxOut::new(
            UxHead::new(seed * 10, seed),
            UxBody::new(
                Sha256::digest(&seed.to_le_bytes()),
                address(owner),
                seed + 1,
                seed,
            ),
        )
    }

    fn pool_with(count: u64) -> UnspentPool {
        let owners = ["a", "b", "c"];
        UnspentPool::from_outputs((0..count).map(|i| ux_out(owners[(i % 3) as usize], i)))
            .unwrap()
    }

    fn recomputed_xor_hash(pool: &UnspentPool) -> Sha256 {
        pool.iter()
            .fold(Sha256::default(), |acc, ux_out| acc ^ ux_out.hash())
    }

    #[test]
    fn empty_pool() {
        let pool = UnspentPool::new();
        assert!(pool.is_empty());
        assert!(pool.xor_hash().is_zero());
        assert!(pool.get(&Sha256::digest(b"missing")).is_none());
        pool.verify().unwrap();
    }

    #[test]
    fn add_get_has() {
        let mut pool = UnspentPool::new();
        let ux = ux_out("a", 1);
        let hash = pool.add(ux.clone()).unwrap();
        assert_eq!(hash, ux.hash());
        assert!(pool.has(&hash));
        assert_eq!(pool.get(&hash), Some(&ux));
        assert_eq!(*pool.xor_hash(), hash);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn add_rejects_duplicate_hash() {
        let mut pool = pool_with(3);
        let before = pool.clone();
        // Same body, different head: still the same output.
        let duplicate = UxOut::new(UxHead::new(999, 999), ux_out("b", 1).body().clone());
        match pool.add(duplicate) {
            Err(Error::DuplicateOutput(hash)) => assert_eq!(hash, ux_out("b", 1).hash()),
            other => panic!("Unexpected result: {:?}", other),
        }
        assert_eq!(pool, before);
        pool.verify().unwrap();
    }

    #[test]
    fn from_outputs_rejects_duplicates() {
        let result = UnspentPool::from_outputs(vec![ux_out("a", 1), ux_out("a", 1)]);
        assert!(matches!(result, Err(Error::DuplicateOutput(_))));
    }

    #[test]
    fn delete_absent_is_noop() {
        let mut pool = pool_with(5);
        let before = pool.clone();
        assert!(pool.delete(&Sha256::digest(b"missing")).is_none());
        assert_eq!(pool, before);
        assert!(pool
            .delete_multiple(&[Sha256::digest(b"missing"), Sha256::default()])
            .is_empty());
        assert_eq!(pool, before);
    }

    #[test]
    fn delete_shifts_later_outputs() {
        let mut pool = pool_with(5);
        let hashes = pool.hashes();
        let removed = pool.delete(&hashes[1]).unwrap();
        assert_eq!(removed.hash(), hashes[1]);
        assert_eq!(
            pool.hashes(),
            vec![hashes[0], hashes[2], hashes[3], hashes[4]]
        );
        for hash in &hashes[2..] {
            assert!(pool.get(hash).is_some());
        }
        assert_eq!(*pool.xor_hash(), recomputed_xor_hash(&pool));
        pool.verify().unwrap();
    }

    #[test]
    fn delete_last_and_first() {
        let mut pool = pool_with(3);
        let hashes = pool.hashes();
        pool.delete(&hashes[2]).unwrap();
        pool.delete(&hashes[0]).unwrap();
        assert_eq!(pool.hashes(), vec![hashes[1]]);
        assert_eq!(*pool.xor_hash(), hashes[1]);
        pool.delete(&hashes[1]).unwrap();
        assert!(pool.is_empty());
        assert!(pool.xor_hash().is_zero());
        pool.verify().unwrap();
    }

    #[test]
    fn delete_multiple_out_of_order() {
        // Removing a lower position first must not shift the next removal onto a wrong output.
        let mut pool = pool_with(6);
        let hashes = pool.hashes();
        let removed = pool.delete_multiple(&[hashes[1], hashes[4], hashes[2]]);
        assert_eq!(
            removed.iter().map(UxOut::hash).collect::<Vec<_>>(),
            vec![hashes[1], hashes[4], hashes[2]]
        );
        assert_eq!(pool.hashes(), vec![hashes[0], hashes[3], hashes[5]]);
        pool.verify().unwrap();
    }

    #[test]
    fn delete_multiple_ignores_repeats_and_absent() {
        let mut pool = pool_with(4);
        let hashes = pool.hashes();
        let removed = pool.delete_multiple(&[
            hashes[3],
            Sha256::digest(b"missing"),
            hashes[3],
            hashes[0],
        ]);
        assert_eq!(removed.len(), 2);
        assert_eq!(pool.hashes(), vec![hashes[1], hashes[2]]);
        assert_eq!(*pool.xor_hash(), hashes[1] ^ hashes[2]);
        pool.verify().unwrap();
    }

    #[test]
    fn delete_multiple_matches_sequential_delete() {
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..50 {
            let pool = pool_with(rng.u64(1..40));
            let mut selected = pool
                .hashes()
                .into_iter()
                .filter(|_| rng.bool())
                .collect::<Vec<Sha256>>();

            let mut batched = pool.clone();
            batched.delete_multiple(&selected);

            rng.shuffle(&mut selected);
            let mut sequential = pool.clone();
            for hash in &selected {
                sequential.delete(hash);
            }

            assert_eq!(batched, sequential);
            batched.verify().unwrap();
        }
    }

    #[quickcheck]
    fn prop_delete_multiple_equivalence(size: u8, picks: Vec<u8>) -> bool {
        let pool = pool_with(size as u64 % 64);
        let hashes = pool.hashes();
        let selected = picks
            .iter()
            .filter(|_| !hashes.is_empty())
            .map(|pick| hashes[*pick as usize % hashes.len()])
            .collect::<Vec<Sha256>>();

        let mut batched = pool.clone();
        batched.delete_multiple(&selected);
        let mut sequential = pool;
        for hash in selected.iter().rev() {
            sequential.delete(hash);
        }
        batched == sequential && batched.verify().is_ok()
    }

    #[test]
    fn random_operations_keep_invariants() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut pool = UnspentPool::new();
        let mut next_seed = 0;
        for _ in 0..2_000 {
            match rng.u8(0..4) {
                0 | 1 => {
                    pool.add(ux_out("a", next_seed)).unwrap();
                    next_seed += 1;
                }
                2 if !pool.is_empty() => {
                    let hash = pool.hashes()[rng.usize(0..pool.len())];
                    assert!(pool.delete(&hash).is_some());
                    assert!(!pool.has(&hash));
                }
                _ => {
                    let mut hashes = pool
                        .hashes()
                        .into_iter()
                        .filter(|_| rng.u8(0..10) == 0)
                        .collect::<Vec<Sha256>>();
                    hashes.push(Sha256::digest(&rng.u64(..).to_le_bytes()));
                    pool.delete_multiple(&hashes);
                }
            }
            assert_eq!(*pool.xor_hash(), recomputed_xor_hash(&pool));
            pool.verify().unwrap();
        }
    }

    #[test]
    fn xor_hash_is_independent_of_order() {
        let outputs = (0..10).map(|i| ux_out("a", i)).collect::<Vec<UxOut>>();
        let forward = UnspentPool::from_outputs(outputs.clone()).unwrap();
        let backward = UnspentPool::from_outputs(outputs.into_iter().rev()).unwrap();
        assert_eq!(forward.xor_hash(), backward.xor_hash());
        assert_ne!(forward, backward);
    }

    #[test]
    fn all_for_addresses_has_every_requested_address() {
        let pool = UnspentPool::from_outputs(vec![ux_out("a", 0), ux_out("b", 1)]).unwrap();
        let outputs = pool.all_for_addresses(&[address("a"), address("b"), address("c")]);
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[&address("a")], vec![ux_out("a", 0)]);
        assert_eq!(outputs[&address("b")], vec![ux_out("b", 1)]);
        assert!(outputs[&address("c")].is_empty());
    }

    #[test]
    fn all_for_addresses_deduplicates_requests() {
        let pool = pool_with(6);
        let outputs = pool.all_for_addresses(&[address("a"), address("a")]);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[&address("a")], pool.all_for_address(&address("a")));
        assert_eq!(outputs[&address("a")].len(), 2);
    }

    #[test]
    fn balances_for_address() {
        let pool = pool_with(6);
        // Outputs 0 and 3 belong to "a", with 1 and 4 coins, 0 and 3 hours, created at 0 and 30.
        assert_eq!(pool.coins_for_address(&address("a")), 5);
        assert_eq!(pool.coin_hours_for_address(&address("a"), 0), 0);
        assert_eq!(pool.coin_hours_for_address(&address("a"), 3600), 1 + 3);
        assert_eq!(pool.coin_hours_for_address(&address("a"), 3630), 1 + 3 + 4);
        assert_eq!(pool.coins_for_address(&address("z")), 0);
    }

    #[test]
    fn end_to_end() {
        let mut pool = UnspentPool::new();
        let h1 = pool.add(ux_out("A", 1)).unwrap();
        let h2 = pool.add(ux_out("A", 2)).unwrap();
        let h3 = pool.add(ux_out("B", 3)).unwrap();
        assert!(h1 != h2 && h2 != h3 && h1 != h3);

        let owned = pool.all_for_address(&address("A"));
        assert_eq!(owned, vec![ux_out("A", 1), ux_out("A", 2)]);

        pool.delete(&h1);
        assert!(pool.get(&h1).is_none());
        assert_eq!(pool.get(&h2), Some(&ux_out("A", 2)));
        assert_eq!(pool.get(&h3), Some(&ux_out("B", 3)));
        assert_eq!(*pool.xor_hash(), h2 ^ h3);
        pool.verify().unwrap();
    }

    #[test]
    fn verify_detects_stale_fingerprint() {
        let mut pool = pool_with(3);
        pool.xor_hash ^= Sha256::digest(b"corruption");
        assert!(matches!(pool.verify(), Err(Error::Inconsistent(_))));
    }

    #[test]
    fn verify_detects_stale_index() {
        let mut pool = pool_with(3);
        let hash = pool.hashes()[2];
        pool.index.insert(hash, 0);
        assert!(matches!(pool.verify(), Err(Error::Inconsistent(_))));
    }
}
