use crate::{Address, Result, Sha256, UnspentPool, UxOut};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An unspent pool that can be shared between threads.
///
/// Each operation holds the lock for its whole duration, so readers never observe outputs,
/// index and xor hash out of sync. A batch deletion is a single write.
#[derive(Clone, Default)]
pub struct SharedUnspentPool {
    pool: Arc<RwLock<UnspentPool>>,
}

impl SharedUnspentPool {
    pub fn new(pool: UnspentPool) -> Self {
        Self {
            pool: Arc::new(RwLock::new(pool)),
        }
    }

    pub fn add(&self, ux_out: UxOut) -> Result<Sha256> {
        self.write().add(ux_out)
    }

    pub fn get(&self, hash: &Sha256) -> Option<UxOut> {
        self.read().get(hash).cloned()
    }

    pub fn has(&self, hash: &Sha256) -> bool {
        self.read().has(hash)
    }

    pub fn delete(&self, hash: &Sha256) -> Option<UxOut> {
        self.write().delete(hash)
    }

    pub fn delete_multiple(&self, hashes: &[Sha256]) -> Vec<UxOut> {
        self.write().delete_multiple(hashes)
    }

    pub fn all_for_address(&self, address: &Address) -> Vec<UxOut> {
        self.read().all_for_address(address)
    }

    pub fn all_for_addresses(&self, addresses: &[Address]) -> HashMap<Address, Vec<UxOut>> {
        self.read().all_for_addresses(addresses)
    }

    pub fn xor_hash(&self) -> Sha256 {
        *self.read().xor_hash()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Runs `f` with shared access to the pool, e.g. to read several values consistently.
    pub fn with<T>(&self, f: impl FnOnce(&UnspentPool) -> T) -> T {
        f(&self.read())
    }

    /// Returns a copy of the pool as it is at this moment.
    pub fn snapshot(&self) -> UnspentPool {
        self.read().clone()
    }

    // Every mutation either fails before touching the pool or leaves it consistent, so a
    // panic in another thread can't leave a half-applied change behind.
    fn read(&self) -> RwLockReadGuard<'_, UnspentPool> {
        self.pool.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UnspentPool> {
        self.pool.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{UxBody, UxHead};
    use std::thread;

    fn ux_out(owner: &str, seed: u64) -> UxOut {
        UxOut::new(
            UxHead::new(0, seed),
            UxBody::new(
                Sha256::digest(&seed.to_le_bytes()),
                Address::new(owner.to_string()),
                1,
                0,
            ),
        )
    }

    #[test]
    fn concurrent_adds_and_deletes() {
        let shared = SharedUnspentPool::default();
        let handles = (0..4u64)
            .map(|worker| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let hashes = (0..100u64)
                        .map(|i| shared.add(ux_out("a", worker * 1000 + i)).unwrap())
                        .collect::<Vec<Sha256>>();
                    // Delete every other output this worker added.
                    let spent = hashes.iter().step_by(2).copied().collect::<Vec<Sha256>>();
                    assert_eq!(shared.delete_multiple(&spent).len(), 50);
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.len(), 200);
        shared.with(|pool| pool.verify()).unwrap();
        let expected = shared
            .snapshot()
            .iter()
            .fold(Sha256::default(), |acc, ux_out| acc ^ ux_out.hash());
        assert_eq!(shared.xor_hash(), expected);
    }

    #[test]
    fn get_returns_copy() {
        let shared = SharedUnspentPool::new(UnspentPool::new());
        let hash = shared.add(ux_out("a", 1)).unwrap();
        assert_eq!(shared.get(&hash), Some(ux_out("a", 1)));
        assert!(shared.has(&hash));
        assert_eq!(shared.delete(&hash), Some(ux_out("a", 1)));
        assert!(shared.get(&hash).is_none());
        assert!(shared.is_empty());
        assert!(shared
            .all_for_addresses(&[Address::new("a".to_string())])
            .values()
            .all(Vec::is_empty));
        assert!(shared.all_for_address(&Address::new("a".to_string())).is_empty());
    }
}
