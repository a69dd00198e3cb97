use crate::{Error, Result};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A named collection of key/value pairs.
///
/// A bucket knows nothing about what it stores, consistency of the values is the
/// responsibility of the caller.
pub trait Bucket {
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()>;

    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Returns all values in key order.
    fn get_all(&self) -> Vec<Vec<u8>>;

    fn contains(&self, key: &[u8]) -> bool;

    /// Removes the key, or fails with `Error::KeyNotFound` if it doesn't exist.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Replaces the value of an existing key with the result of `f`.
    fn update<F>(&mut self, key: &[u8], f: F) -> Result<()>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>>;

    /// Visits all key/value pairs in key order, stopping at the first error.
    fn for_each<F>(&self, f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>;

    /// Replaces every value with the result of `f`.
    /// If `f` fails for any pair, no value is changed.
    fn range_update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<Vec<u8>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A bucket that lives in memory only.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MemoryBucket {
    values: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Bucket for MemoryBucket {
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.values.insert(key.to_vec(), value);
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.values.get(key).cloned()
    }

    fn get_all(&self) -> Vec<Vec<u8>> {
        self.values.values().cloned().collect()
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.values.contains_key(key)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        match self.values.remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::KeyNotFound(hex::encode(key))),
        }
    }

    fn update<F>(&mut self, key: &[u8], f: F) -> Result<()>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>>,
    {
        match self.values.get_mut(key) {
            Some(value) => {
                *value = f(value.as_slice())?;
                Ok(())
            }
            None => Err(Error::KeyNotFound(hex::encode(key))),
        }
    }

    fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        for (key, value) in &self.values {
            f(key.as_slice(), value.as_slice())?;
        }
        Ok(())
    }

    fn range_update<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<Vec<u8>>,
    {
        let updated = self
            .values
            .iter()
            .map(|(key, value)| f(key.as_slice(), value.as_slice()))
            .collect::<Result<Vec<Vec<u8>>>>()?;
        for (value, new_value) in self.values.values_mut().zip(updated) {
            *value = new_value;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

/// A bucket that is kept in memory and written to a single file on `flush`.
#[derive(Debug)]
pub struct FileBucket {
    path: PathBuf,
    values: MemoryBucket,
}

impl FileBucket {
    /// Opens the bucket stored at `path`, or an empty one if the file doesn't exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let bytes = fs::read(&path)?;
            let values = bincode::deserialize(&bytes).map_err(Error::Decode)?;
            MemoryBucket { values }
        } else {
            MemoryBucket::new()
        };
        debug!("Opened bucket {} with {} keys", path.display(), values.len());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes all values to the file.
    /// The values go to a fresh temporary file in the same directory, which then replaces the
    /// bucket file, so a failed flush leaves the previous contents intact.
    pub fn flush(&self) -> Result<()> {
        let bytes = bincode::serialize(&self.values.values).map_err(Error::Encode)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        debug!(
            "Flushed bucket {} with {} keys",
            self.path.display(),
            self.values.len()
        );
        Ok(())
    }
}

impl Bucket for FileBucket {
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.values.put(key, value)
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.values.get(key)
    }

    fn get_all(&self) -> Vec<Vec<u8>> {
        self.values.get_all()
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.values.contains(key)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.values.delete(key)
    }

    fn update<F>(&mut self, key: &[u8], f: F) -> Result<()>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>>,
    {
        self.values.update(key, f)
    }

    fn for_each<F>(&self, f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        self.values.for_each(f)
    }

    fn range_update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<Vec<u8>>,
    {
        self.values.range_update(f)
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}
