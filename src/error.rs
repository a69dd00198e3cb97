use crate::Sha256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Pool
    #[error("unspent output {0} already exists in the pool")]
    DuplicateOutput(Sha256),
    #[error("unspent pool is inconsistent: {0}")]
    Inconsistent(String),

    // Parsing
    #[error("invalid SHA-256 length, expected: {expected} but got: {actual} in: {input}")]
    InvalidHashLength {
        expected: usize,
        actual: usize,
        input: String,
    },
    #[error("invalid hex string: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("address must not be empty")]
    InvalidAddress,

    // Storage
    #[error("key not found in bucket: {0}")]
    KeyNotFound(String),
    #[error("failed to decode stored value: {0}")]
    Decode(#[source] bincode::Error),
    #[error("failed to encode value: {0}")]
    Encode(#[source] bincode::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
