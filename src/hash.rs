use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::fmt::{Display, Formatter};
use std::ops::{BitXor, BitXorAssign};

const SHA256_BYTE_COUNT: usize = 32;

/// Sha-256 is a 256-bit array or 32 bytes.
/// It provides an API to display as hex-encoded string and parse it from a hex-encoded string.
/// Hashes can be combined with XOR, which is how the unspent pool fingerprints its contents.
#[derive(
    Copy, Clone, Debug, Default, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize,
)]
pub struct Sha256([u8; SHA256_BYTE_COUNT]);

impl Sha256 {
    pub const fn from_raw(raw_bytes: [u8; SHA256_BYTE_COUNT]) -> Self {
        Self(raw_bytes)
    }

    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);
        let mut output = [0; SHA256_BYTE_COUNT];
        output.copy_from_slice(&hasher.finalize());
        Sha256::from_raw(output)
    }

    /// Returns None unless the slice is exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != SHA256_BYTE_COUNT {
            return None;
        }
        let mut sha = [0; SHA256_BYTE_COUNT];
        sha.copy_from_slice(bytes);
        Some(Sha256::from_raw(sha))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    /// Returns the byte-wise XOR of both hashes.
    pub fn xor(&self, other: &Sha256) -> Sha256 {
        let mut output = self.0;
        for (lhs, rhs) in output.iter_mut().zip(other.0.iter()) {
            *lhs ^= *rhs;
        }
        Sha256::from_raw(output)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_slice())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes).ok_or_else(|| Error::InvalidHashLength {
            expected: SHA256_BYTE_COUNT,
            actual: bytes.len(),
            input: s.to_string(),
        })
    }
}

impl BitXor for Sha256 {
    type Output = Sha256;

    fn bitxor(self, rhs: Sha256) -> Sha256 {
        self.xor(&rhs)
    }
}

impl BitXorAssign for Sha256 {
    fn bitxor_assign(&mut self, rhs: Sha256) {
        *self = self.xor(&rhs);
    }
}

impl Display for Sha256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
