use crate::{Address, Error, Result, Sha256};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Coin-hours accrue once per whole hour of holding.
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Fixed-width little-endian integers and length prefixes, with no slack for trailing bytes.
pub(crate) fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Metadata about an output that is not part of its identity.
///
/// It depends on the block that included the output, so it may differ between
/// competing branches of the chain while the output itself stays the same.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct UxHead {
    // Time of the block the output was created in (seconds from Unix Epoch).
    time: u64,
    // Sequence of the block the output was created in.
    block_seq: u64,
    // Sequence of the block the output was spent in, 0 while unspent.
    spend_seq: u64,
}

impl UxHead {
    pub fn new(time: u64, block_seq: u64) -> Self {
        Self {
            time,
            block_seq,
            spend_seq: 0,
        }
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn block_seq(&self) -> u64 {
        self.block_seq
    }

    pub fn spend_seq(&self) -> u64 {
        self.spend_seq
    }
}

/// The hashed part of an output.
/// Only contains what the sender knows when creating the transaction.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct UxBody {
    // The transaction that created this output.
    src_transaction: Sha256,
    // The address of the receiver.
    address: Address,
    // Number of coins, in the smallest indivisible unit.
    coins: u64,
    // Coin-hours the output carried when it was created.
    hours: u64,
}

impl UxBody {
    pub fn new(src_transaction: Sha256, address: Address, coins: u64, hours: u64) -> Self {
        Self {
            src_transaction,
            address,
            coins,
            hours,
        }
    }

    pub fn src_transaction(&self) -> &Sha256 {
        &self.src_transaction
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn hours(&self) -> u64 {
        self.hours
    }

    /// The deterministic encoding that the output identity is computed from.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // A digest, a string and two integers always serialize into memory.
        codec()
            .serialize(self)
            .expect("UxBody is always serializable")
    }
}

/// An unspent transaction output.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct UxOut {
    head: UxHead,
    body: UxBody,
}

impl UxOut {
    pub fn new(head: UxHead, body: UxBody) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &UxHead {
        &self.head
    }

    pub fn body(&self) -> &UxBody {
        &self.body
    }

    pub fn address(&self) -> &Address {
        self.body.address()
    }

    pub fn coins(&self) -> u64 {
        self.body.coins()
    }

    /// Returns a copy of this output that records the block it was spent in.
    /// The hash doesn't change.
    pub fn spent_in(&self, spend_seq: u64) -> UxOut {
        let mut spent = self.clone();
        spent.head.spend_seq = spend_seq;
        spent
    }

    /// The identity of the output.
    ///
    /// Computed from the body only, so that an output keeps its hash regardless of the
    /// block it ends up in or when it is spent.
    pub fn hash(&self) -> Sha256 {
        Sha256::digest(&self.body.canonical_bytes())
    }

    /// Returns the coin-hour balance of the output at `now` (seconds from Unix Epoch).
    ///
    /// The balance is the starting coin-hours plus one coin-hour per coin for every whole
    /// hour since the output was created. An output created after `now` has accrued nothing.
    /// The result saturates at `u64::MAX` instead of overflowing.
    pub fn coin_hours(&self, now: u64) -> u64 {
        if now < self.head.time {
            return 0;
        }
        let elapsed_hours = (now - self.head.time) / SECONDS_PER_HOUR;
        let accrued = elapsed_hours.saturating_mul(self.body.coins);
        self.body.hours.saturating_add(accrued)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        codec().serialize(self).map_err(Error::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec().deserialize(bytes).map_err(Error::Decode)
    }
}

impl Display for UxOut {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} coins: {} hours: {} block: {}",
            self.hash(),
            self.body.address,
            self.body.coins,
            self.body.hours,
            self.head.block_seq
        )
    }
}
