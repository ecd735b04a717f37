//! The ledger-side model that VM settlements are expressed in.

mod script;
mod transaction;

pub use script::Script;
pub use transaction::{LedgerTransaction, TxIn, TxOut};

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

/// An amount in the ledger's smallest monetary unit.
pub type Amount = u64;

/// A reference to a single output of a ledger transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    /// The id of the transaction holding the output.
    pub hash: B256,
    /// The position of the output within that transaction.
    pub index: u32,
}

impl OutPoint {
    /// Creates a new [`OutPoint`].
    pub fn new(hash: B256, index: u32) -> Self {
        Self { hash, index }
    }
}

/// An unspent output together with the amount it holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Where the output lives.
    pub outpoint: OutPoint,
    /// The amount the output holds.
    pub value: Amount,
}
