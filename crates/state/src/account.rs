use alloy::primitives::{Bytes, B256, U256};
use hashbrown::HashMap;
use ledgervm_common::ledger::Coin;
use serde::{Deserialize, Serialize};

/// A single VM account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The creation counter, used to derive addresses of contracts this account creates.
    pub nonce: u64,

    /// The VM-side balance.
    pub balance: U256,

    /// Runtime code, present for contracts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,

    /// Persistent key-value storage.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub storage: HashMap<B256, B256>,

    /// The ledger output currently holding this contract's balance, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custody: Option<Coin>,
}

impl Account {
    /// Whether the account holds code.
    pub fn is_contract(&self) -> bool {
        self.code.is_some()
    }
}
