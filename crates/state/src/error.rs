use alloy::primitives::{Address, U256};

/// Error type for the State module
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An account was debited more than it holds.
    #[error("insufficient balance at {address}: have {balance}, need {required}")]
    InsufficientBalance {
        /// The account being debited.
        address: Address,
        /// What the account holds.
        balance: U256,
        /// What the debit asked for.
        required: U256,
    },
    /// A contract was deployed at an address that is live with code, or was retired.
    #[error("address already in use: {0}")]
    AddressInUse(Address),
    /// An operation required an account that does not exist.
    #[error("unknown account: {0}")]
    UnknownAccount(Address),
    /// `commit` or `revert` was called without an open checkpoint.
    #[error("no open checkpoint")]
    NoCheckpoint,
    /// A contract named itself as its self-destruct beneficiary.
    #[error("contract {0} cannot self-destruct to itself")]
    SelfDestructToSelf(Address),
    /// A sweep targeted an account holding code.
    #[error("cannot sweep contract account {0}")]
    ContractAccount(Address),
}
