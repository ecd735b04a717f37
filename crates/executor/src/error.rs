//! Error types for the executor module

use alloy::primitives::{Address, U256};
use ledgervm_common::ledger::Amount;

/// Errors that abort a whole batch.
///
/// A failing transaction is never one of these: it is reported through its
/// [`TransactionException`](crate::TransactionException) and the batch carries on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The VM state rejected an operation the executor relies on
    #[error("State error: {0}")]
    State(#[from] ledgervm_state::Error),

    /// The interpreter failed to produce an outcome
    #[error("Interpreter error: {0}")]
    Interpreter(eyre::Report),

    /// The interpreter created a contract somewhere other than the derived address
    #[error("Address mismatch: expected {derived}, interpreter reported {reported}")]
    AddressMismatch {
        /// The address derived from the originating output.
        derived: Address,
        /// The address the interpreter reported.
        reported: Address,
    },

    /// The interpreter moved value the ledger cannot account for
    #[error("Unbalanced transfer for transaction {index}: inputs {inputs}, outputs {outputs}")]
    UnbalancedTransfer {
        /// Position of the transaction in its batch.
        index: usize,
        /// Sum of the spent outputs.
        inputs: Amount,
        /// Sum of the created outputs.
        outputs: Amount,
    },

    /// A VM quantity does not fit in a ledger amount
    #[error("Amount overflow: {0} does not fit in a ledger amount")]
    AmountOverflow(U256),

    /// Chain parameters could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ledgervm_config::error::Error),

    /// A batch, state or report file could not be (de)serialized
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Generic error
    #[error("Error: {0}")]
    Eyre(#[from] eyre::Report),
}
