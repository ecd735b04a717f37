use std::fmt::{self, Display};

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Why a transaction did not complete, as reported per transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionException {
    /// Success.
    #[default]
    None,
    /// The gas limit does not cover the intrinsic cost.
    OutOfGasBase,
    /// The gas limit exceeds what is left of the block gas limit.
    BlockGasLimitReached,
    /// The derived creation address already belongs to a contract.
    AddressAlreadyUsed,
    /// Gas ran out during execution.
    OutOfGas,
    /// An undefined instruction was executed.
    BadInstruction,
    /// A jump landed outside of a jump destination.
    BadJumpDestination,
    /// The stack grew beyond its limit.
    OutOfStack,
    /// An instruction popped from an empty stack.
    StackUnderflow,
    /// The code reverted explicitly.
    Revert,
    /// Any other interpreter fault.
    Unknown,
}

impl TransactionException {
    /// Whether the transaction succeeded.
    pub fn is_none(&self) -> bool {
        matches!(self, TransactionException::None)
    }
}

impl Display for TransactionException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionException::None => "none",
            TransactionException::OutOfGasBase => "out of gas (intrinsic)",
            TransactionException::BlockGasLimitReached => "block gas limit reached",
            TransactionException::AddressAlreadyUsed => "address already used",
            TransactionException::OutOfGas => "out of gas",
            TransactionException::BadInstruction => "bad instruction",
            TransactionException::BadJumpDestination => "bad jump destination",
            TransactionException::OutOfStack => "out of stack",
            TransactionException::StackUnderflow => "stack underflow",
            TransactionException::Revert => "revert",
            TransactionException::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// What caused a VM-side value movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// A message call carrying value, including nested creations.
    Call,
    /// A self-destruct payout.
    SelfDestruct,
}

/// A value movement performed by the interpreter below the top-level call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTransfer {
    /// Debited account.
    pub from: Address,
    /// Credited account.
    pub to: Address,
    /// Amount moved.
    pub value: U256,
    /// What moved it.
    pub kind: TransferKind,
}

/// The raw result of running one transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// How the execution ended.
    pub exception: TransactionException,

    /// Address of the contract created by a successful creation.
    pub new_address: Option<Address>,

    /// Returned bytes; the runtime code for a creation.
    pub output: Bytes,

    /// Gas consumed, intrinsic cost included.
    pub gas_used: u64,

    /// Value moved by the execution besides the top-level delivery.
    pub transfers: Vec<ValueTransfer>,
}

impl ExecutionOutcome {
    /// An outcome for a transaction that never reached the interpreter, or whose effects were
    /// discarded.
    pub fn failed(exception: TransactionException, gas_used: u64) -> Self {
        Self { exception, gas_used, ..Default::default() }
    }
}
