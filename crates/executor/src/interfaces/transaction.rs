use alloy::primitives::{Address, Bytes, B256, U256};
use ledgervm_common::{ether::address::contract_address, ledger::OutPoint};
use serde::{Deserialize, Serialize};

/// A VM transaction as extracted from a ledger transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmTransaction {
    /// The account paying for and sending the transaction.
    pub sender: Address,

    /// The called account. `None` and the zero address both mark a contract creation.
    #[serde(default)]
    pub receiver: Option<Address>,

    /// Value delivered to the receiver.
    #[serde(default)]
    pub value: U256,

    /// Gas the sender prepaid for.
    pub gas_limit: U256,

    /// Price per unit of gas.
    pub gas_price: U256,

    /// Constructor bytecode for a creation, call data otherwise.
    #[serde(default)]
    pub data: Bytes,

    /// Hash of the ledger transaction carrying this VM transaction.
    pub origin_hash: B256,

    /// Index of the carrying output within that ledger transaction.
    #[serde(default)]
    pub output_index: u32,
}

impl VmTransaction {
    /// Creates a contract creation transaction.
    pub fn new_create(
        sender: Address,
        value: U256,
        gas_limit: U256,
        gas_price: U256,
        code: Bytes,
        origin_hash: B256,
        output_index: u32,
    ) -> Self {
        Self {
            sender,
            receiver: None,
            value,
            gas_limit,
            gas_price,
            data: code,
            origin_hash,
            output_index,
        }
    }

    /// Creates a call (or plain transfer) to `receiver`. A zero `receiver` makes this a
    /// contract creation with `data` as the constructor code.
    #[allow(clippy::too_many_arguments)]
    pub fn new_call(
        sender: Address,
        receiver: Address,
        value: U256,
        gas_limit: U256,
        gas_price: U256,
        data: Bytes,
        origin_hash: B256,
        output_index: u32,
    ) -> Self {
        Self {
            sender,
            receiver: Some(receiver),
            value,
            gas_limit,
            gas_price,
            data,
            origin_hash,
            output_index,
        }
    }

    /// Whether this transaction creates a contract.
    pub fn is_creation(&self) -> bool {
        self.receiver.is_none_or(|receiver| receiver.is_zero())
    }

    /// The ledger output that funds this transaction's value.
    pub fn origin(&self) -> OutPoint {
        OutPoint::new(self.origin_hash, self.output_index)
    }

    /// The account this transaction executes against: the receiver of a call, or the derived
    /// address of the contract being created.
    pub fn target(&self) -> Address {
        match self.receiver {
            Some(receiver) if !receiver.is_zero() => receiver,
            _ => contract_address(&self.origin_hash, self.output_index),
        }
    }
}
