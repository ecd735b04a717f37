use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::constants::{
    OP_0, OP_CALL, OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160, OP_PUSHBYTES_1,
    OP_PUSHBYTES_20, VM_VERSION,
};

/// The locking script of an output produced by the executor.
///
/// The executor only ever emits two kinds of outputs: payments to a key hash (refunds, value
/// returned to senders, payouts to code-less accounts) and outputs held in custody by a contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "address", rename_all = "snake_case")]
pub enum Script {
    /// `OP_DUP OP_HASH160 <address> OP_EQUALVERIFY OP_CHECKSIG`
    PayToPubKeyHash(Address),
    /// `<vm version> OP_0 OP_0 <0x00> <address> OP_CALL`
    Custody(Address),
}

impl Script {
    /// The address the script pays to.
    pub fn address(&self) -> Address {
        match self {
            Script::PayToPubKeyHash(address) | Script::Custody(address) => *address,
        }
    }

    /// Whether the output is held by a contract.
    pub fn is_custody(&self) -> bool {
        matches!(self, Script::Custody(_))
    }

    /// Serializes the script into its on-ledger byte form.
    ///
    /// ```
    /// use alloy::primitives::Address;
    /// use ledgervm_common::ledger::Script;
    ///
    /// let script = Script::PayToPubKeyHash(Address::repeat_byte(0x01));
    /// let bytes = script.to_bytes();
    /// assert_eq!(bytes.len(), 25);
    /// assert_eq!(&bytes[..3], &[0x76, 0xa9, 0x14]);
    /// ```
    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(30);
        match self {
            Script::PayToPubKeyHash(address) => {
                out.extend_from_slice(&[OP_DUP, OP_HASH160, OP_PUSHBYTES_20]);
                out.extend_from_slice(address.as_slice());
                out.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
            }
            Script::Custody(address) => {
                // version, gas limit, gas price, data
                out.extend_from_slice(&[OP_PUSHBYTES_1, VM_VERSION, OP_0, OP_0, OP_PUSHBYTES_1, 0x00]);
                out.push(OP_PUSHBYTES_20);
                out.extend_from_slice(address.as_slice());
                out.push(OP_CALL);
            }
        }
        out.into()
    }
}
