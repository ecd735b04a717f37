use alloy::primitives::{keccak256, Bytes, B256};
use serde::{Deserialize, Serialize};

use super::{Amount, OutPoint, Script};
use crate::constants::{OP_SPEND, TRANSFER_TX_VERSION};

/// A transaction input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    /// The output being spent.
    pub prevout: OutPoint,
    /// The unlocking script.
    pub script_sig: Bytes,
}

impl TxIn {
    /// An input spending an output that the executor itself controls, i.e. a contract custody
    /// output or the value-bearing output of the originating transaction.
    pub fn spend(prevout: OutPoint) -> Self {
        Self { prevout, script_sig: Bytes::from_static(&[OP_SPEND]) }
    }
}

/// A transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// The amount locked by this output.
    pub value: Amount,
    /// The locking script.
    pub script: Script,
}

impl TxOut {
    /// Creates a new [`TxOut`].
    pub fn new(value: Amount, script: Script) -> Self {
        Self { value, script }
    }
}

/// A fully formed ledger transaction, as produced for VM-side value movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Transaction format version.
    pub version: i32,
    /// The outputs being spent.
    pub inputs: Vec<TxIn>,
    /// The outputs being created.
    pub outputs: Vec<TxOut>,
    /// Earliest time or height at which the transaction is final.
    pub lock_time: u32,
}

impl Default for LedgerTransaction {
    fn default() -> Self {
        Self { version: TRANSFER_TX_VERSION, inputs: Vec::new(), outputs: Vec::new(), lock_time: 0 }
    }
}

impl LedgerTransaction {
    /// Creates a transfer transaction from its inputs and outputs.
    pub fn transfer(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Self { inputs, outputs, ..Default::default() }
    }

    /// The sum of all output values, or `None` on overflow.
    pub fn output_value(&self) -> Option<Amount> {
        self.outputs.iter().try_fold(0u64, |acc, out| acc.checked_add(out.value))
    }

    /// Serializes the transaction into its canonical byte encoding.
    ///
    /// All integers are little-endian; collections and scripts are prefixed with a
    /// compact-size length.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.inputs.len() * 41 + self.outputs.len() * 40);
        out.extend_from_slice(&self.version.to_le_bytes());

        write_compact_size(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(input.prevout.hash.as_slice());
            out.extend_from_slice(&input.prevout.index.to_le_bytes());
            write_compact_size(&mut out, input.script_sig.len() as u64);
            out.extend_from_slice(&input.script_sig);
        }

        write_compact_size(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            let script = output.script.to_bytes();
            out.extend_from_slice(&output.value.to_le_bytes());
            write_compact_size(&mut out, script.len() as u64);
            out.extend_from_slice(&script);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// The transaction id, `keccak256` of the canonical encoding.
    pub fn txid(&self) -> B256 {
        keccak256(self.encode())
    }
}

fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}
