use alloy::primitives::B256;
use ledgervm_common::ledger::{Amount, LedgerTransaction, TxOut};
use serde::{Deserialize, Serialize};

use super::ExecutionOutcome;

/// How a transaction's gas was accounted for, in gas units and ledger amounts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasCharge {
    /// Gas counted as used.
    pub gas_used: u64,
    /// Amount kept from the prepaid gas.
    pub fee: Amount,
    /// Amount returned to the sender.
    pub refund: Amount,
}

/// Where a transaction ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Executed and committed.
    Applied,
    /// Rejected before the interpreter ran; the state was never touched.
    RejectedNoState,
    /// Executed, but every state change was discarded.
    Reverted,
}

/// The per-transaction result of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    /// What the interpreter (or the executor, for rejections) reported.
    pub outcome: ExecutionOutcome,
    /// The gas accounting.
    pub charge: GasCharge,
    /// Whether the transaction's state changes were kept.
    pub status: Status,
}

/// Ledger-level summary of a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettlement {
    /// Gas used by the whole batch.
    pub total_gas_used: u64,

    /// Amount kept as fees by the whole batch.
    pub total_fee: Amount,

    /// Amount refunded by the whole batch.
    pub total_refund: Amount,

    /// One pay-to-sender output per refunded transaction, in batch order.
    pub refund_outputs: Vec<TxOut>,

    /// Transactions materializing VM-side value movement, in batch order.
    pub transfers: Vec<LedgerTransaction>,
}

impl BatchSettlement {
    /// Folds a transaction's charge into the totals, adding a refund output when there is
    /// something to refund.
    pub(crate) fn record(&mut self, charge: &GasCharge, refund_output: Option<TxOut>) {
        self.total_gas_used = self.total_gas_used.saturating_add(charge.gas_used);
        self.total_fee = self.total_fee.saturating_add(charge.fee);
        self.total_refund = self.total_refund.saturating_add(charge.refund);
        self.refund_outputs.extend(refund_output);
    }
}

/// Everything a batch execution produced: one result per input transaction, by position,
/// and the settlement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedBatch {
    /// Per-transaction results.
    pub results: Vec<TxResult>,
    /// The batch settlement.
    pub settlement: BatchSettlement,
}

impl ExecutedBatch {
    /// The execution outcomes, in batch order.
    pub fn outcomes(&self) -> impl Iterator<Item = &ExecutionOutcome> {
        self.results.iter().map(|result| &result.outcome)
    }

    /// Number of executed transactions.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the batch was empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// What the `execute` command reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Per-transaction results and the settlement.
    #[serde(flatten)]
    pub executed: ExecutedBatch,

    /// Digest of the VM state after the batch.
    pub state_root: B256,
}
