use std::time::Instant;

use alloy::primitives::U256;
use ledgervm_common::ledger::{LedgerTransaction, Script, TxOut};
use ledgervm_config::ChainParams;
use ledgervm_state::VmState;
use tracing::{debug, error, info, trace};

use super::{
    condense::{condense, value_return},
    gas::GasAccountant,
};
use crate::{
    error::Error,
    interfaces::{
        ExecutedBatch, ExecutionOutcome, GasCharge, Interpreter, Status, TransactionException,
        TxResult, VmTransaction,
    },
};

/// Executes batches of VM transactions against a [`VmState`] and settles them into ledger
/// outputs.
///
/// Transactions run strictly in order. Each one runs inside its own state checkpoint, so a
/// failing transaction leaves no trace in the state while the transactions around it are
/// unaffected. Only a collaborator failure (the interpreter erroring, the state rejecting an
/// operation, unbalanced value movement) aborts the batch, in which case every change the
/// batch made is reverted.
#[derive(Debug)]
pub struct BatchExecutor<I> {
    accountant: GasAccountant,
    interpreter: I,
}

impl<I: Interpreter> BatchExecutor<I> {
    /// Creates a new [`BatchExecutor`], rejecting invalid chain parameters.
    pub fn new(params: ChainParams, interpreter: I) -> Result<Self, Error> {
        Ok(Self { accountant: GasAccountant::new(params)?, interpreter })
    }

    /// Executes `batch` against `state`.
    ///
    /// The returned batch holds exactly one [`TxResult`] per input transaction, by position.
    pub fn execute(
        &mut self,
        state: &mut VmState,
        batch: &[VmTransaction],
    ) -> Result<ExecutedBatch, Error> {
        let start_time = Instant::now();
        let base_depth = state.depth();
        state.checkpoint();

        let mut executed = ExecutedBatch::default();
        for (index, tx) in batch.iter().enumerate() {
            let block_gas_used = executed.settlement.total_gas_used;

            let (result, transfer) = match self.execute_transaction(state, index, tx, block_gas_used)
            {
                Ok(done) => done,
                Err(e) => {
                    error!(index, "batch aborted: {}", e);
                    state.revert_to(base_depth);
                    return Err(e);
                }
            };

            let refund_output = (result.charge.refund > 0)
                .then(|| TxOut::new(result.charge.refund, Script::PayToPubKeyHash(tx.sender)));
            executed.settlement.record(&result.charge, refund_output);
            executed.settlement.transfers.extend(transfer);
            executed.results.push(result);
        }
        state.commit()?;

        info!(
            "executed {} transactions ({} applied), {} gas used, {} refunded, {} transfers",
            executed.len(),
            executed.results.iter().filter(|r| r.status == Status::Applied).count(),
            executed.settlement.total_gas_used,
            executed.settlement.total_refund,
            executed.settlement.transfers.len(),
        );
        debug!("batch execution took {:?}", start_time.elapsed());

        Ok(executed)
    }

    fn execute_transaction(
        &mut self,
        state: &mut VmState,
        index: usize,
        tx: &VmTransaction,
        block_gas_used: u64,
    ) -> Result<(TxResult, Option<LedgerTransaction>), Error> {
        // derived once; the interpreter receives it instead of deriving it again
        let target = tx.target();
        let params = self.accountant.params();

        let remaining = params.block_gas_limit.saturating_sub(block_gas_used);
        if tx.gas_limit > U256::from(remaining) {
            debug!(index, gas_limit = %tx.gas_limit, remaining, "block gas limit reached");
            return self.reject(tx, TransactionException::BlockGasLimitReached);
        }

        let intrinsic = match self.accountant.check_intrinsic(tx) {
            Ok(intrinsic) => intrinsic,
            Err(exception) => {
                debug!(index, gas_limit = %tx.gas_limit, "gas limit below intrinsic cost");
                return self.reject(tx, exception);
            }
        };

        if tx.is_creation() && state.is_used(&target) {
            debug!(index, %target, "creation address already used");
            return self.reject(tx, TransactionException::AddressAlreadyUsed);
        }

        trace!(index, %target, intrinsic, creation = tx.is_creation(), "dispatching");
        state.checkpoint();

        // the value-bearing ledger output funds the sender for the duration of the call
        state.add_balance(tx.sender, tx.value);
        let mut outcome =
            self.interpreter.execute(tx, target, state).map_err(Error::Interpreter)?;
        let gas_used = self.accountant.clamp_gas_used(tx, outcome.gas_used)?;

        if outcome.exception.is_none() {
            if tx.is_creation() {
                match outcome.new_address {
                    Some(reported) if reported != target => {
                        return Err(Error::AddressMismatch { derived: target, reported });
                    }
                    _ => outcome.new_address = Some(target),
                }
            } else {
                outcome.new_address = None;
            }
            outcome.gas_used = gas_used;

            let transfer = condense(state, index, tx, target, &outcome.transfers)?;
            state.commit()?;

            let charge = self.accountant.settle(tx, gas_used)?;
            debug!(
                index,
                %target,
                gas_used,
                refund = charge.refund,
                transfers = outcome.transfers.len(),
                "applied"
            );
            return Ok((TxResult { outcome, charge, status: Status::Applied }, transfer));
        }

        state.revert()?;

        let exception = outcome.exception;
        let charge = if exception == TransactionException::OutOfGas {
            self.accountant.forfeit(tx)?
        } else {
            self.accountant.charge_fault(tx, gas_used)?
        };
        debug!(index, %target, %exception, gas_used = charge.gas_used, "reverted");

        Ok((
            TxResult {
                outcome: ExecutionOutcome::failed(exception, charge.gas_used),
                charge,
                status: Status::Reverted,
            },
            value_return(tx)?,
        ))
    }

    /// Rejects a transaction without touching the state.
    fn reject(
        &self,
        tx: &VmTransaction,
        exception: TransactionException,
    ) -> Result<(TxResult, Option<LedgerTransaction>), Error> {
        let charge: GasCharge = match exception {
            TransactionException::BlockGasLimitReached => self.accountant.release(tx)?,
            _ => self.accountant.forfeit(tx)?,
        };

        Ok((
            TxResult {
                outcome: ExecutionOutcome::failed(exception, charge.gas_used),
                charge,
                status: Status::RejectedNoState,
            },
            value_return(tx)?,
        ))
    }
}
