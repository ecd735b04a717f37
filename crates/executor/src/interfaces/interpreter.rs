use alloy::primitives::Address;
use ledgervm_state::VmState;

use super::{ExecutionOutcome, VmTransaction};

/// The VM interpreter, as consumed by the executor.
///
/// An implementation runs `tx` against `state`, delivering the top-level value from the sender
/// to `target` (the receiver of a call, or the derived address of the contract being created)
/// and installing the returned runtime code on a successful creation. The executor has
/// already credited the sender with the transaction value and opened a checkpoint; the
/// interpreter may leave partial effects behind on failure, they are discarded.
///
/// Nested creations must go through [`VmState::create_contract`] so that addresses are
/// derived from the creator and its nonce. Every value movement besides the top-level delivery
/// must be listed in [`ExecutionOutcome::transfers`].
///
/// Returning `Err` means the interpreter itself failed, which aborts the whole batch.
pub trait Interpreter {
    /// Executes a single transaction.
    fn execute(
        &mut self,
        tx: &VmTransaction,
        target: Address,
        state: &mut VmState,
    ) -> eyre::Result<ExecutionOutcome>;
}

impl<I: Interpreter + ?Sized> Interpreter for &mut I {
    fn execute(
        &mut self,
        tx: &VmTransaction,
        target: Address,
        state: &mut VmState,
    ) -> eyre::Result<ExecutionOutcome> {
        (**self).execute(tx, target, state)
    }
}

impl<I: Interpreter + ?Sized> Interpreter for Box<I> {
    fn execute(
        &mut self,
        tx: &VmTransaction,
        target: Address,
        state: &mut VmState,
    ) -> eyre::Result<ExecutionOutcome> {
        (**self).execute(tx, target, state)
    }
}
