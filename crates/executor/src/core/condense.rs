//! Turning VM-side value movement into ledger transactions.

use alloy::primitives::Address;
use ledgervm_common::ledger::{Amount, Coin, LedgerTransaction, OutPoint, Script, TxIn, TxOut};
use ledgervm_state::VmState;
use tracing::trace;

use super::gas::to_amount;
use crate::{
    error::Error,
    interfaces::{ValueTransfer, VmTransaction},
};

/// Builds the transaction that moves ledger funds the way an applied VM transaction moved
/// balances, and updates the custody coins of the contracts involved.
///
/// The transaction spends the value-bearing origin output (when the transaction carried value)
/// and the custody coin of every touched contract, and pays every touched account its new
/// balance: contracts through a fresh custody output, code-less accounts through a
/// pay-to-pubkey-hash output. Code-less accounts are swept from the VM state afterwards since
/// their funds now live on the ledger.
///
/// Returns `None` when nothing moved.
pub(crate) fn condense(
    state: &mut VmState,
    index: usize,
    tx: &VmTransaction,
    target: Address,
    transfers: &[ValueTransfer],
) -> Result<Option<LedgerTransaction>, Error> {
    if tx.value.is_zero() && transfers.is_empty() {
        return Ok(None);
    }

    // first-touch order keeps the output layout deterministic
    let mut touched: Vec<Address> = Vec::new();
    let mut touch = |address: Address| {
        if !touched.contains(&address) {
            touched.push(address);
        }
    };
    if !tx.value.is_zero() {
        touch(tx.sender);
        touch(target);
    }
    for transfer in transfers {
        touch(transfer.from);
        touch(transfer.to);
    }

    let mut inputs = Vec::new();
    let mut input_total: Amount = 0;
    if !tx.value.is_zero() {
        inputs.push(TxIn::spend(tx.origin()));
        input_total = to_amount(tx.value)?;
    }
    for address in &touched {
        if let Some(coin) = state.custody(address) {
            inputs.push(TxIn::spend(coin.outpoint));
            input_total = checked_add(input_total, coin.value, index)?;
        }
    }

    let mut outputs = Vec::new();
    let mut custodians = Vec::new();
    let mut swept = Vec::new();
    for address in &touched {
        let balance = state.balance(address);

        if state.is_contract(address) {
            if !balance.is_zero() {
                custodians.push((*address, outputs.len() as u32));
                outputs.push(TxOut::new(to_amount(balance)?, Script::Custody(*address)));
            }
        } else if state.exists(address) {
            if !balance.is_zero() {
                outputs.push(TxOut::new(to_amount(balance)?, Script::PayToPubKeyHash(*address)));
            }
            swept.push(*address);
        }
    }

    let output_total = outputs
        .iter()
        .try_fold(0u64, |total, output| checked_add(total, output.value, index))?;
    if input_total != output_total {
        return Err(Error::UnbalancedTransfer { index, inputs: input_total, outputs: output_total });
    }

    for address in swept {
        state.sweep(address)?;
    }

    if inputs.is_empty() && outputs.is_empty() {
        return Ok(None);
    }

    let transfer = LedgerTransaction::transfer(inputs, outputs);
    let txid = transfer.txid();
    trace!(index, %txid, inputs = transfer.inputs.len(), outputs = transfer.outputs.len(), "built transfer");

    // every touched contract now holds exactly the coin created here, or none at all
    for address in &touched {
        if state.custody(address).is_some() {
            state.set_custody(*address, None)?;
        }
    }
    for (address, vout) in custodians {
        let value = transfer.outputs[vout as usize].value;
        state.set_custody(address, Some(Coin { outpoint: OutPoint::new(txid, vout), value }))?;
    }

    Ok(Some(transfer))
}

/// Hands the value of a transaction that did not apply back to its sender.
pub(crate) fn value_return(tx: &VmTransaction) -> Result<Option<LedgerTransaction>, Error> {
    if tx.value.is_zero() {
        return Ok(None);
    }

    Ok(Some(LedgerTransaction::transfer(
        vec![TxIn::spend(tx.origin())],
        vec![TxOut::new(to_amount(tx.value)?, Script::PayToPubKeyHash(tx.sender))],
    )))
}

fn checked_add(total: Amount, value: Amount, index: usize) -> Result<Amount, Error> {
    total.checked_add(value).ok_or(Error::UnbalancedTransfer { index, inputs: total, outputs: value })
}
