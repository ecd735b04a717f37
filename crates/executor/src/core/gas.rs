use alloy::primitives::U256;
use ledgervm_common::ledger::Amount;
use ledgervm_config::ChainParams;
use tracing::warn;

use crate::{
    error::Error,
    interfaces::{GasCharge, TransactionException, VmTransaction},
};

/// Converts VM gas accounting into ledger amounts.
///
/// Every transaction prepays `gas_limit × gas_price / gas_price_divisor`. Whatever is not
/// refunded is fee, so `fee + refund` always equals the prepaid amount.
#[derive(Clone, Debug, Default)]
pub struct GasAccountant {
    params: ChainParams,
}

impl GasAccountant {
    /// Creates a new [`GasAccountant`], rejecting parameters it cannot charge with.
    pub fn new(params: ChainParams) -> Result<Self, Error> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The parameters this accountant charges with.
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// The gas a transaction costs before any code runs.
    pub fn intrinsic_gas(&self, tx: &VmTransaction) -> u64 {
        let base = if tx.is_creation() { self.params.tx_create_gas } else { self.params.tx_gas };

        tx.data.iter().fold(base, |gas, byte| {
            gas.saturating_add(if *byte == 0 {
                self.params.tx_data_zero_gas
            } else {
                self.params.tx_data_non_zero_gas
            })
        })
    }

    /// Checks that the gas limit covers the intrinsic cost, returning that cost.
    pub fn check_intrinsic(&self, tx: &VmTransaction) -> Result<u64, TransactionException> {
        let intrinsic = self.intrinsic_gas(tx);
        if tx.gas_limit < U256::from(intrinsic) {
            return Err(TransactionException::OutOfGasBase);
        }
        Ok(intrinsic)
    }

    /// The amount the sender paid up front for gas.
    pub fn prepaid(&self, tx: &VmTransaction) -> Result<Amount, Error> {
        self.gas_to_amount(tx.gas_limit, tx.gas_price)
    }

    /// Charges `gas_used` and refunds the unused remainder. Refunds below the dust threshold
    /// are kept as fee.
    pub fn settle(&self, tx: &VmTransaction, gas_used: u64) -> Result<GasCharge, Error> {
        let prepaid = self.prepaid(tx)?;
        let unused = tx.gas_limit.saturating_sub(U256::from(gas_used));

        let mut refund = self.gas_to_amount(unused, tx.gas_price)?;
        if refund < self.params.min_refund {
            refund = 0;
        }

        Ok(GasCharge { gas_used, fee: prepaid - refund, refund })
    }

    /// Charges the whole gas limit.
    pub fn forfeit(&self, tx: &VmTransaction) -> Result<GasCharge, Error> {
        let prepaid = self.prepaid(tx)?;
        Ok(GasCharge { gas_used: self.gas_limit(tx)?, fee: prepaid, refund: 0 })
    }

    /// Keeps the whole prepaid amount while reporting `gas_used`, as for interpreter faults.
    pub fn charge_fault(&self, tx: &VmTransaction, gas_used: u64) -> Result<GasCharge, Error> {
        let prepaid = self.prepaid(tx)?;
        Ok(GasCharge { gas_used, fee: prepaid, refund: 0 })
    }

    /// Charges nothing and refunds the whole prepaid amount, for transactions the batch had no
    /// room for.
    pub fn release(&self, tx: &VmTransaction) -> Result<GasCharge, Error> {
        self.settle(tx, 0)
    }

    /// The gas limit as a machine integer.
    pub fn gas_limit(&self, tx: &VmTransaction) -> Result<u64, Error> {
        u64::try_from(tx.gas_limit).map_err(|_| Error::AmountOverflow(tx.gas_limit))
    }

    /// Brings an interpreter-reported gas figure into `[intrinsic, gas_limit]`.
    pub fn clamp_gas_used(&self, tx: &VmTransaction, reported: u64) -> Result<u64, Error> {
        let limit = self.gas_limit(tx)?;
        let floor = self.intrinsic_gas(tx).min(limit);
        let gas_used = reported.clamp(floor, limit);

        if gas_used != reported {
            warn!(reported, gas_used, limit, "interpreter reported gas outside of the chargeable range");
        }
        Ok(gas_used)
    }

    fn gas_to_amount(&self, gas: U256, gas_price: U256) -> Result<Amount, Error> {
        let scaled = gas
            .checked_mul(gas_price)
            .ok_or(Error::AmountOverflow(U256::MAX))?
            / U256::from(self.params.gas_price_divisor);

        to_amount(scaled)
    }
}

/// Converts a VM quantity into a ledger amount.
pub(crate) fn to_amount(value: U256) -> Result<Amount, Error> {
    u64::try_from(value).map_err(|_| Error::AmountOverflow(value))
}
