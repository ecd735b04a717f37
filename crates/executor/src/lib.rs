//! The Execution Orchestrator of ledgervm.
//!
//! Runs ordered batches of VM transactions against a [`VmState`](ledgervm_state::VmState) and
//! reconciles the VM's account and gas model with the ledger's output model: per-transaction
//! outcomes, gas fees and refunds, and the synthetic transactions that move ledger funds
//! whenever execution moved VM balances.
//!
//! The bytecode interpreter is external and plugged in through the [`Interpreter`] trait.

/// Error types for the executor module
pub mod error;

mod core;
mod interfaces;
pub mod replay;

// re-export the public interface
pub use crate::core::{batch::BatchExecutor, execute, gas::GasAccountant};
pub use error::Error;
pub use interfaces::*;
