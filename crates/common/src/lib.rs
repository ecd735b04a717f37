//! Common utilities, constants, and types used across the ledgervm codebase.
//!
//! This crate provides the shared vocabulary of the executor: VM primitives, the contract
//! address deriver, the ledger-side transaction model that VM settlements are expressed in,
//! and small hex/file helpers.

/// Constants used throughout the ledgervm codebase.
pub mod constants;

/// VM-side helpers, including contract address derivation.
pub mod ether;

/// Ledger-side types: amounts, outpoints, scripts and transactions.
pub mod ledger;

/// General utility functions and types for common tasks.
pub mod utils;
