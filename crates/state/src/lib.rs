//! The VM State Store: the account set (balances, code, storage, custody coins) that every
//! VM execution in a process reads and mutates.
//!
//! The store is an explicitly owned value. Callers thread `&mut VmState` through execution, so
//! exclusive access during a batch is enforced by the borrow checker rather than by a lock.
//! Mutations are journaled: [`VmState::checkpoint`] opens a frame, [`VmState::revert`] undoes
//! everything since the matching checkpoint, and [`VmState::commit`] folds the frame into its
//! parent.

/// Error types for the state module
pub mod error;

mod account;
mod state;

pub use account::Account;
pub use error::Error;
pub use state::VmState;
