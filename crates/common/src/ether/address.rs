//! Contract address derivation.
//!
//! Top-level creations are addressed by the ledger output that carried them, so two ledger
//! transactions can never race for the same address. Creations performed by contract code use
//! the account-model rule over the creator and its creation counter.

use alloy::primitives::{keccak256, Address, B256};

/// Derives the address of a contract created by a top-level transaction.
///
/// The address is the low 20 bytes of `keccak256(origin_hash ‖ output_index)`, with the
/// output index encoded as a little-endian `u32`.
///
/// ```
/// use alloy::primitives::B256;
/// use ledgervm_common::ether::address::contract_address;
///
/// let hash = B256::repeat_byte(0xaa);
/// assert_eq!(contract_address(&hash, 0), contract_address(&hash, 0));
/// assert_ne!(contract_address(&hash, 0), contract_address(&hash, 1));
/// ```
pub fn contract_address(origin_hash: &B256, output_index: u32) -> Address {
    let mut preimage = [0u8; 36];
    preimage[..32].copy_from_slice(origin_hash.as_slice());
    preimage[32..].copy_from_slice(&output_index.to_le_bytes());

    Address::from_word(keccak256(preimage))
}

/// Derives the address of a contract created by `creator` while executing, given the
/// creator's creation counter at the time of the call.
pub fn nested_contract_address(creator: &Address, nonce: u64) -> Address {
    creator.create(nonce)
}
