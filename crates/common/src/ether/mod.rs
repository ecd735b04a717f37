/// Deterministic contract address derivation.
pub mod address;
