//! Script opcodes and identifiers shared by the ledger encoders.

/// Push the next 20 bytes.
pub const OP_PUSHBYTES_20: u8 = 0x14;
/// Push an empty byte string.
pub const OP_0: u8 = 0x00;
/// Push the next byte.
pub const OP_PUSHBYTES_1: u8 = 0x01;
/// Duplicate the top stack item.
pub const OP_DUP: u8 = 0x76;
/// RIPEMD160(SHA256(x)) of the top stack item.
pub const OP_HASH160: u8 = 0xa9;
/// Equality check that aborts the script on mismatch.
pub const OP_EQUALVERIFY: u8 = 0x88;
/// Signature check against the top public key.
pub const OP_CHECKSIG: u8 = 0xac;
/// Spends an output held in contract custody.
pub const OP_SPEND: u8 = 0xc1;
/// Marks an output as held in custody by a contract.
pub const OP_CALL: u8 = 0xc2;

/// The VM version tag carried in custody scripts.
pub const VM_VERSION: u8 = 0x04;

/// The version used for condensing transactions.
pub const TRANSFER_TX_VERSION: i32 = 2;
