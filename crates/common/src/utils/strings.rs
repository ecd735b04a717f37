use eyre::{eyre, Result};
use std::fmt::Write;

/// Decodes a hex string into a vector of bytes. A leading `0x` is optional.
///
/// ```
/// use ledgervm_common::utils::strings::decode_hex;
///
/// assert_eq!(decode_hex("0x41c0e1b5").expect("should decode hex"), vec![0x41, 0xc0, 0xe1, 0xb5]);
/// assert!(decode_hex("abc").is_err());
/// ```
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim().trim_start_matches("0x");

    if s.len() % 2 != 0 {
        return Err(eyre!("invalid hex string: odd length {}", s.len()));
    }

    (0..s.len())
        .step_by(2)
        .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| eyre!("invalid hex string: {}", s))
}

/// Encodes a slice of bytes into a lowercase hex string, without prefix.
///
/// ```
/// use ledgervm_common::utils::strings::encode_hex;
///
/// assert_eq!(encode_hex(&[0x60, 0x60, 0x40]), "606040");
/// ```
pub fn encode_hex(s: &[u8]) -> String {
    s.iter().fold(String::with_capacity(s.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
