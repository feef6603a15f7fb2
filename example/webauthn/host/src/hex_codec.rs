//! Hex text in, byte buffers out, and the big-endian hex rendering used for keys
//! and signatures.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("no hex digits given")]
    Empty,
    #[error("odd number of hex digits: {0}")]
    OddLength(usize),
    #[error("invalid hex digit {c:?} at position {index}")]
    InvalidDigit { c: char, index: usize },
}

/// Decodes pairs of hex digits, either case, into bytes.
pub fn decode(input: &str) -> Result<Vec<u8>, HexError> {
    if input.is_empty() {
        return Err(HexError::Empty);
    }
    // rejected before anything is allocated
    if input.len() % 2 != 0 {
        return Err(HexError::OddLength(input.len()));
    }

    hex::decode(input).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => HexError::InvalidDigit { c, index },
        _ => HexError::OddLength(input.len()),
    })
}

/// Lowercase hex of `bytes`, in the order given.
pub fn encode_be_bytes(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Eight lowercase hex digits per limb, most significant limb first, for limbs
/// stored least significant first.
pub fn encode_be_limbs(limbs: &[u32]) -> String {
    limbs
        .iter()
        .rev()
        .map(|limb| format!("{:08x}", limb))
        .collect()
}
