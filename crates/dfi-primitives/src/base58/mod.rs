//! Base58Check encoding for legacy addresses and WIF keys.
//!
//! A Base58Check string is `base58(version || payload || checksum)`, where
//! the checksum is the first four bytes of SHA-256d over the version and
//! payload.

use crate::hash::sha256d;
use crate::PrimitivesError;

const CHECKSUM_LEN: usize = 4;

/// Encode raw bytes with the Bitcoin alphabet.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).with_alphabet(bs58::Alphabet::BITCOIN).into_string()
}

/// Decode a Base58 string with the Bitcoin alphabet.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))
}

/// Encode `version || payload` with a trailing checksum.
pub fn check_encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = sha256d(&data);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    encode(&data)
}

/// Decode a Base58Check string and verify its checksum.
///
/// # Returns
/// The version byte and the payload that follows it, or
/// `ChecksumMismatch` / `InvalidBase58` on malformed input.
pub fn check_decode(s: &str) -> Result<(u8, Vec<u8>), PrimitivesError> {
    let decoded = decode(s)?;
    if decoded.len() < 1 + CHECKSUM_LEN {
        return Err(PrimitivesError::InvalidBase58(
            "data too short for version and checksum".to_string(),
        ));
    }
    let (data, checksum) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    if sha256d(data)[..CHECKSUM_LEN] != *checksum {
        return Err(PrimitivesError::ChecksumMismatch);
    }
    Ok((data[0], data[1..].to_vec()))
}
