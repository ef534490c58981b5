//! Hash function primitives.
//!
//! DeFiChain inherits Bitcoin's hashing: SHA-256d for transaction IDs and
//! sighash digests, Hash160 for key and script hashes in addresses.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute double SHA-256: SHA-256(SHA-256(data)).
///
/// Used for transaction IDs, Base58Check checksums, and signature digests.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute the RIPEMD-160 hash of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// Compute Hash160: RIPEMD-160(SHA-256(data)).
///
/// This is the 20-byte digest carried by P2PKH, P2SH, and P2WPKH
/// locking scripts.
///
/// # Arguments
/// * `data` - Byte slice to hash, typically a compressed public key or a
///   redeem script.
///
/// # Returns
/// A 20-byte Hash160 digest.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}
