/// DeFiChain SDK - Cryptographic primitives, hashing, and binary encoding.
///
/// This crate provides the foundational building blocks for the SDK:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Transaction ID hash type with byte-reversed display
/// - Bitcoin-style CompactSize and base-128 VARINT encoding
/// - Base58Check encoding
/// - secp256k1 private/public keys, WIF, and ECDSA signatures

pub mod hash;
pub mod chainhash;
pub mod util;
pub mod base58;
pub mod ec;

mod error;
pub use error::PrimitivesError;
