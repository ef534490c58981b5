//! secp256k1 private keys.
//!
//! Keys are accepted as raw 32-byte scalars, hex, or WIF. They are held in
//! memory only for signing and are never persisted by this SDK.

use std::fmt;

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::base58;
use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::PrimitivesError;

/// Length of a private key scalar.
pub const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// Trailing WIF byte marking a key whose public key is used compressed.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 signing key.
///
/// The inner `SigningKey` zeroizes its scalar on drop.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a new random key from the OS RNG.
    pub fn new() -> Self {
        PrivateKey { inner: SigningKey::random(&mut OsRng) }
    }

    /// Create a key from a 32-byte big-endian scalar.
    ///
    /// Fails if the slice has the wrong length or the scalar is zero or not
    /// below the curve order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner })
    }

    /// Create a key from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        let mut bytes = hex::decode(hex_str)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Decode a WIF string, returning the key and its network prefix byte.
    ///
    /// Both compressed (34-byte payload) and uncompressed (33-byte payload)
    /// encodings are accepted; the checksum is always verified.
    pub fn from_wif_with_prefix(wif: &str) -> Result<(Self, u8), PrimitivesError> {
        let (prefix, mut payload) = base58::check_decode(wif).map_err(|e| match e {
            PrimitivesError::ChecksumMismatch => e,
            other => PrimitivesError::InvalidWif(other.to_string()),
        })?;
        let key = match payload.len() {
            33 if payload[32] == COMPRESS_MAGIC => {
                Self::from_bytes(&payload[..PRIVATE_KEY_BYTES_LEN])
            }
            33 => Err(PrimitivesError::InvalidWif(
                "malformed private key: invalid compression flag".to_string(),
            )),
            32 => Self::from_bytes(&payload),
            n => Err(PrimitivesError::InvalidWif(format!(
                "malformed private key: invalid payload length {}",
                n
            ))),
        };
        payload.zeroize();
        Ok((key?, prefix))
    }

    /// Decode a WIF string, ignoring which network it was encoded for.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        Self::from_wif_with_prefix(wif).map(|(key, _)| key)
    }

    /// Encode as a compressed WIF string with the given network prefix
    /// (0x80 mainnet, 0xef testnet and regtest).
    pub fn to_wif(&self, prefix: u8) -> String {
        let mut payload = Vec::with_capacity(PRIVATE_KEY_BYTES_LEN + 1);
        payload.extend_from_slice(&self.to_bytes());
        payload.push(COMPRESS_MAGIC);
        let wif = base58::check_encode(prefix, &payload);
        payload.zeroize();
        wif
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_BYTES_LEN] {
        self.inner.to_bytes().into()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the matching public key.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(*self.inner.verifying_key())
    }

    /// Sign a 32-byte digest with RFC 6979 nonces and a low-S result.
    pub fn sign(&self, hash: &[u8]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pub_key", &self.pub_key().to_hex())
            .finish()
    }
}
