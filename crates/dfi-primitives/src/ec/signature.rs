//! ECDSA signatures over secp256k1.
//!
//! Signing is deterministic (RFC 6979) and always returns the low-S form,
//! which is the only form accepted for relay. Signatures travel in DER.

use k256::ecdsa;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// An ECDSA signature `(r, s)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature(ecdsa::Signature);

impl Signature {
    /// Sign a 32-byte digest.
    ///
    /// # Arguments
    /// * `hash` - The sighash digest.
    /// * `priv_key` - The signing key.
    ///
    /// # Returns
    /// A low-S signature, or an error if `hash` is not 32 bytes.
    pub fn sign(hash: &[u8], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        if hash.len() != 32 {
            return Err(PrimitivesError::InvalidSignature(format!(
                "digest must be 32 bytes, got {}",
                hash.len()
            )));
        }
        let sig: ecdsa::Signature = priv_key.signing_key().sign_prehash(hash)?;
        Ok(Signature(sig.normalize_s().unwrap_or(sig)))
    }

    /// Verify against a 32-byte digest and public key.
    pub fn verify(&self, hash: &[u8], pub_key: &PublicKey) -> bool {
        pub_key.verifying_key().verify_prehash(hash, &self.0).is_ok()
    }

    /// Parse a strict DER encoding.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        Ok(Signature(ecdsa::Signature::from_der(bytes)?))
    }

    /// DER encoding, without the trailing sighash byte.
    pub fn to_der(&self) -> Vec<u8> {
        self.0.to_der().as_bytes().to_vec()
    }

    /// Whether `s` is at most half the curve order.
    pub fn is_low_s(&self) -> bool {
        self.0.normalize_s().is_none()
    }

    pub fn r(&self) -> [u8; 32] {
        self.0.r().to_bytes().into()
    }

    pub fn s(&self) -> [u8; 32] {
        self.0.s().to_bytes().into()
    }
}
