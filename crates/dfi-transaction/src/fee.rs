//! Size-based fee estimation.
//!
//! The fee is computed before signing from the unsigned transaction plus a
//! fixed allowance per input for the P2PKH unlocking script that signing
//! will add:
//!
//! ```text
//! signed_size = unsigned_size + inputs * (1 + 72 + 1 + 33)
//! fee         = round(signed_size * fee_per_byte)
//! ```
//!
//! The estimate is authoritative: the builder deducts exactly this amount.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;
use crate::TransactionError;

/// Estimated unlocking script size per input: push opcode, DER signature
/// with sighash byte (at most 72), push opcode, compressed public key.
pub const ESTIMATED_UNLOCKING_SIZE: usize = 1 + 72 + 1 + 33;

/// A fee rate in smallest units per byte.
///
/// Always finite and non-negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FeeRate(f64);

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate(0.0);

    /// Validate a raw per-byte rate.
    pub fn new(per_byte: f64) -> Result<Self, TransactionError> {
        if !per_byte.is_finite() {
            return Err(TransactionError::FeeError(format!(
                "fee rate must be finite, got {}",
                per_byte
            )));
        }
        if per_byte < 0.0 {
            return Err(TransactionError::FeeError(format!(
                "fee rate must not be negative, got {}",
                per_byte
            )));
        }
        Ok(FeeRate(per_byte))
    }

    /// Convert a node `estimatesmartfee` result (coins per kilobyte) to a
    /// per-byte rate in smallest units.
    pub fn from_coin_per_kb(coin_per_kb: f64) -> Result<Self, TransactionError> {
        Self::new(coin_per_kb * 100_000_000.0 / 1000.0)
    }

    pub fn per_byte(self) -> f64 {
        self.0
    }

    /// Fee for `size` bytes, rounded half away from zero.
    pub fn fee_for_size(self, size: usize) -> u64 {
        (size as f64 * self.0).round() as u64
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        FeeRate::ZERO
    }
}

impl TryFrom<f64> for FeeRate {
    type Error = TransactionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        FeeRate::new(value)
    }
}

impl From<FeeRate> for f64 {
    fn from(rate: FeeRate) -> f64 {
        rate.0
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/byte", self.0)
    }
}

/// Length of the legacy serialization with every unlocking script emptied
/// and no witness data.
pub fn unsigned_size(tx: &Transaction) -> usize {
    let mut unsigned = tx.clone();
    for input in &mut unsigned.inputs {
        input.unlocking_script = None;
        input.witness.clear();
    }
    unsigned.to_bytes_legacy().len()
}

/// Estimated size once every input carries a P2PKH unlocking script.
pub fn signed_size(tx: &Transaction) -> usize {
    unsigned_size(tx) + tx.inputs.len() * ESTIMATED_UNLOCKING_SIZE
}

/// Fee for `tx` at `fee_per_byte`.
pub fn fee(tx: &Transaction, fee_per_byte: FeeRate) -> u64 {
    fee_per_byte.fee_for_size(signed_size(tx))
}
