//! Unlocking templates for the supported spend types.
//!
//! A template holds a signing key and a sighash flag and, given a
//! transaction and input index, produces the input's unlocking script and
//! witness stack.

pub mod p2pkh;
pub mod p2wpkh;
pub mod p2sh_p2wpkh;

use dfi_primitives::ec::PrivateKey;
use dfi_script::Script;

use crate::transaction::Transaction;
use crate::TransactionError;

/// The data that satisfies an input's locking script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Unlock {
    /// Script placed in the input; `None` for native segwit spends.
    pub unlocking_script: Option<Script>,
    /// Witness stack; empty for legacy spends.
    pub witness: Vec<Vec<u8>>,
}

/// Trait for templates that produce unlocking data.
pub trait UnlockingScriptTemplate {
    /// Produce the unlocking data for the given input.
    ///
    /// # Arguments
    /// * `tx` - The transaction being signed.
    /// * `input_index` - The index of the input to sign.
    fn sign(&self, tx: &Transaction, input_index: u32) -> Result<Unlock, TransactionError>;
}

/// Sign `digest` and append the sighash byte, as pushed in scripts and
/// witnesses.
pub(crate) fn signature_with_flag(
    key: &PrivateKey,
    digest: &[u8; 32],
    sighash_flag: u32,
) -> Result<Vec<u8>, TransactionError> {
    let der = key.sign(digest)?.to_der();
    let mut sig = Vec::with_capacity(der.len() + 1);
    sig.extend_from_slice(&der);
    sig.push(sighash_flag as u8);
    Ok(sig)
}

pub(crate) fn check_input(tx: &Transaction, input_index: u32) -> Result<usize, TransactionError> {
    let idx = input_index as usize;
    let input = tx.inputs.get(idx).ok_or_else(|| {
        TransactionError::SigningError(format!(
            "input index {} out of range (tx has {} inputs)",
            idx,
            tx.inputs.len()
        ))
    })?;
    if input.source_tx_output().is_none() {
        return Err(TransactionError::SigningError(format!(
            "missing source output on input {}",
            idx
        )));
    }
    Ok(idx)
}
