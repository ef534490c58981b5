//! Transaction signer.
//!
//! Matches each input to one of the supplied keys by comparing the
//! input's source locking script with the P2PKH, P2WPKH, and P2SH-P2WPKH
//! scripts derived from each key, then signs with the matching template.
//! Only the inputs' unlocking scripts and witnesses are modified.

use tracing::debug;

use dfi_primitives::ec::PrivateKey;
use dfi_primitives::hash::hash160;
use dfi_script::Script;

use crate::sighash::SIGHASH_ALL;
use crate::template::{p2pkh, p2sh_p2wpkh, p2wpkh, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// The spend type an input's source script requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpendKind {
    P2pkh,
    P2wpkh,
    P2shP2wpkh,
}

/// Determine whether `key` can spend `script`, and how.
pub fn spend_kind(key: &PrivateKey, script: &Script) -> Option<SpendKind> {
    let pkh = key.pub_key().hash160();
    if *script == Script::p2pkh(&pkh) {
        return Some(SpendKind::P2pkh);
    }
    let redeem = Script::witness_v0(&pkh).ok()?;
    if *script == redeem {
        Some(SpendKind::P2wpkh)
    } else if *script == Script::p2sh(&hash160(redeem.to_bytes())) {
        Some(SpendKind::P2shP2wpkh)
    } else {
        None
    }
}

fn template_for(
    key: &PrivateKey,
    kind: SpendKind,
    sighash_flag: u32,
) -> Box<dyn UnlockingScriptTemplate> {
    let key = key.clone();
    match kind {
        SpendKind::P2pkh => Box::new(p2pkh::unlock(key, Some(sighash_flag))),
        SpendKind::P2wpkh => Box::new(p2wpkh::unlock(key, Some(sighash_flag))),
        SpendKind::P2shP2wpkh => Box::new(p2sh_p2wpkh::unlock(key, Some(sighash_flag))),
    }
}

/// Sign every input with SIGHASH_ALL.
pub fn sign(tx: &mut Transaction, keys: &[PrivateKey]) -> Result<(), TransactionError> {
    sign_with_flag(tx, keys, SIGHASH_ALL)
}

/// Sign every input with the given sighash flag.
///
/// Fails with `SigningError` if an input has no source output or no key
/// matches its source locking script. On failure, inputs signed before the
/// failing one keep their new unlocking data.
pub fn sign_with_flag(
    tx: &mut Transaction,
    keys: &[PrivateKey],
    sighash_flag: u32,
) -> Result<(), TransactionError> {
    for idx in 0..tx.inputs.len() {
        let input = &tx.inputs[idx];
        let script = input.source_tx_script().ok_or_else(|| {
            TransactionError::SigningError(format!("missing source output on input {}", idx))
        })?;

        let (key, kind) = keys
            .iter()
            .find_map(|k| spend_kind(k, script).map(|kind| (k, kind)))
            .ok_or_else(|| {
                TransactionError::SigningError(format!(
                    "no key matches input {} ({}:{}, script {})",
                    idx,
                    input.source_txid_hex(),
                    input.source_tx_out_index,
                    script
                ))
            })?;

        let unlock = template_for(key, kind, sighash_flag).sign(tx, idx as u32)?;
        debug!(input = idx, ?kind, "signed input");

        let input = &mut tx.inputs[idx];
        input.unlocking_script = unlock.unlocking_script;
        input.witness = unlock.witness;
    }
    Ok(())
}
