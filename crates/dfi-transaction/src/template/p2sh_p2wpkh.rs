//! P2WPKH nested in P2SH.
//!
//! The unlocking script pushes the redeem script `0014{pkh}`; the witness
//! is the same `[sig, pubkey]` as native P2WPKH.

use dfi_primitives::ec::PrivateKey;
use dfi_primitives::hash::hash160;
use dfi_script::Script;

use crate::template::p2wpkh::{self, P2WPKH};
use crate::template::{Unlock, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Redeem script `OP_0 <pkh>` committed to by the P2SH output.
pub fn redeem_script(private_key: &PrivateKey) -> Result<Script, TransactionError> {
    p2wpkh::lock(private_key)
}

/// Locking script `OP_HASH160 <hash160(redeem)> OP_EQUAL`.
pub fn lock(private_key: &PrivateKey) -> Result<Script, TransactionError> {
    let redeem = redeem_script(private_key)?;
    Ok(Script::p2sh(&hash160(redeem.to_bytes())))
}

pub fn unlock(private_key: PrivateKey, sighash_flag: Option<u32>) -> P2SHP2WPKH {
    P2SHP2WPKH { inner: p2wpkh::unlock(private_key, sighash_flag) }
}

pub struct P2SHP2WPKH {
    inner: P2WPKH,
}

impl UnlockingScriptTemplate for P2SHP2WPKH {
    fn sign(&self, tx: &Transaction, input_index: u32) -> Result<Unlock, TransactionError> {
        let witness = self.inner.witness(tx, input_index)?;
        let redeem = Script::witness_v0(&hash160(&witness[1]))?;
        let mut script = Script::new();
        script.append_push_data(redeem.to_bytes())?;
        Ok(Unlock { unlocking_script: Some(script), witness })
    }
}
