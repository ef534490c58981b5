//! Pay-to-Public-Key-Hash (P2PKH) template.
//!
//! Locking script: `OP_DUP OP_HASH160 <pkh> OP_EQUALVERIFY OP_CHECKSIG`.
//! Unlocking script: `<DER sig || sighash byte> <compressed pubkey>`,
//! signed with the legacy digest.

use dfi_primitives::ec::PrivateKey;
use dfi_script::Script;

use crate::sighash::SIGHASH_ALL;
use crate::template::{check_input, signature_with_flag, Unlock, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Locking script paying to `private_key`'s P2PKH address.
pub fn lock(private_key: &PrivateKey) -> Script {
    Script::p2pkh(&private_key.pub_key().hash160())
}

/// Create a P2PKH unlocker. The flag defaults to `SIGHASH_ALL`.
pub fn unlock(private_key: PrivateKey, sighash_flag: Option<u32>) -> P2PKH {
    P2PKH { private_key, sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL) }
}

pub struct P2PKH {
    private_key: PrivateKey,
    sighash_flag: u32,
}

impl UnlockingScriptTemplate for P2PKH {
    fn sign(&self, tx: &Transaction, input_index: u32) -> Result<Unlock, TransactionError> {
        let idx = check_input(tx, input_index)?;
        let sig_hash = tx.calc_legacy_signature_hash(idx, self.sighash_flag)?;
        let sig = signature_with_flag(&self.private_key, &sig_hash, self.sighash_flag)?;

        let mut script = Script::new();
        script.append_push_data(&sig)?;
        script.append_push_data(&self.private_key.pub_key().to_compressed())?;

        Ok(Unlock { unlocking_script: Some(script), witness: Vec::new() })
    }
}
