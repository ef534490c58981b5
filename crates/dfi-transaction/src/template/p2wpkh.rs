//! Native segwit v0 key-hash (P2WPKH) template.
//!
//! The unlocking script stays empty; the witness is `[sig, pubkey]` over
//! the BIP-143 digest with script code `76a914{pkh}88ac`.

use dfi_primitives::ec::PrivateKey;
use dfi_script::Script;

use crate::sighash::SIGHASH_ALL;
use crate::template::{check_input, signature_with_flag, Unlock, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Locking script `OP_0 <pkh>` for `private_key`.
pub fn lock(private_key: &PrivateKey) -> Result<Script, TransactionError> {
    Ok(Script::witness_v0(&private_key.pub_key().hash160())?)
}

pub fn unlock(private_key: PrivateKey, sighash_flag: Option<u32>) -> P2WPKH {
    P2WPKH { private_key, sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL) }
}

pub struct P2WPKH {
    private_key: PrivateKey,
    sighash_flag: u32,
}

impl P2WPKH {
    /// Witness stack `[sig, pubkey]` for the input.
    pub(crate) fn witness(
        &self,
        tx: &Transaction,
        input_index: u32,
    ) -> Result<Vec<Vec<u8>>, TransactionError> {
        let idx = check_input(tx, input_index)?;
        let pub_key = self.private_key.pub_key();
        let sig_hash = tx.calc_witness_signature_hash(idx, &pub_key.hash160(), self.sighash_flag)?;
        let sig = signature_with_flag(&self.private_key, &sig_hash, self.sighash_flag)?;
        Ok(vec![sig, pub_key.to_compressed().to_vec()])
    }
}

impl UnlockingScriptTemplate for P2WPKH {
    fn sign(&self, tx: &Transaction, input_index: u32) -> Result<Unlock, TransactionError> {
        Ok(Unlock { unlocking_script: None, witness: self.witness(tx, input_index)? })
    }
}
