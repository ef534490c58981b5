//! Signature hash computation.
//!
//! Two digest algorithms are in use:
//!
//! - the legacy algorithm for P2PKH inputs, which hashes a modified copy
//!   of the whole transaction;
//! - the BIP-143 algorithm for segwit v0 inputs (native P2WPKH and
//!   P2SH-wrapped P2WPKH), which commits to the spent value.
//!
//! Outputs are hashed in their wire encoding, so version 4 transactions
//! commit to each output's token id.
//!
//! See <https://github.com/bitcoin/bips/blob/master/bip-0143.mediawiki>

use dfi_primitives::hash::sha256d;
use dfi_primitives::util::{DfiWriter, VarInt};

use crate::output::TransactionOutput;
use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: sign only the current input.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask applied to extract the base type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

/// Digest returned by the legacy algorithm for SIGHASH_SINGLE without a
/// matching output: the integer one, little-endian.
pub const SIGHASH_SINGLE_BUG: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

fn check_index(tx: &Transaction, input_index: usize) -> Result<(), TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Legacy signature hash
// -----------------------------------------------------------------------

/// Compute the legacy signature hash for `input_index`.
///
/// The digest is SHA-256d over a copy of the transaction in which every
/// unlocking script is empty except the signed input's, which is replaced
/// by `script_code`, followed by the sighash type as u32 LE. NONE drops all
/// outputs, SINGLE keeps outputs up to the signed index (earlier ones
/// nulled), and both zero the other inputs' sequence numbers.
/// ANYONECANPAY keeps only the signed input.
pub fn legacy_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    sighash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    check_index(tx, input_index)?;
    let base_type = sighash_type & SIGHASH_MASK;

    if base_type == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        return Ok(SIGHASH_SINGLE_BUG);
    }

    let mut copy = Transaction {
        version: tx.version,
        inputs: tx.inputs.clone(),
        outputs: tx.outputs.clone(),
        lock_time: tx.lock_time,
    };

    for (i, input) in copy.inputs.iter_mut().enumerate() {
        input.witness.clear();
        input.unlocking_script = if i == input_index {
            Some(dfi_script::Script::from_bytes(script_code))
        } else {
            None
        };
        if i != input_index && (base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE) {
            input.sequence_number = 0;
        }
    }

    match base_type {
        SIGHASH_NONE => copy.outputs.clear(),
        SIGHASH_SINGLE => {
            copy.outputs.truncate(input_index + 1);
            for output in copy.outputs.iter_mut().take(input_index) {
                *output = TransactionOutput::null();
            }
        }
        _ => {}
    }

    if sighash_type & SIGHASH_ANYONECANPAY != 0 {
        let signed = copy.inputs.swap_remove(input_index);
        copy.inputs = vec![signed];
    }

    let mut preimage = copy.to_bytes_legacy();
    preimage.extend_from_slice(&sighash_type.to_le_bytes());
    Ok(sha256d(&preimage))
}

// -----------------------------------------------------------------------
// BIP-143 signature hash
// -----------------------------------------------------------------------

/// Compute the BIP-143 signature hash for a segwit v0 input.
///
/// # Arguments
/// * `tx`           - The transaction being signed.
/// * `input_index`  - Index of the input being signed.
/// * `script_code`  - For P2WPKH, `76a914{pkh}88ac`.
/// * `value`        - Value of the output being spent.
/// * `sighash_type` - The sighash flags.
///
/// # Returns
/// The 32-byte digest to sign.
pub fn witness_v0_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    value: u64,
    sighash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    let preimage = calc_witness_v0_preimage(tx, input_index, script_code, value, sighash_type)?;
    Ok(sha256d(&preimage))
}

/// Build the BIP-143 preimage before hashing.
///
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes)
/// 3. hashSequence (32 bytes)
/// 4. outpoint (32+4 bytes)
/// 5. scriptCode (varint + script)
/// 6. value (8 bytes LE)
/// 7. nSequence (4 bytes LE)
/// 8. hashOutputs (32 bytes)
/// 9. nLocktime (4 bytes LE)
/// 10. sighashType (4 bytes LE)
pub fn calc_witness_v0_preimage(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    value: u64,
    sighash_type: u32,
) -> Result<Vec<u8>, TransactionError> {
    check_index(tx, input_index)?;

    let input = &tx.inputs[input_index];
    let base_type = sighash_type & SIGHASH_MASK;
    let anyone_can_pay = sighash_type & SIGHASH_ANYONECANPAY != 0;

    let hash_prevouts = if !anyone_can_pay { prevouts_hash(tx) } else { [0u8; 32] };

    let hash_sequence =
        if !anyone_can_pay && base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE {
            sequence_hash(tx)
        } else {
            [0u8; 32]
        };

    let hash_outputs = if base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE {
        outputs_hash(tx, None)
    } else if base_type == SIGHASH_SINGLE && input_index < tx.outputs.len() {
        outputs_hash(tx, Some(input_index))
    } else {
        [0u8; 32]
    };

    let mut writer = DfiWriter::with_capacity(256);
    writer.write_u32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    writer.write_bytes(&input.source_txid);
    writer.write_u32_le(input.source_tx_out_index);
    writer.write_varint(VarInt::from(script_code.len()));
    writer.write_bytes(script_code);
    writer.write_u64_le(value);
    writer.write_u32_le(input.sequence_number);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type);

    Ok(writer.into_bytes())
}

fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = DfiWriter::with_capacity(tx.inputs.len() * 36);
    for input in &tx.inputs {
        writer.write_bytes(&input.source_txid);
        writer.write_u32_le(input.source_tx_out_index);
    }
    sha256d(writer.as_bytes())
}

fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = DfiWriter::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

/// SHA-256d of all outputs, or only the output at `single`.
fn outputs_hash(tx: &Transaction, single: Option<usize>) -> [u8; 32] {
    let mut writer = DfiWriter::new();
    match single {
        Some(n) => tx.outputs[n].write_to(&mut writer, tx.version),
        None => {
            for output in &tx.outputs {
                output.write_to(&mut writer, tx.version);
            }
        }
    }
    sha256d(writer.as_bytes())
}
