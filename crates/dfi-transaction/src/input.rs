//! Transaction input referencing a previous output.
//!
//! Carries the outpoint, the unlocking script and witness stack (both
//! empty until signed), the sequence number, and a local copy of the
//! output being spent, which signing needs for the script code and value.

use dfi_primitives::chainhash::Hash;
use dfi_primitives::util::{DfiReader, DfiWriter, VarInt};
use dfi_script::Script;

use crate::output::TransactionOutput;
use crate::TransactionError;

/// Default sequence number: final, no relative lock-time.
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// A single input in a DeFiChain transaction.
///
/// # Wire format
///
/// | Field              | Size           |
/// |--------------------|----------------|
/// | source_txid        | 32 bytes       |
/// | source_tx_out_index| 4 bytes (LE)   |
/// | script length      | VarInt         |
/// | unlocking_script   | variable       |
/// | sequence_number    | 4 bytes (LE)   |
///
/// The witness stack is serialized separately, after all outputs, in the
/// segwit encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInput {
    /// Txid of the output being spent, in internal byte order.
    pub source_txid: [u8; 32],

    pub source_tx_out_index: u32,

    pub sequence_number: u32,

    /// `None` until the input is signed.
    pub unlocking_script: Option<Script>,

    /// Witness stack; empty for legacy spends and before signing.
    pub witness: Vec<Vec<u8>>,

    /// The output being spent. Local only, never serialized.
    source_output: Option<TransactionOutput>,
}

impl TransactionInput {
    pub fn new() -> Self {
        TransactionInput {
            source_txid: [0u8; 32],
            source_tx_out_index: 0,
            sequence_number: DEFAULT_SEQUENCE_NUMBER,
            unlocking_script: None,
            witness: Vec::new(),
            source_output: None,
        }
    }

    /// An unsigned input spending `vout` of `txid`, remembering the spent
    /// output for signing.
    pub fn spending(txid: Hash, vout: u32, source_output: TransactionOutput) -> Self {
        TransactionInput {
            source_txid: *txid.as_bytes(),
            source_tx_out_index: vout,
            source_output: Some(source_output),
            ..Self::new()
        }
    }

    /// Deserialize the non-witness part of an input.
    pub fn read_from(reader: &mut DfiReader) -> Result<Self, TransactionError> {
        let source_txid = reader.read_array::<32>().map_err(|e| {
            TransactionError::SerializationError(format!("reading source txid: {}", e))
        })?;

        let source_tx_out_index = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading output index: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;

        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading unlocking script: {}", e))
        })?;

        let sequence_number = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence number: {}", e))
        })?;

        let unlocking_script =
            if script_bytes.is_empty() { None } else { Some(Script::from_bytes(script_bytes)) };

        Ok(TransactionInput {
            source_txid,
            source_tx_out_index,
            sequence_number,
            unlocking_script,
            ..Self::new()
        })
    }

    /// Read this input's witness stack.
    pub fn read_witness_from(&mut self, reader: &mut DfiReader) -> Result<(), TransactionError> {
        let items = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading witness count: {}", e))
        })?;
        let mut witness = Vec::new();
        for _ in 0..items.value() {
            let len = reader.read_varint().map_err(|e| {
                TransactionError::SerializationError(format!("reading witness item length: {}", e))
            })?;
            let item = reader.read_bytes(len.value() as usize).map_err(|e| {
                TransactionError::SerializationError(format!("reading witness item: {}", e))
            })?;
            witness.push(item.to_vec());
        }
        self.witness = witness;
        Ok(())
    }

    /// Serialize the non-witness part of this input.
    pub fn write_to(&self, writer: &mut DfiWriter) {
        writer.write_bytes(&self.source_txid);
        writer.write_u32_le(self.source_tx_out_index);
        match &self.unlocking_script {
            Some(script) => writer.write_var_bytes(script.to_bytes()),
            None => writer.write_varint(VarInt(0)),
        }
        writer.write_u32_le(self.sequence_number);
    }

    /// Serialize this input's witness stack.
    pub fn write_witness_to(&self, writer: &mut DfiWriter) {
        writer.write_varint(VarInt::from(self.witness.len()));
        for item in &self.witness {
            writer.write_var_bytes(item);
        }
    }

    pub fn set_source_output(&mut self, output: Option<TransactionOutput>) {
        self.source_output = output;
    }

    pub fn source_tx_output(&self) -> Option<&TransactionOutput> {
        self.source_output.as_ref()
    }

    pub fn source_tx_value(&self) -> Option<u64> {
        self.source_output.as_ref().map(|o| o.value)
    }

    pub fn source_tx_script(&self) -> Option<&Script> {
        self.source_output.as_ref().map(|o| &o.locking_script)
    }

    /// Display-order txid of the output being spent.
    pub fn source_txid_hex(&self) -> String {
        Hash::new(self.source_txid).to_hex()
    }
}

impl Default for TransactionInput {
    fn default() -> Self {
        Self::new()
    }
}
