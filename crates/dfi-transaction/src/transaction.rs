//! Core transaction type.
//!
//! A DeFiChain transaction is a Bitcoin-style transaction whose outputs
//! carry a token id from version 4 on. Transactions with any witness data
//! serialize in the segwit encoding; the txid always covers the legacy
//! (witness-free) encoding.

use dfi_primitives::chainhash::Hash;
use dfi_primitives::util::{DfiReader, DfiWriter, VarInt};
use dfi_script::Script;

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::sighash;
use crate::TransactionError;

/// Version used for newly built transactions.
pub const DEFAULT_TX_VERSION: u32 = 4;

const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

/// A DeFiChain transaction.
///
/// # Wire format
///
/// | Field         | Size                          |
/// |---------------|-------------------------------|
/// | version       | 4 bytes (LE)                  |
/// | marker, flag  | `00 01`, segwit only          |
/// | input count   | VarInt                        |
/// | inputs        | variable                      |
/// | output count  | VarInt                        |
/// | outputs       | variable (token id if v ≥ 4)  |
/// | witnesses     | per input, segwit only        |
/// | lock_time     | 4 bytes (LE)                  |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// Create an empty version 4 transaction with lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: DEFAULT_TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::SerializationError(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse exactly one transaction, rejecting trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = DfiReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Deserialize a transaction in either legacy or segwit encoding.
    pub fn read_from(reader: &mut DfiReader) -> Result<Self, TransactionError> {
        let version = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading version: {}", e))
        })?;

        let mut input_count = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading input count: {}", e))
        })?;

        // A zero input count is the segwit marker; the flag byte follows.
        let segwit = input_count.value() == SEGWIT_MARKER as u64;
        if segwit {
            let flag = reader.read_u8().map_err(|e| {
                TransactionError::SerializationError(format!("reading segwit flag: {}", e))
            })?;
            if flag != SEGWIT_FLAG {
                return Err(TransactionError::SerializationError(format!(
                    "unsupported segwit flag 0x{:02x}",
                    flag
                )));
            }
            input_count = reader.read_varint().map_err(|e| {
                TransactionError::SerializationError(format!("reading input count: {}", e))
            })?;
        }

        let mut inputs = Vec::new();
        for _ in 0..input_count.value() {
            inputs.push(TransactionInput::read_from(reader)?);
        }

        let output_count = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading output count: {}", e))
        })?;

        let mut outputs = Vec::new();
        for _ in 0..output_count.value() {
            outputs.push(TransactionOutput::read_from(reader, version)?);
        }

        if segwit {
            for input in &mut inputs {
                input.read_witness_from(reader)?;
            }
        }

        let lock_time = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading lock time: {}", e))
        })?;

        Ok(Transaction { version, inputs, outputs, lock_time })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Whether any input carries witness data.
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|i| !i.witness.is_empty())
    }

    /// Network serialization: segwit if any input has a witness, legacy
    /// otherwise.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.serialize(self.has_witness())
    }

    /// Legacy serialization, omitting all witness data.
    pub fn to_bytes_legacy(&self) -> Vec<u8> {
        self.serialize(false)
    }

    fn serialize(&self, with_witness: bool) -> Vec<u8> {
        let mut writer = DfiWriter::with_capacity(256);
        writer.write_u32_le(self.version);
        if with_witness {
            writer.write_u8(SEGWIT_MARKER);
            writer.write_u8(SEGWIT_FLAG);
        }

        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(&mut writer);
        }

        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(&mut writer, self.version);
        }

        if with_witness {
            for input in &self.inputs {
                input.write_witness_to(&mut writer);
            }
        }

        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    // -----------------------------------------------------------------
    // Transaction ID
    // -----------------------------------------------------------------

    /// Double SHA-256 of the legacy serialization.
    pub fn tx_id(&self) -> Hash {
        Hash::sha256d(&self.to_bytes_legacy())
    }

    /// Display-order (byte-reversed) txid hex, as the node reports it.
    pub fn tx_id_hex(&self) -> String {
        self.tx_id().to_hex()
    }

    /// Double SHA-256 of the full serialization, witness included.
    pub fn wtx_id(&self) -> Hash {
        Hash::sha256d(&self.to_bytes())
    }

    // -----------------------------------------------------------------
    // Size
    // -----------------------------------------------------------------

    /// Serialized size in bytes, witness included.
    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    /// BIP-141 virtual size: weight / 4, rounded up.
    pub fn vsize(&self) -> usize {
        let base = self.to_bytes_legacy().len();
        let total = self.size();
        (base * 3 + total).div_ceil(4)
    }

    // -----------------------------------------------------------------
    // Inputs and outputs
    // -----------------------------------------------------------------

    pub fn add_input(&mut self, input: TransactionInput) {
        self.inputs.push(input);
    }

    /// Add an unsigned input from UTXO details.
    ///
    /// # Arguments
    /// * `prev_tx_id` - Display-order txid hex of the funding transaction.
    /// * `vout` - Output index being spent.
    /// * `prev_locking_script_hex` - Locking script of the spent output.
    /// * `value` - Value of the spent output.
    pub fn add_input_from(
        &mut self,
        prev_tx_id: &str,
        vout: u32,
        prev_locking_script_hex: &str,
        value: u64,
    ) -> Result<(), TransactionError> {
        let txid = Hash::from_hex(prev_tx_id)?;
        let locking_script = Script::from_hex(prev_locking_script_hex)?;
        self.inputs.push(TransactionInput::spending(
            txid,
            vout,
            TransactionOutput::new(value, locking_script),
        ));
        Ok(())
    }

    pub fn add_output(&mut self, output: TransactionOutput) {
        self.outputs.push(output);
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    /// Sum of the values of all spent outputs.
    ///
    /// Fails if any input lacks its source output.
    pub fn total_input_value(&self) -> Result<u64, TransactionError> {
        self.inputs.iter().try_fold(0u64, |total, input| {
            let value = input.source_tx_value().ok_or_else(|| {
                TransactionError::InvalidTransaction(format!(
                    "missing source output on input {}:{}",
                    input.source_txid_hex(),
                    input.source_tx_out_index
                ))
            })?;
            total.checked_add(value).ok_or_else(|| {
                TransactionError::InvalidTransaction("input value overflow".to_string())
            })
        })
    }

    /// Index of the output flagged as change, if any.
    pub fn change_output_index(&self) -> Option<usize> {
        self.outputs.iter().position(|o| o.change)
    }

    // -----------------------------------------------------------------
    // Signature hash
    // -----------------------------------------------------------------

    /// Legacy signature hash for a P2PKH input, using its source locking
    /// script as the script code.
    pub fn calc_legacy_signature_hash(
        &self,
        input_index: usize,
        sighash_flag: u32,
    ) -> Result<[u8; 32], TransactionError> {
        let script = self.source_output_at(input_index)?.locking_script.clone();
        sighash::legacy_signature_hash(self, input_index, script.to_bytes(), sighash_flag)
    }

    /// BIP-143 signature hash for a P2WPKH or P2SH-P2WPKH input spending a
    /// key with the given hash160.
    pub fn calc_witness_signature_hash(
        &self,
        input_index: usize,
        pubkey_hash: &[u8; 20],
        sighash_flag: u32,
    ) -> Result<[u8; 32], TransactionError> {
        let value = self.source_output_at(input_index)?.value;
        let script_code = Script::p2pkh(pubkey_hash);
        sighash::witness_v0_signature_hash(
            self,
            input_index,
            script_code.to_bytes(),
            value,
            sighash_flag,
        )
    }

    fn source_output_at(&self, input_index: usize) -> Result<&TransactionOutput, TransactionError> {
        let input = self.inputs.get(input_index).ok_or_else(|| {
            TransactionError::InvalidTransaction(format!(
                "input index {} out of range (tx has {} inputs)",
                input_index,
                self.inputs.len()
            ))
        })?;
        input.source_tx_output().ok_or_else(|| {
            TransactionError::SigningError(format!(
                "missing source output on input {}",
                input_index
            ))
        })
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
