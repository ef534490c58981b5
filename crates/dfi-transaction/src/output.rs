//! Transaction output with value, locking script, and token id.
//!
//! From transaction version 4 on, every output carries the id of the token
//! it transfers, serialized after the script as a base-128 VARINT. DFI
//! itself is token 0.

use dfi_primitives::util::{DfiReader, DfiWriter, VarInt};
use dfi_script::Script;

use crate::TransactionError;

/// Lowest transaction version whose outputs serialize a token id.
pub const TOKEN_ID_MIN_VERSION: u32 = 4;

/// Token id of the native DFI coin.
pub const DFI_TOKEN_ID: u32 = 0;

/// A single output in a DeFiChain transaction.
///
/// # Wire format
///
/// | Field            | Size                          |
/// |------------------|-------------------------------|
/// | value            | 8 bytes (LE)                  |
/// | script length    | VarInt                        |
/// | locking_script   | variable                      |
/// | token_id         | base-128 VARINT (version ≥ 4) |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionOutput {
    /// Amount in the smallest unit (1e-8 DFI).
    pub value: u64,

    /// The locking script that defines spending conditions.
    pub locking_script: Script,

    pub token_id: u32,

    /// Local-only flag marking the output that absorbs the fee.
    /// Not serialized.
    pub change: bool,
}

impl TransactionOutput {
    /// A DFI output paying `value` to `locking_script`.
    pub fn new(value: u64, locking_script: Script) -> Self {
        TransactionOutput { value, locking_script, token_id: DFI_TOKEN_ID, change: false }
    }

    /// A change output; the builder deducts the fee from it.
    pub fn change(value: u64, locking_script: Script) -> Self {
        TransactionOutput { change: true, ..Self::new(value, locking_script) }
    }

    /// The null output used by SIGHASH_SINGLE for outputs before the
    /// signed index.
    pub(crate) fn null() -> Self {
        Self::new(u64::MAX, Script::new())
    }

    /// Deserialize an output for a transaction of the given version.
    pub fn read_from(reader: &mut DfiReader, tx_version: u32) -> Result<Self, TransactionError> {
        let value = reader.read_u64_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading value: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;

        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading locking script: {}", e))
        })?;

        let token_id = if tx_version >= TOKEN_ID_MIN_VERSION {
            let id = reader.read_b128().map_err(|e| {
                TransactionError::SerializationError(format!("reading token id: {}", e))
            })?;
            u32::try_from(id).map_err(|_| {
                TransactionError::SerializationError(format!("token id {} out of range", id))
            })?
        } else {
            DFI_TOKEN_ID
        };

        Ok(TransactionOutput {
            value,
            locking_script: Script::from_bytes(script_bytes),
            token_id,
            change: false,
        })
    }

    /// Serialize into `writer` for a transaction of the given version.
    pub fn write_to(&self, writer: &mut DfiWriter, tx_version: u32) {
        writer.write_u64_le(self.value);
        let script_bytes = self.locking_script.to_bytes();
        writer.write_varint(VarInt::from(script_bytes.len()));
        writer.write_bytes(script_bytes);
        if tx_version >= TOKEN_ID_MIN_VERSION {
            writer.write_b128(self.token_id as u64);
        }
    }

    pub fn to_bytes(&self, tx_version: u32) -> Vec<u8> {
        let mut writer = DfiWriter::new();
        self.write_to(&mut writer, tx_version);
        writer.into_bytes()
    }
}
