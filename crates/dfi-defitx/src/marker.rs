//! `OP_RETURN "DfTx"` framing and operation type bytes.
//!
//! ```text
//! 6a                       OP_RETURN
//! <push prefix>            direct, OP_PUSHDATA1, OP_PUSHDATA2, or OP_PUSHDATA4
//! 44 66 54 78              "DfTx"
//! <type byte>
//! <operation record>
//! ```

use std::fmt;

use serde::Serialize;

use dfi_primitives::util::DfiReader;
use dfi_script::opcodes::{OP_DATA_75, OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4, OP_RETURN};
use dfi_script::Script;

use crate::DefiTxError;

/// Bytes that open every DeFi transaction payload.
pub const DFTX_MARKER: [u8; 4] = *b"DfTx";

/// Operation selector following the marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum DefiTxType {
    PoolSwap = b's',
    AddPoolLiquidity = b'l',
    RemovePoolLiquidity = b'r',
    CreatePoolPair = b'p',
    UpdatePoolPair = b'u',
}

impl DefiTxType {
    pub const ALL: [DefiTxType; 5] = [
        DefiTxType::PoolSwap,
        DefiTxType::AddPoolLiquidity,
        DefiTxType::RemovePoolLiquidity,
        DefiTxType::CreatePoolPair,
        DefiTxType::UpdatePoolPair,
    ];

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_byte() == byte)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether this crate encodes and decodes the operation's record.
    pub fn is_supported(self) -> bool {
        matches!(self, DefiTxType::PoolSwap | DefiTxType::AddPoolLiquidity)
    }
}

impl fmt::Display for DefiTxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DefiTxType::PoolSwap => "PoolSwap",
            DefiTxType::AddPoolLiquidity => "AddPoolLiquidity",
            DefiTxType::RemovePoolLiquidity => "RemovePoolLiquidity",
            DefiTxType::CreatePoolPair => "CreatePoolPair",
            DefiTxType::UpdatePoolPair => "UpdatePoolPair",
        };
        f.write_str(name)
    }
}

/// Wrap an operation record into a DfTx locking script.
pub fn wrap(tx_type: DefiTxType, record: &[u8]) -> Result<Script, DefiTxError> {
    let mut data = Vec::with_capacity(DFTX_MARKER.len() + 1 + record.len());
    data.extend_from_slice(&DFTX_MARKER);
    data.push(tx_type.as_byte());
    data.extend_from_slice(record);

    let mut script = Script::from_bytes(&[OP_RETURN]);
    script.append_push_data(&data)?;
    Ok(script)
}

/// Split a DfTx locking script into its type and operation record.
///
/// The whole script must be `OP_RETURN` followed by exactly one push whose
/// data starts with the marker. The type byte must be known; whether its
/// record layout is supported is left to the caller.
pub fn unwrap(script: &[u8]) -> Result<(DefiTxType, &[u8]), DefiTxError> {
    let mut reader = DfiReader::new(script);
    if reader.read_u8()? != OP_RETURN {
        return Err(DefiTxError::malformed("script does not start with OP_RETURN"));
    }

    let op = reader.read_u8()?;
    let len = match op {
        1..=OP_DATA_75 => op as usize,
        OP_PUSHDATA1 => reader.read_u8()? as usize,
        OP_PUSHDATA2 => reader.read_u16_le()? as usize,
        OP_PUSHDATA4 => reader.read_u32_le()? as usize,
        _ => {
            return Err(DefiTxError::malformed(format!(
                "expected a data push after OP_RETURN, got 0x{:02x}",
                op
            )))
        }
    };
    let data = reader.read_bytes(len)?;
    if reader.remaining() != 0 {
        return Err(DefiTxError::malformed(format!(
            "{} bytes after the payload push",
            reader.remaining()
        )));
    }

    if data.len() < DFTX_MARKER.len() + 1 {
        return Err(DefiTxError::malformed("payload shorter than marker and type"));
    }
    if data[..DFTX_MARKER.len()] != DFTX_MARKER {
        return Err(DefiTxError::malformed(format!(
            "marker mismatch: {}",
            hex::encode(&data[..DFTX_MARKER.len()])
        )));
    }
    let type_byte = data[DFTX_MARKER.len()];
    let tx_type = DefiTxType::from_byte(type_byte).ok_or_else(|| {
        DefiTxError::malformed(format!("unknown operation type 0x{:02x}", type_byte))
    })?;
    Ok((tx_type, &data[DFTX_MARKER.len() + 1..]))
}
