//! Script chunk parsing and push-data encoding.
//!
//! A chunk is either a bare opcode or a data push together with its bytes.

use dfi_primitives::util::DfiReader;

use crate::opcodes::*;
use crate::ScriptError;

/// A single parsed element of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes) this is the length.
    pub op: u8,
    /// The pushed bytes, for push operations.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// Render as an ASM token: hex for pushes, the opcode name otherwise.
    pub fn to_asm_string(&self) -> String {
        match &self.data {
            Some(data) => hex::encode(data),
            None => opcode_to_string(self.op),
        }
    }
}

/// Decode raw script bytes into chunks.
///
/// Handles direct pushes (1-75 bytes) and OP_PUSHDATA1/2/4. Every other
/// byte, OP_RETURN included, is an opcode with no data. Fails with
/// `DataTooSmall` when a push runs past the end of the script.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut reader = DfiReader::new(bytes);
    let mut chunks = Vec::new();

    while reader.remaining() > 0 {
        let op = reader.read_u8().map_err(|_| ScriptError::DataTooSmall)?;
        let length = match op {
            OP_DATA_1..=OP_DATA_75 => Some(op as usize),
            OP_PUSHDATA1 => Some(reader.read_u8().map_err(|_| ScriptError::DataTooSmall)? as usize),
            OP_PUSHDATA2 => {
                Some(reader.read_u16_le().map_err(|_| ScriptError::DataTooSmall)? as usize)
            }
            OP_PUSHDATA4 => {
                Some(reader.read_u32_le().map_err(|_| ScriptError::DataTooSmall)? as usize)
            }
            _ => None,
        };
        let data = match length {
            Some(n) => Some(reader.read_bytes(n).map_err(|_| ScriptError::DataTooSmall)?.to_vec()),
            None => None,
        };
        chunks.push(ScriptChunk { op, data });
    }

    Ok(chunks)
}

/// Minimal push prefix for `data_len` bytes of data.
///
/// Direct push up to 75 bytes, OP_PUSHDATA1 up to 255, OP_PUSHDATA2 up to
/// 65535, OP_PUSHDATA4 beyond.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len <= OP_DATA_75 as usize {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xff {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xffff {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len <= 0xffff_ffff {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_p2pkh() {
        let bytes = hex::decode("76a914000102030405060708090a0b0c0d0e0f1011121388ac").unwrap();
        let chunks = decode_script(&bytes).unwrap();
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0].op, OP_DUP);
        assert_eq!(chunks[2].data.as_ref().map(|d| d.len()), Some(20));
        assert_eq!(chunks[4].op, OP_CHECKSIG);
    }

    /// OP_RETURN is a plain opcode; the following push is its own chunk.
    #[test]
    fn test_decode_op_return_push() {
        let bytes = hex::decode("6a0444665478").unwrap();
        let chunks = decode_script(&bytes).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], ScriptChunk { op: OP_RETURN, data: None });
        assert_eq!(chunks[1].data.as_deref(), Some(&b"DfTx"[..]));
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(decode_script(&[0x05, 0x01]), Err(ScriptError::DataTooSmall)));
        assert!(matches!(decode_script(&[OP_PUSHDATA1]), Err(ScriptError::DataTooSmall)));
        assert!(matches!(decode_script(&[OP_PUSHDATA2, 0x01]), Err(ScriptError::DataTooSmall)));
    }

    #[test]
    fn test_push_data_prefix_boundaries() {
        assert_eq!(push_data_prefix(0).unwrap(), vec![0x00]);
        assert_eq!(push_data_prefix(75).unwrap(), vec![0x4b]);
        assert_eq!(push_data_prefix(76).unwrap(), vec![OP_PUSHDATA1, 76]);
        assert_eq!(push_data_prefix(255).unwrap(), vec![OP_PUSHDATA1, 0xff]);
        assert_eq!(push_data_prefix(256).unwrap(), vec![OP_PUSHDATA2, 0x00, 0x01]);
        assert_eq!(push_data_prefix(0x1_0000).unwrap(), vec![OP_PUSHDATA4, 0, 0, 1, 0]);
    }

    #[test]
    fn test_asm_tokens() {
        let push = ScriptChunk { op: 2, data: Some(vec![0xab, 0xcd]) };
        assert_eq!(push.to_asm_string(), "abcd");
        let op = ScriptChunk { op: OP_HASH160, data: None };
        assert_eq!(op.to_asm_string(), "OP_HASH160");
    }
}
