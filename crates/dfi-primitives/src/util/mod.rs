//! Binary encoding helpers for the DeFiChain wire format.
//!
//! Two distinct variable-length integer encodings appear on the wire:
//! the Bitcoin `CompactSize` (`VarInt`) used for counts and lengths, and
//! the base-128 `VARINT` used for output token ids in version 4+
//! transactions. `DfiReader` and `DfiWriter` handle both.

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// VarInt (CompactSize)
// ---------------------------------------------------------------------------

/// A Bitcoin protocol `CompactSize` integer.
///
/// Encodes in 1, 3, 5, or 9 bytes depending on magnitude. Used for input,
/// output, script, and witness item counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Decode a VarInt from the front of a byte slice.
    ///
    /// # Returns
    /// A tuple of `(VarInt, bytes_consumed)`, or `UnexpectedEof` if the
    /// slice is shorter than the encoding requires.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), PrimitivesError> {
        let mut reader = DfiReader::new(data);
        let value = reader.read_varint()?;
        Ok((value, data.len() - reader.remaining()))
    }

    /// Wire-format byte length of this value.
    pub fn length(&self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }

    /// Encode into a new byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let v = self.0;
        let mut buf = Vec::with_capacity(self.length());
        match self.length() {
            1 => buf.push(v as u8),
            3 => {
                buf.push(0xfd);
                buf.extend_from_slice(&(v as u16).to_le_bytes());
            }
            5 => {
                buf.push(0xfe);
                buf.extend_from_slice(&(v as u32).to_le_bytes());
            }
            _ => {
                buf.push(0xff);
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        buf
    }

    /// Return the underlying value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarInt {
    fn from(v: u64) -> Self {
        VarInt(v)
    }
}

impl From<usize> for VarInt {
    fn from(v: usize) -> Self {
        VarInt(v as u64)
    }
}

// ---------------------------------------------------------------------------
// Base-128 VARINT
// ---------------------------------------------------------------------------

/// Encode `n` as a base-128 VARINT.
///
/// MSB-first groups of 7 bits, with the continuation bit set on every byte
/// but the last and an offset of one subtracted per continuation so that
/// each value has exactly one encoding. Values 0..=127 encode as a single
/// byte equal to the value.
pub fn encode_b128(mut n: u64) -> Vec<u8> {
    let mut tmp = [0u8; 10];
    let mut len = 0usize;
    loop {
        tmp[len] = (n & 0x7f) as u8 | if len > 0 { 0x80 } else { 0x00 };
        if n <= 0x7f {
            break;
        }
        n = (n >> 7) - 1;
        len += 1;
    }
    tmp[..=len].iter().rev().copied().collect()
}

/// Byte length of the base-128 VARINT encoding of `n`.
pub fn b128_len(n: u64) -> usize {
    encode_b128(n).len()
}

// ---------------------------------------------------------------------------
// DfiReader
// ---------------------------------------------------------------------------

/// A cursor-based reader over wire-format bytes.
///
/// All multi-byte integers are little-endian. Every read fails with
/// `UnexpectedEof` rather than panicking when the buffer runs short.
pub struct DfiReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DfiReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        DfiReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance the position.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        let end = self.pos.checked_add(n).ok_or(PrimitivesError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(PrimitivesError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64_le(&mut self) -> Result<i64, PrimitivesError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Read a `CompactSize` VarInt.
    pub fn read_varint(&mut self) -> Result<VarInt, PrimitivesError> {
        let value = match self.read_u8()? {
            0xff => self.read_u64_le()?,
            0xfe => self.read_u32_le()? as u64,
            0xfd => self.read_u16_le()? as u64,
            b => b as u64,
        };
        Ok(VarInt(value))
    }

    /// Read a base-128 VARINT.
    ///
    /// Fails with `VarIntTooLarge` if the value overflows a u64.
    pub fn read_b128(&mut self) -> Result<u64, PrimitivesError> {
        let mut n: u64 = 0;
        loop {
            let byte = self.read_u8()?;
            if n > (u64::MAX >> 7) {
                return Err(PrimitivesError::VarIntTooLarge);
            }
            n = (n << 7) | (byte & 0x7f) as u64;
            if byte & 0x80 == 0 {
                return Ok(n);
            }
            n = n.checked_add(1).ok_or(PrimitivesError::VarIntTooLarge)?;
        }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Current read offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }
}

// ---------------------------------------------------------------------------
// DfiWriter
// ---------------------------------------------------------------------------

/// An append-only buffer for wire-format bytes.
#[derive(Debug, Default, Clone)]
pub struct DfiWriter {
    buf: Vec<u8>,
}

impl DfiWriter {
    pub fn new() -> Self {
        DfiWriter { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DfiWriter { buf: Vec::with_capacity(capacity) }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    pub fn write_u16_le(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_i64_le(&mut self, val: i64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a `CompactSize` VarInt.
    pub fn write_varint(&mut self, varint: VarInt) {
        self.buf.extend_from_slice(&varint.to_bytes());
    }

    /// Append a base-128 VARINT.
    pub fn write_b128(&mut self, val: u64) {
        self.buf.extend_from_slice(&encode_b128(val));
    }

    /// Append a `CompactSize` length prefix followed by the bytes.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(VarInt::from(bytes.len()));
        self.write_bytes(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_boundaries() {
        let cases: [(u64, &str); 7] = [
            (0, "00"),
            (0xfc, "fc"),
            (0xfd, "fdfd00"),
            (0xffff, "fdffff"),
            (0x1_0000, "fe00000100"),
            (0xffff_ffff, "feffffffff"),
            (0x1_0000_0000, "ff0000000001000000"),
        ];
        for (value, expected) in cases {
            let vi = VarInt(value);
            assert_eq!(hex::encode(vi.to_bytes()), expected, "encode {}", value);
            assert_eq!(vi.length(), expected.len() / 2);
            let (decoded, used) = VarInt::from_bytes(&vi.to_bytes()).unwrap();
            assert_eq!(decoded, vi);
            assert_eq!(used, vi.length());
        }
    }

    #[test]
    fn test_varint_short_input() {
        assert!(matches!(
            VarInt::from_bytes(&[0xfd, 0x01]),
            Err(PrimitivesError::UnexpectedEof)
        ));
        assert!(VarInt::from_bytes(&[]).is_err());
    }

    /// Reference vectors for the base-128 VARINT (serialize_tests.cpp).
    #[test]
    fn test_b128_vectors() {
        let cases: [(u64, &str); 8] = [
            (0, "00"),
            (0x7f, "7f"),
            (0x80, "8000"),
            (0x1234, "a334"),
            (0xffff, "82fe7f"),
            (0x123456, "c7e756"),
            (0x80123456, "86ffc7e756"),
            (0xffffffff, "8efefefe7f"),
        ];
        for (value, expected) in cases {
            assert_eq!(hex::encode(encode_b128(value)), expected, "encode {}", value);
            let bytes = hex::decode(expected).unwrap();
            let mut reader = DfiReader::new(&bytes);
            assert_eq!(reader.read_b128().unwrap(), value);
            assert_eq!(reader.remaining(), 0);
            assert_eq!(b128_len(value), bytes.len());
        }
    }

    #[test]
    fn test_b128_single_byte_range() {
        for v in 0u64..=127 {
            assert_eq!(encode_b128(v), vec![v as u8]);
        }
    }

    #[test]
    fn test_b128_overflow() {
        let bytes = [0xffu8; 11];
        let mut reader = DfiReader::new(&bytes);
        assert!(reader.read_b128().is_err());
    }

    #[test]
    fn test_reader_writer_integers() {
        let mut w = DfiWriter::new();
        w.write_u8(0xab);
        w.write_u16_le(0x1234);
        w.write_u32_le(0xdeadbeef);
        w.write_u64_le(u64::MAX - 1);
        w.write_i64_le(-5);
        w.write_var_bytes(b"DfTx");
        let bytes = w.into_bytes();

        let mut r = DfiReader::new(&bytes);
        assert_eq!(r.read_u8().unwrap(), 0xab);
        assert_eq!(r.read_u16_le().unwrap(), 0x1234);
        assert_eq!(r.read_u32_le().unwrap(), 0xdeadbeef);
        assert_eq!(r.read_u64_le().unwrap(), u64::MAX - 1);
        assert_eq!(r.read_i64_le().unwrap(), -5);
        let len = r.read_varint().unwrap().value() as usize;
        assert_eq!(r.read_bytes(len).unwrap(), b"DfTx");
        assert_eq!(r.remaining(), 0);
        assert!(r.read_u8().is_err());
    }

    #[test]
    fn test_reader_huge_length_does_not_panic() {
        let bytes = [0u8; 4];
        let mut r = DfiReader::new(&bytes);
        r.read_u8().unwrap();
        assert!(r.read_bytes(usize::MAX).is_err());
        assert_eq!(r.position(), 1);
    }
}
