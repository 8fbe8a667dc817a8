//! Base-128 varints used as record length prefixes.
//!
//! Seven payload bits per byte, least significant group first, high bit set
//! on every byte except the last.

use crate::utils::config::MAX_VARINT_LEN;
use crate::utils::error::CodecError;
use std::io::{ErrorKind, Read, Write};

/// Encode `value` as a varint
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN);
    let mut value = value;
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
    buf
}

/// Write `value` as a varint, returning the number of bytes written
pub fn write_varint<W: Write>(writer: &mut W, value: u64) -> std::io::Result<usize> {
    let encoded = encode_varint(value);
    writer.write_all(&encoded)?;
    Ok(encoded.len())
}

/// Read one varint from `reader`
///
/// **Public** - used by the canonical record reader
///
/// # Returns
/// * `Ok(None)` - the input ended cleanly before the first byte
/// * `Ok(Some(n))` - a complete varint
///
/// # Errors
/// * `CodecError::TruncatedVarint` - input ended after a continuation byte
/// * `CodecError::VarintOverflow` - more than ten bytes
pub fn read_varint<R: Read>(reader: &mut R) -> Result<Option<u64>, CodecError> {
    let mut value: u64 = 0;

    for index in 0..MAX_VARINT_LEN {
        let Some(byte) = read_byte(reader)? else {
            return if index == 0 {
                Ok(None)
            } else {
                Err(CodecError::TruncatedVarint)
            };
        };

        let group = u64::from(byte & 0x7f);
        if index == MAX_VARINT_LEN - 1 && group > 1 {
            return Err(CodecError::VarintOverflow);
        }
        value |= group << (7 * index);

        if byte & 0x80 == 0 {
            return Ok(Some(value));
        }
    }

    Err(CodecError::VarintOverflow)
}

fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>, CodecError> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CodecError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encode_small_values() {
        assert_eq!(encode_varint(0), vec![0x00]);
        assert_eq!(encode_varint(127), vec![0x7f]);
        assert_eq!(encode_varint(128), vec![0x80, 0x01]);
        assert_eq!(encode_varint(300), vec![0xac, 0x02]);
    }

    #[test]
    fn test_encode_max() {
        let buf = encode_varint(u64::MAX);
        assert_eq!(buf.len(), MAX_VARINT_LEN);
        assert_eq!(read_varint(&mut Cursor::new(buf)).unwrap(), Some(u64::MAX));
    }

    #[test]
    fn test_read_clean_eof() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert_eq!(read_varint(&mut cursor).unwrap(), None);
    }

    #[test]
    fn test_read_truncated() {
        let mut cursor = Cursor::new(vec![0x80, 0x80]);
        assert!(matches!(
            read_varint(&mut cursor),
            Err(CodecError::TruncatedVarint)
        ));
    }

    #[test]
    fn test_read_overflow() {
        let mut cursor = Cursor::new(vec![0xff; 11]);
        assert!(matches!(
            read_varint(&mut cursor),
            Err(CodecError::VarintOverflow)
        ));
    }

    #[test]
    fn test_read_leaves_following_bytes() {
        let mut cursor = Cursor::new(vec![0xac, 0x02, 0x07]);
        assert_eq!(read_varint(&mut cursor).unwrap(), Some(300));
        assert_eq!(read_varint(&mut cursor).unwrap(), Some(7));
    }
}
