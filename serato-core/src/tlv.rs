//! Big-endian tag/length/value helpers shared by the crate and Markers2 codecs
//!
//! Two framings are used by Serato:
//! - Boxes: 4-byte ASCII tag + u32 length + payload (crate files)
//! - Entries: null-terminated ASCII name + u32 length + payload (Markers2)

use crate::error::{Error, Result};

/// Forward-only reader over a byte slice
///
/// Every read past the end fails with [`Error::TruncatedRecord`].
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::TruncatedRecord(format!(
                "wanted {} bytes at offset {}, {} left",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read up to the next zero byte, consuming the terminator
    pub fn read_cstr(&mut self) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos..];
        match rest.iter().position(|&b| b == 0) {
            Some(end) => {
                self.pos += end + 1;
                Ok(&rest[..end])
            }
            None => Err(Error::TruncatedRecord(format!(
                "unterminated string at offset {}",
                self.pos
            ))),
        }
    }
}

/// Append `tag` + big-endian length + `payload`
pub fn write_box(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
}

/// Append `name` + `\0` + big-endian length + `payload`
pub fn write_entry(out: &mut Vec<u8>, name: &str, payload: &[u8]) {
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
}

/// Position of the first `needle` at or after `from`
pub fn find_tag(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|i| i + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_box() {
        let mut out = Vec::new();
        write_box(&mut out, b"ptrk", &[0xAA, 0xBB]);
        assert_eq!(out, vec![b'p', b't', b'r', b'k', 0, 0, 0, 2, 0xAA, 0xBB]);
    }

    #[test]
    fn test_write_entry() {
        let mut out = Vec::new();
        write_entry(&mut out, "CUE", &[1, 2, 3]);
        assert_eq!(&out[0..4], b"CUE\0");
        assert_eq!(&out[4..8], &[0, 0, 0, 3]);
        assert_eq!(&out[8..], &[1, 2, 3]);
    }

    #[test]
    fn test_reader_sequence() {
        let data = [0x07, 0x00, 0x00, 0x01, 0x00, b'h', b'i', 0x00, 0xFF];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.read_u32_be().unwrap(), 256);
        assert_eq!(reader.read_cstr().unwrap(), b"hi");
        assert_eq!(reader.position(), 8);
        assert_eq!(reader.remaining(), 1);
        assert_eq!(reader.read_bytes(1).unwrap(), &[0xFF]);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_reader_truncated() {
        let mut reader = ByteReader::new(&[0x00, 0x01]);
        let err = reader.read_u32_be().unwrap_err();
        assert!(matches!(err, Error::TruncatedRecord(_)));
        // Failed reads do not advance
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_reader_unterminated_cstr() {
        let mut reader = ByteReader::new(b"LOOP");
        assert!(matches!(reader.read_cstr(), Err(Error::TruncatedRecord(_))));
    }

    #[test]
    fn test_find_tag() {
        let data = b"xxotrkyyotrk";
        assert_eq!(find_tag(data, b"otrk", 0), Some(2));
        assert_eq!(find_tag(data, b"otrk", 3), Some(8));
        assert_eq!(find_tag(data, b"otrk", 9), None);
        assert_eq!(find_tag(data, b"ptrk", 0), None);
        assert_eq!(find_tag(data, b"otrk", 100), None);
    }
}
