//! Serato text encodings
//!
//! Two unrelated schemes live side by side:
//! - Wide: UTF-16 code units written big-endian (crate files, track paths)
//! - Packed: 3 bytes spread over 4 bytes of 7 significant bits each
//!   (legacy `Serato Markers_` fields)
//!
//! Reference: https://github.com/Holzhaus/serato-tags/blob/main/docs/fileformats.md

/// Encode a string as big-endian UTF-16 code units
///
/// No terminator and no length prefix; callers frame the bytes themselves.
pub fn encode_wide(s: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(s.len() * 2);
    for unit in s.encode_utf16() {
        result.extend_from_slice(&unit.to_be_bytes());
    }
    result
}

/// Decode big-endian UTF-16 bytes
///
/// Stops at the first zero code unit. An odd trailing byte is ignored and
/// unpaired surrogates come back as U+FFFD.
pub fn decode_wide(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0);

    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Number of bytes `encode_wide` produces for `s`
pub fn wide_len(s: &str) -> usize {
    s.encode_utf16().count() * 2
}

/// Spread 3 raw bytes over 4 bytes of 7 bits each
///
/// Bits 7-3 of the first output byte are always zero.
pub fn pack3to4(block: [u8; 3]) -> [u8; 4] {
    let [a, b, c] = block;
    let w = a >> 5;
    let x = ((b >> 6) | (a << 2)) & 0x7F;
    let y = ((c >> 7) | (b << 1)) & 0x7F;
    let z = c & 0x7F;
    [w, x, y, z]
}

/// Inverse of [`pack3to4`]
pub fn unpack4to3(block: [u8; 4]) -> [u8; 3] {
    let [w, x, y, z] = block;
    let c = (z & 0x7F) | ((y & 0x01) << 7);
    let b = ((y & 0x7F) >> 1) | ((x & 0x03) << 6);
    let a = ((x & 0x7F) >> 2) | ((w & 0x07) << 5);
    [a, b, c]
}

/// Pack a byte stream; a trailing partial block is zero-filled
pub fn pack(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let mut block = [0u8; 3];
        block[..chunk.len()].copy_from_slice(chunk);
        result.extend_from_slice(&pack3to4(block));
    }
    result
}

/// Unpack a byte stream; a trailing partial block is dropped
pub fn unpack(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() / 4 * 3);
    for chunk in data.chunks_exact(4) {
        result.extend_from_slice(&unpack4to3([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    result
}
