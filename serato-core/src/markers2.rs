//! `Serato Markers2` envelope
//!
//! The GEOB object is layered:
//!
//! ```text
//! 01 01 | [entry count u32] | text, zero-padded to 468 (or 982 + 00)
//!                              text = base64(01 01 | entry | entry | ...), '=' -> 'A',
//!                                     72 chars per line, '\n' separated
//! entry = name \0 | length u32 | body
//! ```
//!
//! Only `CUE` and `LOOP` bodies are decoded; `COLOR`, `BPMLOCK` and anything
//! else is kept as raw bytes.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::error::{Error, Result};
use crate::hotcue::{HotCue, HotCueKind, CUE_TAG, LOOP_TAG};
use crate::tlv::ByteReader;
use crate::track::Track;

/// Format version, written both outside and inside the base64 text
pub const VERSION: [u8; 2] = [0x01, 0x01];

/// Envelope sizes the GEOB slot accepts
pub const SMALL_ENVELOPE: usize = 468;
pub const LARGE_ENVELOPE: usize = 982;

const LINE_WIDTH: usize = 72;

/// Accepts missing padding and the non-zero trailing bits left by the
/// '=' -> 'A' substitution
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// One decoded Markers2 entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markers2Entry {
    Cue(HotCue),
    Loop(HotCue),
    /// Recognised by name only (`COLOR`, `BPMLOCK`, ...)
    Unknown { name: String, data: Vec<u8> },
}

impl Markers2Entry {
    pub fn name(&self) -> &str {
        match self {
            Markers2Entry::Cue(_) => CUE_TAG,
            Markers2Entry::Loop(_) => LOOP_TAG,
            Markers2Entry::Unknown { name, .. } => name,
        }
    }

    pub fn into_hot_cue(self) -> Option<HotCue> {
        match self {
            Markers2Entry::Cue(cue) | Markers2Entry::Loop(cue) => Some(cue),
            Markers2Entry::Unknown { .. } => None,
        }
    }
}

/// Encode a track's cues and loops as a complete GEOB payload
pub fn encode(track: &Track) -> Result<Vec<u8>> {
    encode_entries(track.hot_cues(), track.loops(), None)
}

/// Encode cues then loops
///
/// `entry_count`, when given, is written as a big-endian u32 right after the
/// outer version marker. [`decode`] skips it again.
pub fn encode_entries(
    cues: &[HotCue],
    loops: &[HotCue],
    entry_count: Option<u32>,
) -> Result<Vec<u8>> {
    let mut raw = VERSION.to_vec();
    for cue in cues.iter().chain(loops) {
        raw.extend_from_slice(&cue.to_bytes()?);
    }

    let text = STANDARD.encode(&raw).replace('=', "A");
    let body = pad_envelope(split_lines(text.as_bytes(), LINE_WIDTH))?;

    let mut payload = Vec::with_capacity(body.len() + 6);
    payload.extend_from_slice(&VERSION);
    if let Some(count) = entry_count {
        payload.extend_from_slice(&count.to_be_bytes());
    }
    payload.extend_from_slice(&body);
    Ok(payload)
}

/// Join `width`-sized pieces of `input` with newlines
fn split_lines(input: &[u8], width: usize) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() + input.len() / width + 1);
    for (i, line) in input.chunks(width).enumerate() {
        if i > 0 {
            output.push(b'\n');
        }
        output.extend_from_slice(line);
    }
    output
}

/// Zero-pad to 468 bytes, or to 982 plus a trailing zero when it does not fit
fn pad_envelope(mut text: Vec<u8>) -> Result<Vec<u8>> {
    let len = text.len();
    if len < SMALL_ENVELOPE {
        text.resize(SMALL_ENVELOPE, 0);
    } else if len <= LARGE_ENVELOPE {
        text.resize(LARGE_ENVELOPE + 1, 0);
    } else {
        return Err(Error::EnvelopeTooLarge(len));
    }
    Ok(text)
}

/// Re-append base64 padding; a lone trailing character gets `A==`
fn restore_padding(mut text: Vec<u8>) -> Vec<u8> {
    match text.len() % 4 {
        0 => {}
        1 => text.extend_from_slice(b"A=="),
        r => text.extend(std::iter::repeat(b'=').take(4 - r)),
    }
    text
}

/// Text after an optional u32 entry count
///
/// Base64 text never holds a zero byte, so a leading zero followed by
/// non-zero data at offset 4 can only be a count below 2^24.
fn skip_entry_count(data: &[u8]) -> &[u8] {
    match data {
        [0, _, _, _, next, ..] if *next != 0 => &data[4..],
        _ => data,
    }
}

/// Decode a GEOB payload into its entries
pub fn decode(payload: &[u8]) -> Result<Vec<Markers2Entry>> {
    if payload.len() < 2 || payload[..2] != VERSION {
        return Err(Error::InvalidHeader(format!(
            "Markers2 version {:02X?}, expected 01 01",
            &payload[..payload.len().min(2)]
        )));
    }

    // Null padding
    let text = skip_entry_count(&payload[2..]);
    let text = match text.iter().position(|&b| b == 0) {
        Some(end) => &text[..end],
        None => text,
    };

    let text: Vec<u8> = text
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let decoded = LENIENT
        .decode(restore_padding(text))
        .map_err(|e| Error::InvalidHeader(format!("Markers2 text is not base64: {}", e)))?;

    if decoded.len() < 2 || decoded[..2] != VERSION {
        return Err(Error::InvalidHeader(format!(
            "embedded Markers2 version {:02X?}, expected 01 01",
            &decoded[..decoded.len().min(2)]
        )));
    }

    decode_entries(&decoded[2..])
}

/// Entry loop; an empty name or the end of the buffer ends it
fn decode_entries(data: &[u8]) -> Result<Vec<Markers2Entry>> {
    let mut entries = Vec::new();
    let mut reader = ByteReader::new(data);

    while !reader.is_empty() {
        let name = reader.read_cstr()?;
        if name.is_empty() {
            break;
        }
        let name = String::from_utf8_lossy(name).into_owned();

        let len = reader.read_u32_be()?;
        if len == 0 {
            return Err(Error::TruncatedRecord(format!("{} entry has zero length", name)));
        }
        let body = reader.read_bytes(len as usize)?;

        let entry = match name.as_str() {
            CUE_TAG => Markers2Entry::Cue(HotCue::from_bytes(body, HotCueKind::Cue)?),
            LOOP_TAG => Markers2Entry::Loop(HotCue::from_bytes(body, HotCueKind::Loop)?),
            _ => Markers2Entry::Unknown {
                name,
                data: body.to_vec(),
            },
        };
        entries.push(entry);
    }

    Ok(entries)
}

/// Decode only the cues and loops of a GEOB payload
pub fn decode_hot_cues(payload: &[u8]) -> Result<Vec<HotCue>> {
    Ok(decode(payload)?
        .into_iter()
        .filter_map(Markers2Entry::into_hot_cue)
        .collect())
}
