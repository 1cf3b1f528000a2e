//! Crate file payloads (`SubCrates/*.crate`)
//!
//! Crate files are **big-endian** sequences of tagged boxes, text in UTF-16BE:
//! - vrsn: Version/format string
//! - ovct: Column definition (contains tvcn name + tvcw width)
//! - otrk: Track entry (contains ptrk path)
//!
//! There is no outer length or checksum. Readers scan for `otrk`/`ptrk` tags
//! rather than walking box lengths.
//!
//! Reference: https://github.com/Holzhaus/serato-tags/blob/main/docs/serato_crate.md

use std::path::Path;

use crate::crates::Crate;
use crate::error::{Error, Result};
use crate::text::{decode_wide, encode_wide};
use crate::tlv::{find_tag, write_box, ByteReader};
use crate::track::resolve_path;

/// Box tags (4 bytes each)
const VRSN_TAG: &[u8; 4] = b"vrsn";
const OVCT_TAG: &[u8; 4] = b"ovct";
const TVCN_TAG: &[u8; 4] = b"tvcn";
const TVCW_TAG: &[u8; 4] = b"tvcw";
const OTRK_TAG: &[u8; 4] = b"otrk";
const PTRK_TAG: &[u8; 4] = b"ptrk";

/// Written after `vrsn 00 00`. The wide '8' (0x0038) completes the
/// big-endian box length 56, so readers see "1.0/Serato ScratchLive Crate".
const VERSION: &str = "81.0";
const FORMAT_ID: &str = "/Serato ScratchLive Crate";

/// Columns shown in the Serato library view, in order
pub const DEFAULT_COLUMNS: [&str; 4] = ["track", "artist", "album", "length"];

/// Placeholder column width
const COLUMN_WIDTH: &[u8] = b"00";

/// Build the complete payload of one crate file
///
/// Only the crate's own tracks are written, not its children's.
pub fn build_payload(crate_node: &Crate) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(256 + crate_node.tracks().len() * 128);

    // Header
    buffer.extend_from_slice(VRSN_TAG);
    buffer.extend_from_slice(&[0x00, 0x00]);
    buffer.extend_from_slice(&encode_wide(VERSION));
    buffer.extend_from_slice(&encode_wide(FORMAT_ID));

    // Column definitions
    for column in DEFAULT_COLUMNS {
        buffer.extend_from_slice(&column_section(column));
    }

    // Track entries
    for track in crate_node.tracks() {
        buffer.extend_from_slice(&track_section(track.path())?);
    }

    Ok(buffer)
}

/// ovct box: tvcn (name) + tvcw (width)
fn column_section(column: &str) -> Vec<u8> {
    let mut inner = Vec::new();
    write_box(&mut inner, TVCN_TAG, &encode_wide(column));
    write_box(&mut inner, TVCW_TAG, COLUMN_WIDTH);

    let mut section = Vec::with_capacity(inner.len() + 8);
    write_box(&mut section, OVCT_TAG, &inner);
    section
}

/// otrk box: ptrk (absolute path)
fn track_section(path: &Path) -> Result<Vec<u8>> {
    let absolute = resolve_path(path)?;
    let encoded = encode_wide(&absolute.to_string_lossy());

    let mut inner = Vec::with_capacity(encoded.len() + 8);
    write_box(&mut inner, PTRK_TAG, &encoded);

    let mut section = Vec::with_capacity(inner.len() + 8);
    write_box(&mut section, OTRK_TAG, &inner);
    Ok(section)
}

/// Extract track paths from a crate payload, in file order
///
/// Columns are ignored. A missing tag or a short `ptrk` ends the scan
/// without error. Paths are made absolute by prefixing `/` when needed.
pub fn parse_track_paths(data: &[u8]) -> Vec<String> {
    let mut paths = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let Some(otrk) = find_tag(data, OTRK_TAG, pos) else {
            break;
        };
        let Some(ptrk) = find_tag(data, PTRK_TAG, otrk) else {
            break;
        };

        let mut reader = ByteReader::new(&data[ptrk + PTRK_TAG.len()..]);
        let Ok(len) = reader.read_u32_be() else {
            break;
        };
        let Ok(encoded) = reader.read_bytes(len as usize) else {
            break;
        };

        let path = decode_wide(encoded);
        if path.starts_with('/') {
            paths.push(path);
        } else {
            paths.push(format!("/{}", path));
        }

        pos = ptrk + PTRK_TAG.len() + reader.position();
    }

    paths
}

/// Read the `vrsn` box at the start of a crate payload
///
/// Returns the version string, "1.0/Serato ScratchLive Crate" for files
/// Serato (or [`build_payload`]) wrote.
pub fn parse_header(data: &[u8]) -> Result<String> {
    if !data.starts_with(VRSN_TAG) {
        return Err(Error::InvalidHeader(format!(
            "expected vrsn tag, found {:02X?}",
            &data[..data.len().min(4)]
        )));
    }
    let mut reader = ByteReader::new(&data[VRSN_TAG.len()..]);
    let len = reader.read_u32_be()?;
    let version = reader.read_bytes(len as usize)?;
    Ok(decode_wide(version))
}

/// Names of the columns defined in a crate payload
pub fn parse_column_names(data: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut pos = 0;

    while let Some(tvcn) = find_tag(data, TVCN_TAG, pos) {
        let mut reader = ByteReader::new(&data[tvcn + TVCN_TAG.len()..]);
        let Ok(len) = reader.read_u32_be() else {
            break;
        };
        let Ok(encoded) = reader.read_bytes(len as usize) else {
            break;
        };
        names.push(decode_wide(encoded));
        pos = tvcn + TVCN_TAG.len() + reader.position();
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;

    fn sample_crate() -> Crate {
        let mut c = Crate::new("Test");
        c.add_track(Track::new("/x/a.mp3")).unwrap();
        c.add_track(Track::new("/x/b.mp3")).unwrap();
        c
    }

    #[test]
    fn test_header_bytes() {
        let data = build_payload(&Crate::new("Empty")).unwrap();

        assert_eq!(&data[0..4], b"vrsn");
        assert_eq!(&data[4..6], &[0x00, 0x00]);
        assert_eq!(&data[6..8], &[0x00, b'8']);

        let header_len = 6 + 2 * (VERSION.len() + FORMAT_ID.len());
        assert_eq!(&data[header_len..header_len + 4], b"ovct");
    }

    #[test]
    fn test_parse_header() {
        let data = build_payload(&Crate::new("Empty")).unwrap();
        assert_eq!(parse_header(&data).unwrap(), "1.0/Serato ScratchLive Crate");

        let err = parse_header(b"junk data").unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
        assert!(err.is_format_error());

        let err = parse_header(b"vrsn\x00\x00").unwrap_err();
        assert!(matches!(err, Error::TruncatedRecord(_)));
    }

    #[test]
    fn test_column_section_lengths() {
        let section = column_section("artist");

        assert_eq!(&section[0..4], b"ovct");
        let ovct_len = u32::from_be_bytes([section[4], section[5], section[6], section[7]]);
        assert_eq!(ovct_len as usize, 2 * "artist".len() + 18);

        assert_eq!(&section[8..12], b"tvcn");
        let tvcn_len = u32::from_be_bytes([section[12], section[13], section[14], section[15]]);
        assert_eq!(tvcn_len, 12);

        let tvcw = 16 + 12;
        assert_eq!(&section[tvcw..tvcw + 4], b"tvcw");
        assert_eq!(&section[tvcw + 4..tvcw + 8], &[0, 0, 0, 2]);
        assert_eq!(&section[tvcw + 8..], b"00");
    }

    #[test]
    fn test_track_section_lengths() {
        let section = track_section(Path::new("/x/a.mp3")).unwrap();

        assert_eq!(&section[0..4], b"otrk");
        let otrk_len = u32::from_be_bytes([section[4], section[5], section[6], section[7]]);
        assert_eq!(otrk_len as usize, 2 * "/x/a.mp3".len() + 8);

        assert_eq!(&section[8..12], b"ptrk");
        let ptrk_len = u32::from_be_bytes([section[12], section[13], section[14], section[15]]);
        assert_eq!(ptrk_len as usize, 2 * "/x/a.mp3".len());
        assert_eq!(section.len(), 16 + ptrk_len as usize);
    }

    #[test]
    fn test_track_paths_are_resolved() {
        let mut c = Crate::new("Dots");
        c.add_track(Track::new("/x/../y/./a.mp3")).unwrap();

        let data = build_payload(&c).unwrap();
        assert_eq!(parse_track_paths(&data), vec!["/y/a.mp3"]);
    }

    #[test]
    fn test_payload_roundtrip() {
        let data = build_payload(&sample_crate()).unwrap();
        assert_eq!(parse_track_paths(&data), vec!["/x/a.mp3", "/x/b.mp3"]);
        assert_eq!(parse_column_names(&data), DEFAULT_COLUMNS.to_vec());
    }

    #[test]
    fn test_payload_excludes_children_tracks() {
        let mut child = Crate::new("Child");
        child.add_track(Track::new("/x/child.mp3")).unwrap();
        let parent = Crate::with_children("Parent", [child]);

        let data = build_payload(&parent).unwrap();
        assert!(parse_track_paths(&data).is_empty());
    }

    #[test]
    fn test_relative_path_gets_slash() {
        let mut data = Vec::new();
        let mut inner = Vec::new();
        write_box(&mut inner, PTRK_TAG, &encode_wide("Users/dj/song.mp3"));
        write_box(&mut data, OTRK_TAG, &inner);

        assert_eq!(parse_track_paths(&data), vec!["/Users/dj/song.mp3"]);
    }

    #[test]
    fn test_truncated_track_stops_scan() {
        let data = build_payload(&sample_crate()).unwrap();
        let cut = data.len() - 4;
        assert_eq!(parse_track_paths(&data[..cut]), vec!["/x/a.mp3"]);
    }

    #[test]
    fn test_no_tracks_in_garbage() {
        assert!(parse_track_paths(b"").is_empty());
        assert!(parse_track_paths(b"random bytes without tags").is_empty());
        assert!(parse_track_paths(b"otrk but no path tag").is_empty());
    }
}
