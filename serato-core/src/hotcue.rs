//! Hot cue and saved loop records (`CUE` / `LOOP` Markers2 entries)
//!
//! Both bodies are **big-endian**:
//!
//! ```text
//! CUE   00 | index | start u32 | 00 | color[3] | 00 | locked | name.. | 00
//! LOOP  00 | index | start u32 | end u32 | FF FF FF FF | 00 27 AA E1 | 00 | locked | name.. | 00
//! ```
//!
//! Each body is wrapped as a Markers2 entry: `"CUE\0"` / `"LOOP\0"`, u32 length, body.
//!
//! Reference: https://github.com/Holzhaus/serato-tags/blob/main/docs/serato_markers2.md

use std::fmt;
use std::io::Cursor;

use binrw::{binrw, BinRead, BinWrite, NullString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tlv;

/// Entry names
pub const CUE_TAG: &str = "CUE";
pub const LOOP_TAG: &str = "LOOP";

/// Slots available on a track
pub const MAX_HOT_CUES: usize = 8;
pub const MAX_LOOPS: usize = 4;

/// Bytes 0x0A-0x12 of a LOOP body: unused "next loop" marker and the
/// placeholder ARGB colour Serato writes for loops
const LOOP_RESERVED: [u8; 9] = [0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x27, 0xAA, 0xE1, 0x00];

#[binrw]
#[brw(big)]
#[derive(Debug)]
struct CueBody {
    #[brw(pad_before = 1)]
    index: u8,
    start: u32,
    #[brw(pad_before = 1)]
    color: [u8; 3],
    #[brw(pad_before = 1)]
    locked: u8,
    name: NullString,
}

#[binrw]
#[brw(big)]
#[derive(Debug)]
struct LoopBody {
    #[brw(pad_before = 1)]
    index: u8,
    start: u32,
    end: u32,
    #[br(temp)]
    #[bw(calc = LOOP_RESERVED)]
    reserved: [u8; 9],
    locked: u8,
    name: NullString,
}

/// Record type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HotCueKind {
    Cue,
    Loop,
}

impl HotCueKind {
    /// Markers2 entry name for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            HotCueKind::Cue => CUE_TAG,
            HotCueKind::Loop => LOOP_TAG,
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            CUE_TAG => Ok(HotCueKind::Cue),
            LOOP_TAG => Ok(HotCueKind::Loop),
            other => Err(Error::UnsupportedRecordType(other.to_string())),
        }
    }

    /// Number of slots a track has for this kind
    pub fn capacity(&self) -> usize {
        match self {
            HotCueKind::Cue => MAX_HOT_CUES,
            HotCueKind::Loop => MAX_LOOPS,
        }
    }
}

/// Cue colours Serato DJ recognises
///
/// `Red` is the fallback for colours outside the palette; the rest is the
/// 18-colour hot cue palette of Serato DJ Pro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeratoColor {
    #[default]
    Red,
    Scarlet,
    Orange,
    Amber,
    Yellow,
    Lime,
    Chartreuse,
    Green,
    Emerald,
    Jade,
    Cyan,
    Azure,
    Cobalt,
    Blue,
    Indigo,
    Violet,
    Magenta,
    Pink,
    Rose,
}

impl SeratoColor {
    pub const ALL: [SeratoColor; 19] = [
        SeratoColor::Red,
        SeratoColor::Scarlet,
        SeratoColor::Orange,
        SeratoColor::Amber,
        SeratoColor::Yellow,
        SeratoColor::Lime,
        SeratoColor::Chartreuse,
        SeratoColor::Green,
        SeratoColor::Emerald,
        SeratoColor::Jade,
        SeratoColor::Cyan,
        SeratoColor::Azure,
        SeratoColor::Cobalt,
        SeratoColor::Blue,
        SeratoColor::Indigo,
        SeratoColor::Violet,
        SeratoColor::Magenta,
        SeratoColor::Pink,
        SeratoColor::Rose,
    ];

    /// Uppercase 6-digit hex form
    pub fn hex(&self) -> &'static str {
        match self {
            SeratoColor::Red => "FF0000",
            SeratoColor::Scarlet => "CC0000",
            SeratoColor::Orange => "CC4400",
            SeratoColor::Amber => "CC8800",
            SeratoColor::Yellow => "CCCC00",
            SeratoColor::Lime => "88CC00",
            SeratoColor::Chartreuse => "44CC00",
            SeratoColor::Green => "00CC00",
            SeratoColor::Emerald => "00CC44",
            SeratoColor::Jade => "00CC88",
            SeratoColor::Cyan => "00CCCC",
            SeratoColor::Azure => "0088CC",
            SeratoColor::Cobalt => "0044CC",
            SeratoColor::Blue => "0000CC",
            SeratoColor::Indigo => "4400CC",
            SeratoColor::Violet => "8800CC",
            SeratoColor::Magenta => "CC00CC",
            SeratoColor::Pink => "CC0088",
            SeratoColor::Rose => "CC0044",
        }
    }

    /// Case-insensitive palette lookup
    pub fn from_hex(hex: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.hex().eq_ignore_ascii_case(hex))
    }
}

impl From<SeratoColor> for String {
    fn from(color: SeratoColor) -> Self {
        color.hex().to_string()
    }
}

impl fmt::Display for SeratoColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

/// A hot cue (single position) or a saved loop (start/end range)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HotCue {
    pub kind: HotCueKind,
    /// Slot number, 0-7 for cues and 0-3 for loops
    pub index: u8,
    /// Position in milliseconds
    pub start: u32,
    /// Loop end in milliseconds; loops only
    pub end: Option<u32>,
    pub name: String,
    /// 6-digit hex RGB
    pub color: String,
    /// Loops only
    pub locked: bool,
}

impl HotCue {
    /// New hot cue with the default colour
    pub fn cue(index: u8, start: u32, name: impl Into<String>) -> Self {
        Self {
            kind: HotCueKind::Cue,
            index,
            start,
            end: None,
            name: name.into(),
            color: SeratoColor::default().into(),
            locked: false,
        }
    }

    /// New saved loop
    pub fn saved_loop(index: u8, start: u32, end: u32, name: impl Into<String>) -> Self {
        Self {
            kind: HotCueKind::Loop,
            index,
            start,
            end: Some(end),
            name: name.into(),
            color: SeratoColor::default().into(),
            locked: false,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Raw RGB bytes of `color`
    pub fn color_bytes(&self) -> Result<[u8; 3]> {
        let bytes = hex::decode(&self.color)
            .map_err(|_| Error::InvalidColorFormat(self.color.clone()))?;
        bytes
            .try_into()
            .map_err(|_| Error::InvalidColorFormat(self.color.clone()))
    }

    /// Encode the record body without the entry header
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        match self.kind {
            HotCueKind::Cue => CueBody {
                index: self.index,
                start: self.start,
                color: self.color_bytes()?,
                locked: self.locked as u8,
                name: NullString::from(self.name.as_str()),
            }
            .write(&mut cursor)?,
            HotCueKind::Loop => LoopBody {
                index: self.index,
                start: self.start,
                end: self.end.unwrap_or(0),
                locked: self.locked as u8,
                name: NullString::from(self.name.as_str()),
            }
            .write(&mut cursor)?,
        }
        Ok(cursor.into_inner())
    }

    /// Encode as a complete Markers2 entry (`name\0`, length, body)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = self.body_bytes()?;
        let mut buffer = Vec::with_capacity(body.len() + 9);
        tlv::write_entry(&mut buffer, self.kind.tag(), &body);
        Ok(buffer)
    }

    /// Decode a record body (the bytes after the entry length)
    pub fn from_bytes(data: &[u8], kind: HotCueKind) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        match kind {
            HotCueKind::Cue => {
                let body = CueBody::read(&mut cursor)?;
                let hex = hex::encode_upper(body.color);
                let color = match SeratoColor::from_hex(&hex) {
                    Some(_) => hex,
                    None => SeratoColor::default().into(),
                };
                Ok(Self {
                    kind,
                    index: body.index,
                    start: body.start,
                    end: None,
                    name: String::from_utf8_lossy(&body.name.0).into_owned(),
                    color,
                    locked: body.locked != 0,
                })
            }
            HotCueKind::Loop => {
                let body = LoopBody::read(&mut cursor)?;
                Ok(Self {
                    kind,
                    index: body.index,
                    start: body.start,
                    end: Some(body.end),
                    name: String::from_utf8_lossy(&body.name.0).into_owned(),
                    color: SeratoColor::default().into(),
                    locked: body.locked != 0,
                })
            }
        }
    }
}

impl fmt::Display for HotCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Start: {}ms", self.start)?;
        if let Some(end) = self.end {
            write!(f, " | End: {}ms", end)?;
        }
        write!(
            f,
            " | Index: {:>2} | Name: {} | Color: {}",
            self.index, self.name, self.color
        )
    }
}
