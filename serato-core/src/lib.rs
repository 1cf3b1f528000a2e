//! serato-core: Serato DJ library formats with read and write support
//!
//! This crate provides binary serialization for:
//! - Crate files (`_Serato_/SubCrates/*.crate`) - big-endian boxes, UTF-16BE text
//! - `Serato Markers2` GEOB objects - base64 envelope around CUE/LOOP entries
//!
//! Layouts follow the community reverse engineering of Serato's formats
//! (serato-tags, pyserato).

pub mod text;
pub mod tlv;
pub mod track;
pub mod hotcue;
pub mod crates;
pub mod crate_file;
pub mod markers2;
pub mod tags;
pub mod library;
pub mod config;
pub mod error;

pub use error::{Error, Result};
pub use crates::Crate;
pub use track::{Track, BeatgridMarker};
pub use hotcue::{HotCue, HotCueKind, SeratoColor};
pub use markers2::Markers2Entry;
pub use tags::{TagContainer, Id3Tags, MARKERS2_ID};
pub use library::{
    Library, parse_crates_from_root_path, save_crate, read_hot_cues, write_hot_cues,
};
pub use config::LibraryConfig;
