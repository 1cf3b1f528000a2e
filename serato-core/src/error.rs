//! Error types for serato-core

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary format error: {0}")]
    BinRw(String),

    #[error("Tag container error: {0}")]
    Tag(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Truncated record: {0}")]
    TruncatedRecord(String),

    #[error("Unsupported record type: {0}")]
    UnsupportedRecordType(String),

    #[error("Too many hot cues: a track holds at most {max}")]
    TooManyHotCues { max: usize },

    #[error("Too many loops: a track holds at most {max}")]
    TooManyLoops { max: usize },

    #[error("Invalid color format: {0:?} (expected 3 hex bytes, e.g. \"CC0000\")")]
    InvalidColorFormat(String),

    #[error("Track {track:?} is already in the crate {crate_name}")]
    DuplicateTrack { track: PathBuf, crate_name: String },

    #[error("Cannot merge crates with different names: {left} and {right}")]
    CrateNameMismatch { left: String, right: String },

    #[error("Markers2 envelope too large: {0} bytes (maximum 982)")]
    EnvelopeTooLarge(usize),
}

impl Error {
    /// Malformed input bytes (bad marker, short or unknown record).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidHeader(_)
                | Error::TruncatedRecord(_)
                | Error::UnsupportedRecordType(_)
                | Error::BinRw(_)
        )
    }

    pub fn is_capacity_error(&self) -> bool {
        matches!(self, Error::TooManyHotCues { .. } | Error::TooManyLoops { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<binrw::Error> for Error {
    fn from(e: binrw::Error) -> Self {
        if e.is_eof() {
            Error::TruncatedRecord(e.to_string())
        } else {
            Error::BinRw(e.to_string())
        }
    }
}

impl From<id3::Error> for Error {
    fn from(e: id3::Error) -> Self {
        Error::Tag(e.to_string())
    }
}
