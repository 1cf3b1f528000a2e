//! Track references
//!
//! A track is identified by its absolute path; everything else is optional
//! metadata carried along for the Markers2 codec.

use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hotcue::{HotCue, HotCueKind, MAX_HOT_CUES, MAX_LOOPS};

/// File extensions Serato can load
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "aif", "aiff", "flac", "wav", "ogg", "alac"];

/// Absolute form of `path` with `.` and `..` folded away
///
/// Purely lexical; symlinks are not followed and the file need not exist.
pub fn resolve_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            // `pop` keeps the root in place
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

/// A track in a crate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    path: PathBuf,
    /// Average tempo in BPM
    #[serde(default)]
    pub bpm: Option<f64>,
    /// Musical key as Serato displays it (e.g. "Am", "8A")
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub beatgrid: Vec<BeatgridMarker>,
    #[serde(default)]
    hot_cues: Vec<HotCue>,
    #[serde(default)]
    loops: Vec<HotCue>,
}

/// Single beatgrid marker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BeatgridMarker {
    /// Position from track start in seconds
    pub position_secs: f64,
    /// Tempo from this marker on
    pub bpm: f64,
}

impl Track {
    /// Track at `path`, taken as given
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            bpm: None,
            key: None,
            beatgrid: Vec::new(),
            hot_cues: Vec::new(),
            loops: Vec::new(),
        }
    }

    /// Track at `path` made absolute against the working directory
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(resolve_path(path)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hot_cues(&self) -> &[HotCue] {
        &self.hot_cues
    }

    pub fn loops(&self) -> &[HotCue] {
        &self.loops
    }

    pub fn add_beatgrid_marker(&mut self, marker: BeatgridMarker) {
        self.beatgrid.push(marker);
    }

    /// Insert a cue or loop at its slot index
    ///
    /// Entries at or after `index` shift back by one; an index past the end
    /// appends. Fails once the 8 cue / 4 loop slots are used.
    pub fn add_hot_cue(&mut self, cue: HotCue) -> Result<()> {
        let list = match cue.kind {
            HotCueKind::Cue => {
                if self.hot_cues.len() >= MAX_HOT_CUES {
                    return Err(Error::TooManyHotCues { max: MAX_HOT_CUES });
                }
                &mut self.hot_cues
            }
            HotCueKind::Loop => {
                if self.loops.len() >= MAX_LOOPS {
                    return Err(Error::TooManyLoops { max: MAX_LOOPS });
                }
                &mut self.loops
            }
        };
        let at = (cue.index as usize).min(list.len());
        list.insert(at, cue);
        Ok(())
    }

    /// Replace all cues and loops, e.g. with what was read from the file's tag
    pub fn set_hot_cues(&mut self, cues: impl IntoIterator<Item = HotCue>) -> Result<()> {
        self.hot_cues.clear();
        self.loops.clear();
        for cue in cues {
            self.add_hot_cue(cue)?;
        }
        Ok(())
    }

    pub fn has_markers(&self) -> bool {
        !self.hot_cues.is_empty() || !self.loops.is_empty()
    }

    pub fn is_audio_file(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}
