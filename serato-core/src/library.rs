//! Serato library folder access
//!
//! Ties the codecs to the filesystem and the tag container:
//! - `_Serato_/SubCrates/*.crate` -> crate trees, and back
//! - `Serato Markers2` GEOB objects -> hot cues, and back

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{LibraryConfig, SUBCRATES_FOLDER};
use crate::crate_file::{build_payload, parse_track_paths};
use crate::crates::{merge_into, parse_crate_names, Crate, CRATE_EXTENSION};
use crate::error::Result;
use crate::hotcue::HotCue;
use crate::markers2;
use crate::tags::{Id3Tags, TagContainer, MARKERS2_ID};
use crate::track::Track;

/// Read every `.crate` file in `dir` into trees keyed by top-level name
///
/// Files sharing a path prefix (`A.crate`, `A%%B.crate`) end up in one tree.
pub fn parse_crates_from_root_path<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, Crate>> {
    let dir = dir.as_ref();
    let mut registry = BTreeMap::new();

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            warn!("Skipping non UTF-8 file name: {:?}", path);
            continue;
        };
        if name.ends_with(CRATE_EXTENSION) {
            files.push((name, path));
        }
    }
    files.sort();

    for (name, path) in files {
        let data = fs::read(&path)?;
        match build_crate_chain(&name, &data) {
            Some(node) => merge_into(&mut registry, node),
            None => warn!("Skipping crate file without a name: {:?}", path),
        }
    }

    info!("Loaded {} crates from {:?}", registry.len(), dir);
    Ok(registry)
}

/// Crate chain for one file; duplicate paths inside a file are dropped
fn build_crate_chain(file_name: &str, data: &[u8]) -> Option<Crate> {
    let tracks: Vec<Track> = parse_track_paths(data).into_iter().map(Track::new).collect();
    let parsed = tracks.len();

    let names = parse_crate_names(file_name);
    let node = Crate::from_file_chain(&names, tracks)?;

    // A file describes a single chain, so the last node is its leaf
    let kept = node.files().last().map_or(0, |(leaf, _)| leaf.tracks().len());
    if kept < parsed {
        warn!("Dropped {} duplicate tracks in {}", parsed - kept, file_name);
    }
    debug!("Parsed {}: {} tracks", file_name, kept);
    Some(node)
}

/// Write one file per node of `root` into `<destination>/SubCrates`
///
/// Existing files are kept unless `overwrite` is set. Returns the files written.
pub fn save_crate<P: AsRef<Path>>(root: &Crate, destination: P, overwrite: bool) -> Result<Vec<PathBuf>> {
    write_crate_files(root, destination.as_ref(), overwrite, |_| Ok(()))
}

/// Shared by [`save_crate`] and [`Library::save_crate`]; `on_written` runs
/// for every node whose file was (re)written
fn write_crate_files<F>(
    root: &Crate,
    destination: &Path,
    overwrite: bool,
    mut on_written: F,
) -> Result<Vec<PathBuf>>
where
    F: FnMut(&Crate) -> Result<()>,
{
    let subcrates_dir = destination.join(SUBCRATES_FOLDER);
    fs::create_dir_all(&subcrates_dir)?;

    let mut written = Vec::new();
    for (node, file_name) in root.files() {
        let path = subcrates_dir.join(&file_name);

        if path.exists() && !overwrite {
            debug!("Skipping existing crate file: {:?}", path);
            continue;
        }

        let payload = build_payload(node)?;
        fs::write(&path, &payload)?;
        debug!("Wrote {} ({} bytes, {} tracks)", file_name, payload.len(), node.tracks().len());

        on_written(node)?;
        written.push(path);
    }

    info!("Saved crate {} ({} files) to {:?}", root.name(), written.len(), subcrates_dir);
    Ok(written)
}

/// Hot cues and loops stored in a track's tag
///
/// A file without a tag or without a Markers2 object has no cues.
pub fn read_hot_cues<P: AsRef<Path>>(tags: &dyn TagContainer, track_path: P) -> Result<Vec<HotCue>> {
    let track_path = track_path.as_ref();
    match tags.read_object(track_path, MARKERS2_ID)? {
        Some(data) => markers2::decode_hot_cues(&data),
        None => {
            debug!("No {} object in {:?}", MARKERS2_ID, track_path);
            Ok(Vec::new())
        }
    }
}

/// Replace the Markers2 object of a track with its in-memory cues and loops
pub fn write_hot_cues(tags: &dyn TagContainer, track: &Track) -> Result<()> {
    let payload = markers2::encode(track)?;
    tags.write_object(track.path(), MARKERS2_ID, &payload, MARKERS2_ID)?;
    debug!(
        "Wrote {} cues, {} loops to {:?}",
        track.hot_cues().len(),
        track.loops().len(),
        track.path()
    );
    Ok(())
}

/// A Serato library folder plus the tag container used for its tracks
pub struct Library {
    config: LibraryConfig,
    tags: Box<dyn TagContainer>,
}

impl Library {
    /// Library using ID3 tags
    pub fn new(config: LibraryConfig) -> Self {
        Self::with_tags(config, Id3Tags)
    }

    pub fn with_tags(config: LibraryConfig, tags: impl TagContainer + 'static) -> Self {
        Self {
            config,
            tags: Box::new(tags),
        }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// All crates under `SubCrates`; empty when the folder does not exist
    pub fn load_crates(&self) -> Result<BTreeMap<String, Crate>> {
        let dir = self.config.subcrates_dir();
        if !dir.is_dir() {
            warn!("No crate folder at {:?}", dir);
            return Ok(BTreeMap::new());
        }
        parse_crates_from_root_path(dir)
    }

    /// Save a crate tree, optionally writing each track's cues as well
    pub fn save_crate(&self, root: &Crate) -> Result<Vec<PathBuf>> {
        let write_cues = self.config.write_cues_on_save;
        write_crate_files(root, &self.config.root, self.config.overwrite, |node| {
            if !write_cues {
                return Ok(());
            }
            for track in node.tracks().iter().filter(|t| t.has_markers()) {
                write_hot_cues(self.tags.as_ref(), track)?;
            }
            Ok(())
        })
    }

    pub fn read_hot_cues<P: AsRef<Path>>(&self, track_path: P) -> Result<Vec<HotCue>> {
        read_hot_cues(self.tags.as_ref(), track_path)
    }

    /// Replace `track`'s in-memory cues with the ones in its tag
    pub fn load_hot_cues(&self, track: &mut Track) -> Result<()> {
        let cues = self.read_hot_cues(track.path())?;
        track.set_hot_cues(cues)
    }

    pub fn write_hot_cues(&self, track: &Track) -> Result<()> {
        write_hot_cues(self.tags.as_ref(), track)
    }
}
