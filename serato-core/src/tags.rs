//! Access to named binary objects inside an audio file's tag
//!
//! Serato keeps its per-track data in ID3v2 `GEOB` frames, one per object,
//! told apart by the frame description ("Serato Markers2", "Serato Analysis", ...).

use std::path::Path;

use id3::frame::{Content, EncapsulatedObject, Frame};
use id3::{ErrorKind, Tag, TagLike, Version};

use crate::error::Result;

/// GEOB description (and identifier) of the hot cue object
pub const MARKERS2_ID: &str = "Serato Markers2";

const GEOB_MIME: &str = "application/octet-stream";

/// Reads and writes named binary objects in a track's tag
pub trait TagContainer {
    /// Object data, or `None` when the file has no tag or no such object
    fn read_object(&self, path: &Path, id: &str) -> Result<Option<Vec<u8>>>;

    /// Create or replace the object `id`
    fn write_object(&self, path: &Path, id: &str, data: &[u8], description: &str) -> Result<()>;
}

/// [`TagContainer`] over ID3v2 GEOB frames
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3Tags;

impl Id3Tags {
    fn read_tag(path: &Path) -> Result<Option<Tag>> {
        match Tag::read_from_path(path) {
            Ok(tag) => Ok(Some(tag)),
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl TagContainer for Id3Tags {
    fn read_object(&self, path: &Path, id: &str) -> Result<Option<Vec<u8>>> {
        let Some(tag) = Self::read_tag(path)? else {
            return Ok(None);
        };
        let data = tag
            .encapsulated_objects()
            .find(|obj| obj.description == id)
            .map(|obj| obj.data.clone());
        Ok(data)
    }

    /// ID3 identifies GEOB frames by description alone, so `description` is
    /// what later reads must ask for.
    fn write_object(&self, path: &Path, _id: &str, data: &[u8], description: &str) -> Result<()> {
        let mut tag = Self::read_tag(path)?.unwrap_or_else(Tag::new);
        let version = match tag.version() {
            Version::Id3v22 => Version::Id3v23,
            v => v,
        };

        let object = EncapsulatedObject {
            mime_type: GEOB_MIME.to_string(),
            filename: String::new(),
            description: description.to_string(),
            data: data.to_vec(),
        };
        // GEOB frames conflict by description, so an existing object is replaced
        tag.add_frame(Frame::with_content("GEOB", Content::EncapsulatedObject(object)));

        tag.write_to_path(path, version)?;
        Ok(())
    }
}
