//! Crate hierarchy and its flat on-disk naming
//!
//! Serato stores every node of a crate tree as its own file in `SubCrates/`,
//! naming it after the path from the root: `DJ Sets%%2024%%Warmup.crate`.
//! Each file only lists the tracks assigned directly to that node.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::track::Track;

/// Separator between nested crate names in a file name
pub const PATH_SEPARATOR: &str = "%%";

/// Crate file extension, including the dot
pub const CRATE_EXTENSION: &str = ".crate";

/// Replace every character outside `[A-Za-z0-9_ ]` with `-`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ' ' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// File name for a chain of crate names, root first
pub fn crate_file_name<S: AsRef<str>>(names: &[S]) -> String {
    let joined: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();
    format!("{}{}", joined.join(PATH_SEPARATOR), CRATE_EXTENSION)
}

/// Split a crate file name back into its chain of names, root first
pub fn parse_crate_names(file_name: &str) -> Vec<String> {
    file_name
        .split(PATH_SEPARATOR)
        .map(|part| part.replacen(CRATE_EXTENSION, "", 1))
        .collect()
}

/// A named collection of tracks with nested child crates
#[derive(Debug, Clone, Serialize)]
pub struct Crate {
    name: String,
    /// Insertion order is file order
    tracks: Vec<Track>,
    /// Membership index over `tracks`
    #[serde(skip)]
    paths: HashSet<PathBuf>,
    children: BTreeMap<String, Crate>,
}

impl Crate {
    pub fn new(name: &str) -> Self {
        Self {
            name: sanitize_name(name),
            tracks: Vec::new(),
            paths: HashSet::new(),
            children: BTreeMap::new(),
        }
    }

    /// Crate with children; children sharing a name are merged
    pub fn with_children(name: &str, children: impl IntoIterator<Item = Crate>) -> Self {
        let mut result = Self::new(name);
        for child in children {
            result.add_child(child);
        }
        result
    }

    /// Build the chain described by one crate file
    ///
    /// `tracks` go to the innermost crate, repeated paths only once.
    /// Returns `None` for an empty chain.
    pub fn from_file_chain<S: AsRef<str>>(names: &[S], tracks: Vec<Track>) -> Option<Self> {
        let (leaf_name, parents) = names.split_last()?;
        let mut leaf = Crate::new(leaf_name.as_ref());
        for track in tracks {
            leaf.insert_track(track);
        }

        Some(
            parents
                .iter()
                .rev()
                .fold(leaf, |child, name| Crate::with_children(name.as_ref(), [child])),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn children(&self) -> impl Iterator<Item = &Crate> {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&Crate> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Crate> {
        self.children.get_mut(name)
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.paths.contains(track.path())
    }

    /// Total number of crates in this tree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(Crate::node_count).sum::<usize>()
    }

    pub fn add_track(&mut self, track: Track) -> Result<()> {
        if self.contains(&track) {
            return Err(Error::DuplicateTrack {
                track: track.path().to_path_buf(),
                crate_name: self.name.clone(),
            });
        }
        self.insert_track(track);
        Ok(())
    }

    /// Append unless already present
    fn insert_track(&mut self, track: Track) {
        if self.paths.insert(track.path().to_path_buf()) {
            self.tracks.push(track);
        }
    }

    /// Attach a child, merging it into an existing child of the same name
    pub fn add_child(&mut self, child: Crate) {
        match self.children.get_mut(&child.name) {
            Some(existing) => existing.absorb(child),
            None => {
                self.children.insert(child.name.clone(), child);
            }
        }
    }

    /// Union of two equally named trees
    pub fn merge(&self, other: &Crate) -> Result<Crate> {
        if self.name != other.name {
            return Err(Error::CrateNameMismatch {
                left: self.name.clone(),
                right: other.name.clone(),
            });
        }
        let mut merged = self.clone();
        merged.absorb(other.clone());
        Ok(merged)
    }

    /// Move `other`'s tracks and children into `self`; names must match
    fn absorb(&mut self, other: Crate) {
        debug_assert_eq!(self.name, other.name);
        for track in other.tracks {
            self.insert_track(track);
        }
        for child in other.children.into_values() {
            self.add_child(child);
        }
    }

    /// Every node with the file name it is stored under
    pub fn files(&self) -> CrateFiles<'_> {
        CrateFiles {
            stack: vec![(self, String::new())],
        }
    }
}

impl PartialEq for Crate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.tracks.len() == other.tracks.len()
            && self.tracks.iter().all(|t| other.contains(t))
            && self.children == other.children
    }
}

impl Eq for Crate {}

impl fmt::Display for Crate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Crate<{}>", self.name)
    }
}

/// Preorder walk over a crate tree yielding `(node, file name)`
///
/// Children are visited in name order. Created by [`Crate::files`].
pub struct CrateFiles<'a> {
    stack: Vec<(&'a Crate, String)>,
}

impl<'a> Iterator for CrateFiles<'a> {
    type Item = (&'a Crate, String);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, prefix) = self.stack.pop()?;
        let path = format!("{}{}{}", prefix, node.name, PATH_SEPARATOR);

        for child in node.children.values().rev() {
            self.stack.push((child, path.clone()));
        }

        let stem = path.strip_suffix(PATH_SEPARATOR).unwrap_or(&path);
        Some((node, format!("{}{}", stem, CRATE_EXTENSION)))
    }
}

/// Fold `node` into a registry keyed by top-level crate name
pub fn merge_into(registry: &mut BTreeMap<String, Crate>, node: Crate) {
    match registry.get_mut(&node.name) {
        Some(existing) => existing.absorb(node),
        None => {
            registry.insert(node.name.clone(), node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crate_with(name: &str, paths: &[&str]) -> Crate {
        let mut c = Crate::new(name);
        for p in paths {
            c.add_track(Track::new(*p)).unwrap();
        }
        c
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(Crate::new("My/Crate:1").name(), "My-Crate-1");
        assert_eq!(Crate::new("DJ Sets_2024").name(), "DJ Sets_2024");
        assert_eq!(sanitize_name("a%%b.crate"), "a--b-crate");
        assert_eq!(sanitize_name("Café"), "Caf-");
    }

    #[test]
    fn test_duplicate_track() {
        let mut c = Crate::new("A");
        c.add_track(Track::new("/x/a.mp3")).unwrap();
        let err = c.add_track(Track::new("/x/a.mp3")).unwrap_err();
        assert!(matches!(err, Error::DuplicateTrack { .. }));
        assert_eq!(c.tracks().len(), 1);
    }

    #[test]
    fn test_three_level_file_names() {
        let c = Crate::new("C");
        let b = Crate::with_children("B", [c]);
        let a = Crate::with_children("A", [b]);

        let names: Vec<String> = a.files().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["A.crate", "A%%B.crate", "A%%B%%C.crate"]);
    }

    #[test]
    fn test_file_walk_visits_every_node_once() {
        let tree = Crate::with_children(
            "Root",
            [
                Crate::with_children("Beta", [Crate::new("Deep")]),
                Crate::new("Alpha"),
            ],
        );

        let files: Vec<(String, String)> = tree
            .files()
            .map(|(node, name)| (node.name().to_string(), name))
            .collect();

        assert_eq!(
            files,
            vec![
                ("Root".to_string(), "Root.crate".to_string()),
                ("Alpha".to_string(), "Root%%Alpha.crate".to_string()),
                ("Beta".to_string(), "Root%%Beta.crate".to_string()),
                ("Deep".to_string(), "Root%%Beta%%Deep.crate".to_string()),
            ]
        );
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_parse_crate_names() {
        assert_eq!(parse_crate_names("DJ Sets%%2024.crate"), vec!["DJ Sets", "2024"]);
        assert_eq!(parse_crate_names("Solo.crate"), vec!["Solo"]);
        assert_eq!(crate_file_name(&["DJ Sets", "2024"]), "DJ Sets%%2024.crate");
    }

    #[test]
    fn test_from_file_chain() {
        let names = parse_crate_names("A%%B%%C.crate");
        let root = Crate::from_file_chain(&names, vec![Track::new("/t.mp3")]).unwrap();

        assert_eq!(root.name(), "A");
        assert!(root.tracks().is_empty());
        let b = root.child("B").unwrap();
        assert!(b.tracks().is_empty());
        let c = b.child("C").unwrap();
        assert_eq!(c.tracks().len(), 1);

        let empty: [&str; 0] = [];
        assert!(Crate::from_file_chain(&empty, Vec::new()).is_none());
    }

    #[test]
    fn test_from_file_chain_drops_repeated_paths() {
        let tracks = vec![Track::new("/a.mp3"), Track::new("/b.mp3"), Track::new("/a.mp3")];
        let leaf = Crate::from_file_chain(&["A"], tracks).unwrap();

        let paths: Vec<&str> = leaf.tracks().iter().map(|t| t.path().to_str().unwrap()).collect();
        assert_eq!(paths, vec!["/a.mp3", "/b.mp3"]);
        assert_eq!(leaf, crate_with("A", &["/b.mp3", "/a.mp3"]));

        let mut again = leaf.clone();
        assert!(again.add_track(Track::new("/b.mp3")).is_err());
    }

    #[test]
    fn test_merge_disjoint() {
        let a = crate_with("Mix", &["/a.mp3", "/b.mp3"]);
        let b = crate_with("Mix", &["/c.mp3"]);
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.tracks().len(), a.tracks().len() + b.tracks().len());
        assert!(merged.contains(&Track::new("/c.mp3")));
    }

    #[test]
    fn test_merge_overlapping_dedups() {
        let a = crate_with("Mix", &["/a.mp3", "/b.mp3"]);
        let b = crate_with("Mix", &["/b.mp3", "/c.mp3"]);
        assert_eq!(a.merge(&b).unwrap().tracks().len(), 3);
    }

    #[test]
    fn test_merge_name_mismatch() {
        let err = Crate::new("A").merge(&Crate::new("B")).unwrap_err();
        assert!(matches!(err, Error::CrateNameMismatch { .. }));
    }

    #[test]
    fn test_merge_children_by_name() {
        let left = Crate::with_children("Root", [crate_with("Shared", &["/1.mp3"])]);
        let right = Crate::with_children(
            "Root",
            [crate_with("Shared", &["/2.mp3"]), Crate::new("Other")],
        );
        let merged = left.merge(&right).unwrap();

        assert_eq!(merged.children().count(), 2);
        assert_eq!(merged.child("Shared").unwrap().tracks().len(), 2);
        assert!(merged.child("Other").is_some());
        // Inputs untouched
        assert_eq!(left.child("Shared").unwrap().tracks().len(), 1);
    }

    #[test]
    fn test_equality_ignores_track_order() {
        let a = crate_with("X", &["/1.mp3", "/2.mp3"]);
        let b = crate_with("X", &["/2.mp3", "/1.mp3"]);
        assert_eq!(a, b);

        let c = crate_with("X", &["/1.mp3"]);
        assert_ne!(a, c);

        let d = Crate::with_children("X", [Crate::new("child")]);
        assert_ne!(Crate::new("X"), d);
    }

    #[test]
    fn test_merge_into_registry() {
        let mut registry = BTreeMap::new();
        for file in ["A.crate", "A%%B.crate", "A%%B%%C.crate", "Z.crate"] {
            let names = parse_crate_names(file);
            let node = Crate::from_file_chain(&names, vec![Track::new(format!("/{file}.mp3"))]).unwrap();
            merge_into(&mut registry, node);
        }

        assert_eq!(registry.len(), 2);
        let a = &registry["A"];
        assert_eq!(a.tracks().len(), 1);
        assert_eq!(a.child("B").unwrap().tracks().len(), 1);
        assert_eq!(a.child("B").unwrap().child("C").unwrap().tracks().len(), 1);
        assert_eq!(a.node_count(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(Crate::new("House").to_string(), "Crate<House>");
    }
}
