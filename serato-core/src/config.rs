//! Library configuration

use std::path::PathBuf;

/// Folder name Serato creates under the user's music directory
pub const SERATO_FOLDER: &str = "_Serato_";

/// Crate files live in this folder below the library root
pub const SUBCRATES_FOLDER: &str = "SubCrates";

#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Serato library root (the `_Serato_` folder)
    pub root: PathBuf,
    /// Replace crate files that already exist when saving
    pub overwrite: bool,
    /// Write each track's cues to its tag while saving a crate
    pub write_cues_on_save: bool,
}

impl LibraryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            overwrite: false,
            write_cues_on_save: false,
        }
    }

    pub fn subcrates_dir(&self) -> PathBuf {
        self.root.join(SUBCRATES_FOLDER)
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self::new(default_root())
    }
}

/// `~/Music/_Serato_`, or `./Music/_Serato_` when there is no home directory
pub fn default_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Music")
        .join(SERATO_FOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root() {
        let config = LibraryConfig::default();
        assert!(config.root.ends_with("Music/_Serato_"));
        assert!(!config.overwrite);
        assert!(!config.write_cues_on_save);
    }

    #[test]
    fn test_subcrates_dir() {
        let config = LibraryConfig::new("/tmp/_Serato_");
        assert_eq!(config.subcrates_dir(), PathBuf::from("/tmp/_Serato_/SubCrates"));
    }
}
