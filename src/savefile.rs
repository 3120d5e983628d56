//! Save slots and their on-disk filenames
//!
//! A slot is a named save bucket per game. Players (and agents) only ever
//! name a slot; the filename handed to the interpreter is derived from it,
//! so nobody gets to write to an arbitrary path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Slot used when none is given, and for quit-time saves
pub const AUTOSAVE_SLOT: &str = "autosave";

/// Directory, relative to the interpreter's working directory
pub const SAVE_DIR: &str = "saves";

/// Extension of the interpreter's save format
pub const SAVE_EXTENSION: &str = "qzl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Savefile {
    game_name: String,
    slot: String,
}

impl Savefile {
    /// Blank slots fall back to [`AUTOSAVE_SLOT`]. Characters that could
    /// escape the save directory are replaced with `_`.
    pub fn new(game_name: &str, slot: &str) -> Self {
        let slot: String = slot
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        Self {
            game_name: game_name.to_string(),
            slot: if slot.is_empty() {
                AUTOSAVE_SLOT.to_string()
            } else {
                slot
            },
        }
    }

    pub fn autosave(game_name: &str) -> Self {
        Self::new(game_name, AUTOSAVE_SLOT)
    }

    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// `saves/<game>_<slot>.qzl`
    pub fn filename(&self) -> String {
        let basename = if self.game_name.is_empty() {
            self.slot.clone()
        } else {
            format!("{}_{}", self.game_name, self.slot)
        };
        format!("{}/{}.{}", SAVE_DIR, basename, SAVE_EXTENSION)
    }

    /// Location of the file for an interpreter running in `root`
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(self.filename())
    }

    pub fn exists_in(&self, root: &Path) -> bool {
        self.path_in(root).is_file()
    }

    /// Make sure the interpreter can create the file
    pub fn ensure_dir(&self, root: &Path) -> io::Result<()> {
        fs::create_dir_all(root.join(SAVE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_derivation() {
        assert_eq!(
            Savefile::new("zork1", "autosave").filename(),
            "saves/zork1_autosave.qzl"
        );
        assert_eq!(Savefile::new("zork1", "mine").filename(), "saves/zork1_mine.qzl");
    }

    #[test]
    fn test_blank_slot_is_autosave() {
        let expected = "saves/zork1_autosave.qzl";
        assert_eq!(Savefile::new("zork1", "").filename(), expected);
        assert_eq!(Savefile::new("zork1", "   ").filename(), expected);
        assert_eq!(Savefile::autosave("zork1").filename(), expected);
    }

    #[test]
    fn test_slot_cannot_escape_save_dir() {
        let save = Savefile::new("zork1", "../../etc/passwd");
        assert_eq!(save.slot(), "______etc_passwd");
        assert_eq!(save.filename(), "saves/zork1_______etc_passwd.qzl");
    }

    #[test]
    fn test_exists_in_root() {
        let root = tempfile::tempdir().unwrap();
        let save = Savefile::new("zork1", "before-troll");
        assert!(!save.exists_in(root.path()));

        save.ensure_dir(root.path()).unwrap();
        fs::write(save.path_in(root.path()), b"IFZS").unwrap();
        assert!(save.exists_in(root.path()));
        assert!(!Savefile::new("zork2", "before-troll").exists_in(root.path()));
    }
}
