//! Resolving a game argument to a story file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GamefileError {
    #[error("No game named '{input}' in {dir}")]
    NotFound { input: String, dir: String },

    #[error("Multiple games found for '{input}':\n{}", .matches.join("\n"))]
    Ambiguous { input: String, matches: Vec<String> },

    #[error("Game file does not exist: {0}")]
    Missing(String),

    #[error("Failed to read games directory: {0}")]
    Io(#[from] io::Error),
}

/// A story file and the short name used for its save slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gamefile {
    name: String,
    path: PathBuf,
}

impl Gamefile {
    /// Name is the file stem: `games/zork1.z5` → `zork1`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }

    /// Accept a path (anything with a separator) or a bare game name
    /// looked up in `games_dir`, with or without extension.
    pub fn from_input(input: &str, games_dir: &Path) -> Result<Self, GamefileError> {
        if input.contains('/') || input.contains(std::path::MAIN_SEPARATOR) {
            let gamefile = Self::new(input);
            if !gamefile.exists() {
                return Err(GamefileError::Missing(input.to_string()));
            }
            return Ok(gamefile);
        }

        let mut matches: Vec<PathBuf> = fs::read_dir(games_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name().is_some_and(|n| n == input)
                    || path.file_stem().is_some_and(|s| s == input)
            })
            .collect();
        matches.sort();

        match matches.len() {
            0 => Err(GamefileError::NotFound {
                input: input.to_string(),
                dir: games_dir.display().to_string(),
            }),
            1 => Ok(Self::new(matches.remove(0))),
            _ => Err(GamefileError::Ambiguous {
                input: input.to_string(),
                matches: matches
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .collect(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn games(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            fs::write(dir.path().join(file), b"story").unwrap();
        }
        dir
    }

    #[test]
    fn test_name_is_file_stem() {
        let game = Gamefile::new("games/zork1.z5");
        assert_eq!(game.name(), "zork1");
        assert_eq!(game.path(), Path::new("games/zork1.z5"));
    }

    #[test]
    fn test_bare_name_lookup() {
        let dir = games(&["zork1.z5", "hhgg.z3"]);

        let game = Gamefile::from_input("zork1", dir.path()).unwrap();
        assert_eq!(game.name(), "zork1");
        assert_eq!(game.path(), dir.path().join("zork1.z5"));

        let game = Gamefile::from_input("hhgg.z3", dir.path()).unwrap();
        assert_eq!(game.name(), "hhgg");
    }

    #[test]
    fn test_ambiguous_name() {
        let dir = games(&["zork1.z3", "zork1.z5"]);

        match Gamefile::from_input("zork1", dir.path()) {
            Err(GamefileError::Ambiguous { matches, .. }) => {
                assert_eq!(matches, vec!["zork1.z3", "zork1.z5"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_name() {
        let dir = games(&["zork1.z5"]);
        assert!(matches!(
            Gamefile::from_input("zork2", dir.path()),
            Err(GamefileError::NotFound { .. })
        ));
    }

    #[test]
    fn test_explicit_path() {
        let dir = games(&["story.z8"]);
        let input = dir.path().join("story.z8");

        let game = Gamefile::from_input(input.to_str().unwrap(), Path::new("unused")).unwrap();
        assert_eq!(game.name(), "story");

        let missing = dir.path().join("nothing.z8");
        assert!(matches!(
            Gamefile::from_input(missing.to_str().unwrap(), Path::new("unused")),
            Err(GamefileError::Missing(_))
        ));
    }
}
