//! Command dialogues.
//!
//! Each user-facing command is a short scripted exchange with the
//! interpreter: a few writes, each followed by a pattern-bounded read,
//! including whatever confirmation the interpreter asks for along the way.
//!
//! - **start**: consume the banner, page through "press any key" and
//!   decline the introduction
//! - **action**: any free-form game input
//! - **score**: ask for the score and pick out `N (total of M)`
//! - **save** / **restore**: name a slot, answer the filename prompt and
//!   the overwrite confirmation
//! - **quit**: quit, confirm and tear the process down

mod action;
mod quit;
mod restore;
pub mod result;
mod save;
mod score;
mod start;

use std::path::Path;

use crate::core::channel::Transport;
use crate::core::reader::PatternReader;
use crate::savefile::Savefile;

pub use result::{CommandResult, Operation};

/// One logical command, parsed from player input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Consume the opening text. Not reachable from player input.
    Start,
    Action(String),
    Score,
    Save(Savefile),
    Restore(Savefile),
    Quit,
}

impl Command {
    /// Recognize `score`, `save [slot]`, `restore [slot]` and `quit`
    /// (case-insensitive); anything else is passed to the game verbatim.
    ///
    /// `save` and `restore` are always intercepted, whatever follows them:
    /// only the first argument names the slot, the rest is dropped. Passed
    /// through, they would let the interpreter ask for a filename of its own.
    pub fn parse(input: &str, game_name: &str) -> Self {
        let trimmed = input.trim();
        let lowered = trimmed.to_lowercase();
        let mut words = lowered.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let slot = words.next().unwrap_or_default();

        match (verb, slot) {
            ("score", "") => Command::Score,
            ("quit", "") => Command::Quit,
            ("save", _) => Command::Save(Savefile::new(game_name, slot)),
            ("restore", _) => Command::Restore(Savefile::new(game_name, slot)),
            _ => Command::Action(trimmed.to_string()),
        }
    }

    /// Text sent to the interpreter to open the dialogue
    pub fn input(&self) -> Option<&str> {
        match self {
            Command::Start => None,
            Command::Action(input) => Some(input),
            Command::Score => Some(score::INPUT),
            Command::Save(_) => Some(save::INPUT),
            Command::Restore(_) => Some(restore::INPUT),
            Command::Quit => Some(quit::INPUT),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Command::Start => Operation::Start,
            Command::Action(_) => Operation::Action,
            Command::Score => Operation::Score,
            Command::Save(_) => Operation::Save,
            Command::Restore(_) => Operation::Restore,
            Command::Quit => Operation::Quit,
        }
    }

    /// Run the dialogue. `save_root` is the interpreter's working
    /// directory, used to check and prepare save files.
    ///
    /// Callers are expected to have checked that the game is running.
    pub fn execute<T: Transport>(
        &self,
        reader: &mut PatternReader<T>,
        save_root: &Path,
    ) -> CommandResult {
        match self {
            Command::Start => start::execute(reader),
            Command::Action(input) => action::execute(reader, input),
            Command::Score => score::execute(reader),
            Command::Save(savefile) => save::execute(reader, savefile, save_root),
            Command::Restore(savefile) => restore::execute(reader, savefile, save_root),
            Command::Quit => quit::execute(reader),
        }
    }
}
