//! Free-form game input

use super::CommandResult;
use crate::core::channel::Transport;
use crate::core::reader::{self, PatternReader};

pub(super) fn execute<T: Transport>(reader: &mut PatternReader<T>, input: &str) -> CommandResult {
    reader.write(input);
    let raw_output = reader.read_until(Some(reader::prompt()));
    CommandResult::from_game_output(input, raw_output)
}
