//! Quit dialogue: quit, confirm, tear down

use tracing::{debug, info};

use super::{CommandResult, Operation};
use crate::core::channel::Transport;
use crate::core::reader::PatternReader;

pub(super) const INPUT: &str = "quit";

pub(super) fn execute<T: Transport>(reader: &mut PatternReader<T>) -> CommandResult {
    if !reader.write(INPUT) {
        debug!("Interpreter gone before quit");
    }
    // Give the interpreter time to reach its "Are you sure?" prompt
    reader.pause(reader.timing().quit_delay());
    if !reader.write("y") {
        debug!("Interpreter exited before confirmation");
    }

    // Whatever the writes did, the process does not outlive the dialogue
    reader.terminate();
    info!("Game quit");

    CommandResult::new(Operation::Quit, Some(INPUT)).with_message("Game quit successfully")
}
