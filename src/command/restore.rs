//! Restore dialogue

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use super::{CommandResult, Operation};
use crate::core::channel::Transport;
use crate::core::reader::{self, PatternReader};
use crate::savefile::Savefile;

pub(super) const INPUT: &str = "restore";

const OK: &str = "Ok.";
const FAILED: &str = "Failed.";
const NOT_FOUND: &str = "not found";

static FILENAME_REPLY: OnceLock<Regex> = OnceLock::new();

pub(super) fn execute<T: Transport>(
    reader: &mut PatternReader<T>,
    savefile: &Savefile,
    save_root: &Path,
) -> CommandResult {
    let result = CommandResult::new(Operation::Restore, Some(INPUT))
        .with_detail("slot", savefile.slot())
        .with_detail("filename", savefile.filename());

    // Checked up front so a missing slot never reaches the interpreter
    if !savefile.exists_in(save_root) {
        return result
            .with_success(false)
            .with_message("Restore failed - file not found");
    }

    reader.write(INPUT);
    reader.read_until(Some(reader::filename_prompt()));
    reader.write(&savefile.filename());

    let transcript = reader.read_until(Some(reader::any_or_prompt(
        &FILENAME_REPLY,
        &[OK, FAILED, NOT_FOUND],
    )));

    let success = transcript.contains(OK);
    let message = if success {
        info!("Restored slot {}", savefile.slot());
        "Game restored successfully"
    } else if transcript.contains("Failed") || transcript.contains(NOT_FOUND) {
        warn!("Interpreter rejected {}", savefile.filename());
        "Restore failed - file not found by interpreter or unreadable"
    } else {
        "Restore operation completed"
    };

    result
        .with_output(transcript)
        .with_success(success)
        .with_message(message)
}
