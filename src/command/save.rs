//! Save dialogue: filename prompt, then the overwrite confirmation

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use super::{CommandResult, Operation};
use crate::core::channel::Transport;
use crate::core::reader::{self, PatternReader};
use crate::savefile::Savefile;

pub(super) const INPUT: &str = "save";

const OVERWRITE: &str = "Overwrite existing file? ";
const OK: &str = "Ok.";
const FAILED: &str = "Failed.";

static FILENAME_REPLY: OnceLock<Regex> = OnceLock::new();
static OVERWRITE_REPLY: OnceLock<Regex> = OnceLock::new();

pub(super) fn execute<T: Transport>(
    reader: &mut PatternReader<T>,
    savefile: &Savefile,
    save_root: &Path,
) -> CommandResult {
    // The interpreter reports a missing directory only as "Failed."
    if let Err(e) = savefile.ensure_dir(save_root) {
        warn!("Cannot create save directory under {}: {}", save_root.display(), e);
    }

    // An existing file is left alone here: the interpreter asks before
    // overwriting, and keeps the old save if writing the new one fails.
    reader.write(INPUT);
    reader.read_until(Some(reader::filename_prompt()));
    reader.write(&savefile.filename());

    let mut transcript = reader.read_until(Some(reader::any_or_prompt(
        &FILENAME_REPLY,
        &[OVERWRITE, OK, FAILED],
    )));

    if transcript.contains(OVERWRITE.trim_end()) {
        reader.write("y");
        let confirmed = reader.read_until(Some(reader::any_or_prompt(
            &OVERWRITE_REPLY,
            &[OK, FAILED],
        )));
        transcript.push_str(&confirmed);
    }

    let success = transcript.contains(OK);
    let message = if success {
        info!("Saved slot {} to {}", savefile.slot(), savefile.filename());
        format!("[{}] Game saved successfully", savefile.slot())
    } else if transcript.contains(FAILED) {
        "Save operation failed".to_string()
    } else {
        "Save operation completed".to_string()
    };

    CommandResult::new(Operation::Save, Some(INPUT))
        .with_output(transcript)
        .with_success(success)
        .with_message(message)
        .with_detail("slot", savefile.slot())
        .with_detail("filename", savefile.filename())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timing;
    use crate::core::testing::ScriptedTransport;
    use serde_json::Value;

    const FILENAME_PROMPT: &str = "Please enter a filename [zork1.qzl]: ";

    fn timing() -> Timing {
        Timing {
            timeout_ms: 50,
            poll_interval_ms: 5,
            command_delay_ms: 0,
            quit_delay_ms: 0,
        }
    }

    #[test]
    fn test_save_new_file() {
        let root = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new("")
            .reply(FILENAME_PROMPT)
            .reply("Ok.\n\n>");
        let mut reader = PatternReader::new(transport, timing());
        let savefile = Savefile::autosave("zork1");

        let result = execute(&mut reader, &savefile, root.path());

        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("[autosave] Game saved successfully"));
        assert_eq!(
            reader.transport().writes,
            vec!["save", "saves/zork1_autosave.qzl"]
        );
        assert_eq!(result.detail("slot"), Some(&Value::from("autosave")));
        assert_eq!(
            result.detail("filename"),
            Some(&Value::from("saves/zork1_autosave.qzl"))
        );
        assert!(root.path().join("saves").is_dir());
    }

    #[test]
    fn test_save_confirms_overwrite() {
        let root = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new("")
            .reply(FILENAME_PROMPT)
            .reply("Overwrite existing file? ")
            .reply("Ok.\n\n>");
        let mut reader = PatternReader::new(transport, timing());

        let result = execute(&mut reader, &Savefile::new("zork1", "troll"), root.path());

        assert!(result.success);
        assert_eq!(
            reader.transport().writes,
            vec!["save", "saves/zork1_troll.qzl", "y"]
        );
        assert!(result.raw_output.contains("Overwrite existing file?"));
        assert!(result.raw_output.contains("Ok."));
    }

    #[test]
    fn test_save_failure() {
        let root = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new("")
            .reply(FILENAME_PROMPT)
            .reply("Failed.\n\n>");
        let mut reader = PatternReader::new(transport, timing());

        let result = execute(&mut reader, &Savefile::autosave("zork1"), root.path());

        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("Save operation failed"));
    }

    #[test]
    fn test_save_ambiguous_completion() {
        let root = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new("")
            .reply(FILENAME_PROMPT)
            .reply("\n>");
        let mut reader = PatternReader::new(transport, timing());

        let result = execute(&mut reader, &Savefile::autosave("zork1"), root.path());

        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("Save operation completed"));
    }
}
