//! Opening dialogue: banner, pagination, introduction

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{CommandResult, Operation};
use crate::core::channel::Transport;
use crate::core::reader::{self, PatternReader};

/// Upper bound on "press any key" pages answered
const MAX_CONTINUATIONS: usize = 5;

static CONTINUATION: OnceLock<Regex> = OnceLock::new();

/// `[Press any key]`, `Hit RETURN to continue`, `More ...`
fn continuation() -> &'static Regex {
    CONTINUATION.get_or_init(|| {
        Regex::new(r"(?i)^\W*(Press|Hit|More)\s+.*$").expect("continuation pattern compiles")
    })
}

fn is_continuation(line: &str) -> bool {
    let line = line.trim_end_matches(['\r', '\n']);
    !line.is_empty() && continuation().is_match(line)
}

pub(super) fn execute<T: Transport>(reader: &mut PatternReader<T>) -> CommandResult {
    let banner = reader.read_until(Some(reader::prompt()));
    let mut lines: Vec<String> = banner.split_inclusive('\n').map(str::to_string).collect();

    let mut remaining = MAX_CONTINUATIONS;
    while remaining > 0 && lines.last().is_some_and(|line| is_continuation(line)) {
        // The pagination line itself is not part of the story
        lines.pop();
        debug!("Answering continuation prompt");
        reader.write(" ");
        let page = reader.read_until(Some(reader::prompt()));
        lines.extend(page.split_inclusive('\n').map(str::to_string));
        remaining -= 1;
    }

    let mut raw_output = lines.concat();

    if raw_output.contains("introduction") {
        debug!("Declining introduction");
        reader.write("no");
        raw_output.push_str(&reader.read_until(Some(reader::prompt())));
    }

    CommandResult::new(Operation::Start, None).with_output(raw_output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timing;
    use crate::core::testing::ScriptedTransport;

    fn timing() -> Timing {
        Timing {
            timeout_ms: 50,
            poll_interval_ms: 5,
            command_delay_ms: 0,
            quit_delay_ms: 0,
        }
    }

    #[test]
    fn test_plain_banner() {
        let transport = ScriptedTransport::new("ZORK I: The Great Underground Empire\n\nWest of House\n\n>");
        let mut reader = PatternReader::new(transport, timing());

        let result = execute(&mut reader);
        assert_eq!(result.operation, Operation::Start);
        assert!(result.success);
        assert_eq!(result.input, None);
        assert!(result.raw_output.contains("West of House"));
        assert!(reader.transport().writes.is_empty());
    }

    #[test]
    fn test_pages_through_continuations() {
        let transport = ScriptedTransport::new("Chapter One\n[Press any key to continue]")
            .reply("It was a dark night.\nMore follows")
            .reply("Bedroom\n\n>");
        let mut reader = PatternReader::new(transport, timing());

        let result = execute(&mut reader);
        assert_eq!(reader.transport().writes, vec![" ", " "]);
        assert!(!result.raw_output.contains("Press any key"));
        assert!(!result.raw_output.contains("More follows"));
        assert!(result.raw_output.contains("Chapter One"));
        assert!(result.raw_output.contains("Bedroom"));
    }

    #[test]
    fn test_continuations_are_capped() {
        let mut transport = ScriptedTransport::new("[Press any key]");
        for _ in 0..10 {
            transport = transport.reply("[Press any key]");
        }
        let mut reader = PatternReader::new(transport, timing());

        execute(&mut reader);
        assert_eq!(reader.transport().writes.len(), MAX_CONTINUATIONS);
    }

    #[test]
    fn test_declines_introduction() {
        let transport = ScriptedTransport::new(
            "Would you like to see the introduction? (y/n)\n>",
        )
        .reply("Okay.\n\nDeck\n\n>");
        let mut reader = PatternReader::new(transport, timing());

        let result = execute(&mut reader);
        assert_eq!(reader.transport().writes, vec!["no"]);
        assert!(result.raw_output.ends_with("Deck\n\n>"));
    }
}
