//! Score query

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{CommandResult, Operation};
use crate::core::channel::Transport;
use crate::core::reader::{self, PatternReader};

pub(super) const INPUT: &str = "score";

static SCORE: OnceLock<Regex> = OnceLock::new();

/// `0 (total of 350`, `10 (total points out of a possible 100`
fn score_pattern() -> &'static Regex {
    SCORE.get_or_init(|| {
        Regex::new(
            r"(?i)(\d+) \(total (?:points )?(?:out )?of (?:a )?(?:maximum |possible )?(?:of )?(\d+)",
        )
        .expect("score pattern compiles")
    })
}

/// `(score, out_of)` when the game answers with numbers
fn extract(output: &str) -> Option<(u32, u32)> {
    let captures = score_pattern().captures(output)?;
    Some((captures[1].parse().ok()?, captures[2].parse().ok()?))
}

pub(super) fn execute<T: Transport>(reader: &mut PatternReader<T>) -> CommandResult {
    reader.write(INPUT);
    let raw_output = reader.read_until(Some(reader::prompt()));

    // Some games answer with dialogue instead of a number; that is still
    // a successful score command, just without figures.
    let (score, out_of) = match extract(&raw_output) {
        Some((score, out_of)) => (Value::from(score), Value::from(out_of)),
        None => (Value::Null, Value::Null),
    };

    CommandResult::new(Operation::Score, Some(INPUT))
        .with_output(raw_output)
        .with_detail("score", score)
        .with_detail("out_of", out_of)
}
