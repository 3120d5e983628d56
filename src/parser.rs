//! Interpreter output parser
//!
//! Splits a raw turn into the status band (location, score, moves, time),
//! the trailing prompt, and the narrative that is left over.
//!
//! dfrotz prints the status band as the first line, indented by a space:
//!
//! ```text
//!  Canyon Bottom                                    Score: 0        Moves: 26
//!  In the enchanted forest                             5:00 AM      Score: 0
//!  Brig
//!  Moves:0
//! ```
//!
//! Everything not recognized as status or prompt stays in `output`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::core::reader::PROMPT_PATTERN;

/// Longest text still taken for a room name
const MAX_LOCATION_LEN: usize = 50;

/// Openings of refusals and error messages, never room names
const NOT_A_LOCATION: &[&str] = &[
    "I don't ",
    "I can't ",
    "What do you ",
    "You're ",
    "You ",
    "That's not ",
    "I beg your pardon",
];

static SCORE: OnceLock<Regex> = OnceLock::new();
static MOVES: OnceLock<Regex> = OnceLock::new();
static TIME: OnceLock<Regex> = OnceLock::new();
static FIELD_GAP: OnceLock<Regex> = OnceLock::new();
static STAT_MARKER: OnceLock<Regex> = OnceLock::new();
static PROMPT_LINE: OnceLock<Regex> = OnceLock::new();

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("parser pattern compiles"))
}

fn score_field() -> &'static Regex {
    regex(&SCORE, r"(?i)Score:\s*(\d+)")
}

fn moves_field() -> &'static Regex {
    regex(&MOVES, r"(?i)Moves:\s*(\d+)")
}

fn time_field() -> &'static Regex {
    regex(&TIME, r"(?i)(\d{1,2}:\d{2}\s*(?:AM|PM))")
}

/// Status fields are separated by runs of 3+ spaces
fn field_gap() -> &'static Regex {
    regex(&FIELD_GAP, r"\s{3,}")
}

fn stat_marker() -> &'static Regex {
    regex(&STAT_MARKER, r"(?i)(?:Score|Moves|AM|PM):|\d+:\d+")
}

fn prompt_line() -> &'static Regex {
    regex(&PROMPT_LINE, PROMPT_PATTERN)
}

/// Structured view of one turn of output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedOutput {
    pub location: Option<String>,
    pub score: Option<u32>,
    pub moves: Option<u32>,
    pub time: Option<String>,
    pub prompt: Option<String>,
    /// Narrative with status and prompt removed
    pub output: String,
    pub has_prompt: bool,
}

impl ParsedOutput {
    /// Nothing was recognized besides narrative
    pub fn is_plain(&self) -> bool {
        self.location.is_none()
            && self.score.is_none()
            && self.moves.is_none()
            && self.time.is_none()
            && self.prompt.is_none()
    }
}

pub fn parse(raw_output: &str) -> ParsedOutput {
    let mut parsed = ParsedOutput {
        location: extract_location(raw_output),
        score: capture_number(score_field(), raw_output),
        moves: capture_number(moves_field(), raw_output),
        time: time_field()
            .captures(raw_output)
            .map(|c| c[1].to_string()),
        prompt: extract_prompt(raw_output),
        ..ParsedOutput::default()
    };
    parsed.has_prompt = parsed.prompt.is_some();

    if parsed.is_plain() {
        parsed.output = raw_output.to_string();
        return parsed;
    }

    // The prompt goes first: a bracketed prompt may itself carry a score
    let mut cleaned = if parsed.has_prompt {
        remove_trailing_prompts(raw_output)
    } else {
        raw_output.to_string()
    };

    if let Some(location) = &parsed.location {
        // A status line with stats collapses to just the room name
        if let Some((first, rest)) = split_first_line(&cleaned) {
            if location_with_stats(first.trim()).is_some() {
                cleaned = format!("{}\n{}", location, rest);
            }
        } else if location_with_stats(cleaned.trim()).is_some() {
            cleaned = location.clone();
        }
    }

    if parsed.score.is_some() {
        cleaned = score_field().replace_all(&cleaned, "").into_owned();
    }
    if parsed.moves.is_some() {
        cleaned = moves_field().replace_all(&cleaned, "").into_owned();
    }
    if parsed.time.is_some() {
        cleaned = time_field().replace_all(&cleaned, "").into_owned();
    }
    parsed.output = final_cleanup(&cleaned);
    parsed
}

fn split_first_line(text: &str) -> Option<(&str, &str)> {
    text.split_once('\n')
}

fn capture_number(pattern: &Regex, text: &str) -> Option<u32> {
    pattern.captures(text)?[1].parse().ok()
}

fn extract_location(text: &str) -> Option<String> {
    let first_line = text.split('\n').next()?;

    // Only the interpreter's status band is indented; narrative and
    // already-cleaned text start at column zero.
    if !first_line.starts_with(char::is_whitespace) {
        return None;
    }

    let line = first_line.trim();
    if line.is_empty() {
        return None;
    }

    let candidate = location_with_stats(line).unwrap_or(line);
    valid_location(candidate).then(|| candidate.to_string())
}

/// ` Canyon Bottom      Score: 0     Moves: 26` → `Canyon Bottom`
fn location_with_stats(line: &str) -> Option<&str> {
    let mut parts = field_gap().split(line);
    let first = parts.next()?.trim();
    parts.next()?;
    (!first.is_empty()).then_some(first)
}

fn valid_location(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.chars().count() < MAX_LOCATION_LEN
        && !candidate.ends_with(['.', '!', '?'])
        && !stat_marker().is_match(candidate)
        && !candidate.to_lowercase().contains("response")
        && !NOT_A_LOCATION
            .iter()
            .any(|prefix| candidate.starts_with(prefix))
}

fn extract_prompt(text: &str) -> Option<String> {
    let last_line = text.trim_end().rsplit('\n').next()?.trim();
    prompt_line()
        .is_match(last_line)
        .then(|| last_line.to_string())
}

/// Drop every prompt-only line at the end, not just the last one
fn remove_trailing_prompts(text: &str) -> String {
    let mut text = text.trim_end();
    loop {
        let (body, last) = text.rsplit_once('\n').unwrap_or(("", text));
        if !prompt_line().is_match(last.trim()) {
            break;
        }
        text = body.trim_end();
    }
    text.to_string()
}

/// Trim line ends, keep at most one blank line between paragraphs
fn final_cleanup(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0;

    for line in text.split('\n') {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANYON: &str = " Canyon Bottom                                    Score: 0        Moves: 26\n\nCanyon Bottom\nYou are beneath the walls of the river canyon which may be climbable here. The\nlesser part of the runoff of Aragain Falls flows by below. To the north is a\nnarrow path.\n\n>";

    const BRIG: &str = " Brig\n Moves:0\n\nBrig\nYou're in a small, smooth-walled room with barely enough area to stand. A pair\nof simple bunk beds occupy most of the cramped space.\n\n>";

    const FOREST: &str = " In the enchanted forest                             5:00 AM      Score: 0\n\nIn the enchanted forest\nA large wooden sign informs me that I'm in the Enchanted Forest.\nAn old pedlar is sitting on a log here, tending to his bunions.\n\n>";

    #[test]
    fn test_location_with_score_and_moves() {
        let parsed = parse(CANYON);

        assert_eq!(parsed.location.as_deref(), Some("Canyon Bottom"));
        assert_eq!(parsed.score, Some(0));
        assert_eq!(parsed.moves, Some(26));
        assert_eq!(parsed.time, None);
        assert!(parsed.has_prompt);
        assert_eq!(parsed.prompt.as_deref(), Some(">"));

        assert!(parsed.output.contains("Canyon Bottom"));
        assert!(parsed.output.contains("You are beneath the walls"));
        assert!(!parsed.output.contains("Score: 0"));
        assert!(!parsed.output.contains("Moves: 26"));
        assert!(!parsed.output.contains('>'));
    }

    #[test]
    fn test_location_on_its_own_line() {
        let parsed = parse(BRIG);

        assert_eq!(parsed.location.as_deref(), Some("Brig"));
        assert_eq!(parsed.moves, Some(0));
        assert_eq!(parsed.score, None);
        assert!(parsed.output.starts_with("Brig"));
        assert!(parsed.output.contains("You're in a small, smooth-walled room"));
        assert!(!parsed.output.contains("Moves:0"));
        assert!(!parsed.output.contains('>'));
    }

    #[test]
    fn test_location_with_time() {
        let parsed = parse(FOREST);

        assert_eq!(parsed.location.as_deref(), Some("In the enchanted forest"));
        assert_eq!(parsed.time.as_deref(), Some("5:00 AM"));
        assert_eq!(parsed.score, Some(0));
        assert!(parsed.output.contains("An old pedlar is sitting"));
        assert!(!parsed.output.contains("5:00 AM"));
        assert!(!parsed.output.contains("Score: 0"));
    }

    #[test]
    fn test_refusals_are_not_locations() {
        for reply in [
            "I don't know the word \"fart\".",
            "I beg your pardon?",
            "You can't go that way.",
            "That's not a verb I recognise.",
            "You don't see that here.",
        ] {
            let raw = format!(" {}\n\n>", reply);
            let parsed = parse(&raw);
            assert_eq!(parsed.location, None, "{:?}", reply);
            assert!(parsed.output.contains(reply));
            assert!(!parsed.output.contains('>'));
        }
    }

    #[test]
    fn test_long_or_generic_lines_are_not_locations() {
        let long = format!(" {}\n>", "x".repeat(60));
        assert_eq!(parse(&long).location, None);
        assert_eq!(parse(" No response\n>").location, None);
    }

    #[test]
    fn test_prompt_only_extraction() {
        let parsed = parse("Simple response without location or stats.\n>");

        assert_eq!(parsed.location, None);
        assert_eq!(parsed.score, None);
        assert_eq!(parsed.moves, None);
        assert_eq!(parsed.time, None);
        assert_eq!(parsed.output, "Simple response without location or stats.");
    }

    #[test]
    fn test_nothing_extracted_is_verbatim() {
        let raw = "  The wind howls.\n\n\n\nNothing else happens.  \n";
        let parsed = parse(raw);

        assert!(parsed.is_plain());
        assert!(!parsed.has_prompt);
        assert_eq!(parsed.output, raw);
    }

    #[test]
    fn test_paragraphs_are_preserved() {
        let raw = " Complex Location                                     Score: 10\nComplex Location\n\nFirst paragraph of description.\n\n\n\nSecond paragraph with more details.   \n\nFinal paragraph.\n\n>\n";
        let parsed = parse(raw);

        assert_eq!(parsed.score, Some(10));
        assert_eq!(
            parsed.output,
            "Complex Location\nComplex Location\n\nFirst paragraph of description.\n\nSecond paragraph with more details.\n\nFinal paragraph."
        );
    }

    #[test]
    fn test_bracketed_prompt() {
        let parsed = parse("Taken.\n[Score: 5]>");

        assert_eq!(parsed.prompt.as_deref(), Some("[Score: 5]>"));
        assert_eq!(parsed.output, "Taken.");
    }

    #[test]
    fn test_repeated_prompts_are_all_removed() {
        let parsed = parse("Taken.\n>\n>\n");

        assert_eq!(parsed.prompt.as_deref(), Some(">"));
        assert_eq!(parsed.output, "Taken.");
        assert_eq!(parse(">\n>").output, "");
    }

    #[test]
    fn test_parsing_cleaned_output_again_changes_nothing() {
        for raw in [CANYON, BRIG, FOREST, "Taken.\n\n>", "Taken.\n>\n>", "Dropped.\n>\n[Score: 5]>"] {
            let first = parse(raw);
            let second = parse(&first.output);

            assert_eq!(second.output, first.output);
            assert!(second.is_plain(), "{:?}", second);
        }
    }
}
