//! Rendering command results for a reader
//!
//! - `text`: the game's words (or the feedback message) without the prompt
//! - `json`: one JSON object per result, with the parsed status band
//! - `shell`: interactive transcript with a colored prompt and ✓/✗ feedback

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crossterm::style::Stylize;
use serde::Serialize;

use crate::command::{CommandResult, Operation};
use crate::core::reader;
use crate::parser::{self, ParsedOutput};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Formatter {
    Text,
    Json,
    #[default]
    Shell,
}

impl FromStr for Formatter {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" | "data" => Ok(Self::Json),
            "shell" => Ok(Self::Shell),
            other => Err(format!("Unknown formatter: {} (text, json, shell)", other)),
        }
    }
}

impl fmt::Display for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Shell => "shell",
        })
    }
}

/// JSON shape: the result's own fields plus the parsed turn
#[derive(Serialize)]
struct Record<'a> {
    #[serde(flatten)]
    result: &'a CommandResult,
    parsed: ParsedOutput,
}

impl Formatter {
    pub fn write(&self, result: &CommandResult, out: &mut impl Write) -> io::Result<()> {
        match self {
            Self::Text => write_text(result, out),
            Self::Json => write_json(result, out),
            Self::Shell => write_shell(result, out),
        }?;
        out.flush()
    }
}

fn display_content(result: &CommandResult) -> &str {
    result.message.as_deref().unwrap_or(&result.raw_output)
}

/// Content with a trailing prompt line removed, and whether there was one
fn split_prompt(content: &str) -> (&str, bool) {
    let trimmed = content.trim_end();
    let (body, last) = trimmed.rsplit_once('\n').unwrap_or(("", trimmed));
    if reader::prompt().is_match(last.trim()) {
        (body.trim_end(), true)
    } else {
        (content, false)
    }
}

fn write_text(result: &CommandResult, out: &mut impl Write) -> io::Result<()> {
    let (content, _) = split_prompt(display_content(result));
    write!(out, "{}\n\n", content)
}

fn write_json(result: &CommandResult, out: &mut impl Write) -> io::Result<()> {
    let record = Record {
        result,
        parsed: parser::parse(&result.raw_output),
    };
    serde_json::to_writer(&mut *out, &record)?;
    writeln!(out)
}

fn write_shell(result: &CommandResult, out: &mut impl Write) -> io::Result<()> {
    match result.operation {
        Operation::Action | Operation::Start | Operation::Score => {
            let (content, has_prompt) = split_prompt(display_content(result));
            if has_prompt {
                write!(out, "{}\n\n", content)?;
                let prompt = if result.success {
                    "> ".green()
                } else {
                    "> ".red()
                };
                write!(out, "{}", prompt)
            } else {
                write!(out, "{}", content)
            }
        }
        _ => {
            let mark = if result.success {
                "✓".green()
            } else {
                "✗".red()
            };
            write!(
                out,
                "{} {}: {}",
                mark,
                result.operation.as_str().to_uppercase(),
                result.message.as_deref().unwrap_or_default()
            )?;
            for (key, value) in &result.details {
                match value {
                    serde_json::Value::String(s) => write!(out, "\n  {}: {}", key, s)?,
                    other => write!(out, "\n  {}: {}", key, other)?,
                }
            }
            writeln!(out)
        }
    }
}
