//! Outcome of one command dialogue

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Refusals the interpreter gives when an action did not happen
const FAILURE_PHRASES: &[&str] = &[
    "I don't understand",
    "I don't know",
    "You can't",
    "You're not",
    "I can't see",
    "That doesn't make sense",
    "That's not a verb I recognize",
    "What do you want to",
    "You don't see",
    "There is no",
    "I don't see",
    "I beg your pardon",
];

/// Which dialogue produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Start,
    Action,
    Score,
    Save,
    Restore,
    Quit,
    /// Dispatch-time failure, e.g. the game is not running
    Error,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Start => "start",
            Operation::Action => "action",
            Operation::Score => "score",
            Operation::Save => "save",
            Operation::Restore => "restore",
            Operation::Quit => "quit",
            Operation::Error => "error",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What came back from the interpreter, plus per-operation details
/// (`slot`, `filename`, `score`, `out_of`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResult {
    pub input: Option<String>,
    pub raw_output: String,
    pub operation: Operation,
    pub success: bool,
    pub message: Option<String>,
    #[serde(flatten)]
    pub details: BTreeMap<String, Value>,
}

impl CommandResult {
    /// Successful result with no output yet
    pub fn new(operation: Operation, input: Option<&str>) -> Self {
        Self {
            input: input.map(str::to_string),
            raw_output: String::new(),
            operation,
            success: true,
            message: None,
            details: BTreeMap::new(),
        }
    }

    /// Action result whose success is read off the game's reply
    pub fn from_game_output(input: &str, raw_output: String) -> Self {
        let success = !contains_failure_phrase(&raw_output);
        Self {
            raw_output,
            success,
            ..Self::new(Operation::Action, Some(input))
        }
    }

    /// Dispatch against a game that is not (or no longer) running
    pub fn not_running(input: Option<&str>) -> Self {
        Self::new(Operation::Error, input)
            .with_success(false)
            .with_message("Game not running")
    }

    pub fn with_output(mut self, raw_output: String) -> Self {
        self.raw_output = raw_output;
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn is_action(&self) -> bool {
        self.operation == Operation::Action
    }

    pub fn is_system_command(&self) -> bool {
        !self.is_action()
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

fn contains_failure_phrase(output: &str) -> bool {
    let output = output.to_lowercase();
    FAILURE_PHRASES
        .iter()
        .any(|phrase| output.contains(&phrase.to_lowercase()))
}
