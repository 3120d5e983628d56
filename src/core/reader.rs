//! Pattern-bounded reads over a [`Transport`]
//!
//! The interpreter never frames its output. The only usable turn boundary
//! is a recognizable trailing prompt or confirmation phrase, so every read
//! here is heuristic: poll until a pattern matches or the time budget runs
//! out, and hand back whatever arrived either way.

use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::debug;

use super::channel::{Result, Transport};
use super::session::CancelToken;
use crate::config::Timing;

/// A line holding only `>`, optionally after a bracketed status tag
pub const PROMPT_PATTERN: &str = r"^(?:\[[^\]]*\]\s*)?>\s*$";

static PROMPT: OnceLock<Regex> = OnceLock::new();
static FILENAME_PROMPT: OnceLock<Regex> = OnceLock::new();

fn compile(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("built-in pattern compiles"))
}

/// Canonical turn boundary, matched against any line of the transcript
pub fn prompt() -> &'static Regex {
    PROMPT.get_or_init(|| {
        Regex::new(&format!("(?m){}", PROMPT_PATTERN)).expect("prompt pattern compiles")
    })
}

/// `Please enter a filename [zork1.qzl]: `
pub fn filename_prompt() -> &'static Regex {
    compile(&FILENAME_PROMPT, r"Please enter a filename \[.*\]: ")
}

/// Any of `alternatives` (case-insensitive) or the canonical prompt line,
/// compiled once into `cell`.
///
/// Used for the terminal reads of the save/restore dialogues.
pub fn any_or_prompt(cell: &'static OnceLock<Regex>, alternatives: &[&str]) -> &'static Regex {
    cell.get_or_init(|| {
        let mut branches: Vec<String> = alternatives.iter().map(|a| regex::escape(a)).collect();
        branches.push(PROMPT_PATTERN.to_string());
        Regex::new(&format!("(?mi){}", branches.join("|"))).expect("escaped alternatives compile")
    })
}

/// Accumulates interpreter output until a pattern matches or time runs out
pub struct PatternReader<T: Transport> {
    transport: T,
    timing: Timing,
    cancel: CancelToken,
}

impl<T: Transport> PatternReader<T> {
    pub fn new(transport: T, timing: Timing) -> Self {
        Self {
            transport,
            timing,
            cancel: CancelToken::new(),
        }
    }

    /// Abort reads and pauses once `cancel` escalates
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn start(&mut self) -> Result<bool> {
        self.transport.start()
    }

    pub fn write(&mut self, line: &str) -> bool {
        self.transport.write(line)
    }

    pub fn is_running(&mut self) -> bool {
        self.transport.is_running()
    }

    pub fn terminate(&mut self) {
        self.transport.terminate();
    }

    /// Read until `pattern` matches the transcript or the budget elapses.
    ///
    /// Budget exhaustion is not an error: the partial transcript is
    /// returned. With `None` the read only ends on the budget (or when the
    /// interpreter goes away).
    pub fn read_until(&mut self, pattern: Option<&Regex>) -> String {
        let mut transcript = String::new();
        if !self.transport.is_running() {
            return transcript;
        }

        let started = Instant::now();
        let budget = self.timing.timeout();

        while started.elapsed() < budget {
            if self.cancel.is_escalated() {
                debug!("Read abandoned after repeated cancel");
                break;
            }

            if self.transport.read_chunk(&mut transcript) {
                if pattern.is_some_and(|p| p.is_match(&transcript)) {
                    break;
                }
            } else if !self.transport.is_running() {
                break;
            }
        }

        debug!(
            "<- {} bytes in {:?}{}",
            transcript.len(),
            started.elapsed(),
            match pattern {
                Some(p) if !p.is_match(&transcript) => " (no match)",
                _ => "",
            }
        );
        transcript
    }

    /// Capture whatever comes back within the budget
    pub fn read_all(&mut self) -> String {
        self.read_until(None)
    }

    /// Sleep for `duration`, cut short if the cancel token escalates
    pub fn pause(&self, duration: Duration) {
        let step = self
            .timing
            .poll_interval()
            .max(Duration::from_millis(1))
            .min(duration.max(Duration::from_millis(1)));
        let started = Instant::now();

        while started.elapsed() < duration {
            if self.cancel.is_escalated() {
                return;
            }
            thread::sleep(step.min(duration.saturating_sub(started.elapsed())));
        }
    }
}
