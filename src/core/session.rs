//! Session management
//!
//! Owns one interpreter channel and runs the command dialogues against it,
//! one at a time.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::channel::{ProcessChannel, Transport};
use super::reader::PatternReader;
use crate::command::{Command, CommandResult, Operation};
use crate::config::Config;
use crate::gamefile::Gamefile;
use crate::savefile::Savefile;

/// Interrupt counter shared between a session and whoever delivers
/// cancellation (a signal thread, a supervisor).
///
/// The first request asks for a graceful quit; any further request means
/// "stop now" and makes in-flight reads and pauses give up immediately.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicUsize>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more request; returns the running count
    pub fn cancel(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.count() > 0
    }

    pub fn is_escalated(&self) -> bool {
        self.count() >= 2
    }
}

/// A game being played through the interpreter
pub struct Session<T: Transport = ProcessChannel> {
    reader: PatternReader<T>,
    game_name: String,
    /// Interpreter working directory
    save_root: PathBuf,
    autosave_on_quit: bool,
    /// Cached outcome of the opening dialogue; `Some` once started
    start_result: Option<CommandResult>,
    cancel: CancelToken,
    /// A cancellation has been acted on with a graceful quit
    cancel_handled: bool,
}

impl Session<ProcessChannel> {
    /// Session driving the configured interpreter on `gamefile`
    pub fn new(gamefile: &Gamefile, config: &Config) -> Self {
        let channel = ProcessChannel::new(
            &config.dfrotz,
            gamefile.path(),
            &config.save_root,
            config.timing,
        );
        Self::with_transport(gamefile.name(), channel, config)
    }
}

impl<T: Transport> Session<T> {
    /// Session over any transport
    pub fn with_transport(game_name: &str, transport: T, config: &Config) -> Self {
        let cancel = CancelToken::new();
        Self {
            reader: PatternReader::new(transport, config.timing).with_cancel(cancel.clone()),
            game_name: game_name.to_string(),
            save_root: config.save_root.clone(),
            autosave_on_quit: config.autosave_on_quit,
            start_result: None,
            cancel,
            cancel_handled: false,
        }
    }

    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    pub fn transport(&self) -> &T {
        self.reader.transport()
    }

    /// Handle for delivering cancellation from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Spawn the interpreter and consume its opening text.
    ///
    /// Only the first call does any work; later calls return the same
    /// result.
    pub fn start(&mut self) -> CommandResult {
        if let Some(result) = &self.start_result {
            return result.clone();
        }

        if let Err(e) = self.reader.start() {
            warn!("Failed to start {}: {}", self.game_name, e);
            return CommandResult::new(Operation::Error, None)
                .with_success(false)
                .with_message(e.to_string());
        }
        info!("Session started: {}", self.game_name);

        let result = Command::Start.execute(&mut self.reader, &self.save_root);
        self.start_result = Some(result.clone());
        result
    }

    pub fn is_started(&self) -> bool {
        self.start_result.is_some()
    }

    /// Started, and the interpreter has not gone away since
    pub fn is_running(&mut self) -> bool {
        self.is_started() && self.reader.is_running()
    }

    /// Parse player input and run the matching dialogue.
    ///
    /// A cancellation delivered through the token since the last command
    /// takes precedence: the game is quit and `input` is dropped.
    pub fn dispatch(&mut self, input: &str) -> CommandResult {
        if let Some(quit) = self.take_pending_cancel() {
            return quit;
        }
        let command = Command::parse(input, &self.game_name);
        self.execute(&command)
    }

    pub fn score(&mut self) -> CommandResult {
        self.execute(&Command::Score)
    }

    pub fn save(&mut self, slot: &str) -> CommandResult {
        self.execute(&Command::Save(Savefile::new(&self.game_name, slot)))
    }

    pub fn restore(&mut self, slot: &str) -> CommandResult {
        self.execute(&Command::Restore(Savefile::new(&self.game_name, slot)))
    }

    pub fn quit(&mut self) -> CommandResult {
        if let Some(quit) = self.take_pending_cancel() {
            return quit;
        }
        self.execute(&Command::Quit)
    }

    /// Play until `next` returns `None` or the game stops.
    ///
    /// `next` sees every result from the start result on and returns the
    /// next player input. The result of the last command (usually the
    /// quit) is returned rather than passed to `next`. A cancellation
    /// delivered through the token between turns quits the game.
    pub fn run<F>(&mut self, mut next: F) -> CommandResult
    where
        F: FnMut(&CommandResult) -> Option<String>,
    {
        let mut result = self.start();
        while self.is_running() {
            if let Some(quit) = self.take_pending_cancel() {
                return quit;
            }
            let Some(input) = next(&result) else {
                // `next` may have given up because of a cancellation
                return self.take_pending_cancel().unwrap_or(result);
            };
            result = self.dispatch(&input);
        }
        result
    }

    /// The host asks the session to stop.
    ///
    /// The first request, whether made here or through the token, quits
    /// gracefully if the game is running. A request after that quit has
    /// begun kills the interpreter without waiting. Returns the quit
    /// result, or `None` when there was nothing to stop.
    pub fn request_cancel(&mut self) -> Option<CommandResult> {
        if self.cancel_handled {
            self.cancel.cancel();
            warn!("Repeated interrupt - terminating interpreter");
            self.reader.terminate();
            return Some(
                CommandResult::new(Operation::Quit, Some("quit")).with_message("Game terminated"),
            );
        }

        // A request already delivered through the token is this one
        if !self.cancel.is_requested() {
            self.cancel.cancel();
        }
        self.take_pending_cancel()
    }

    /// Quit if a cancellation is pending and nothing has acted on it yet
    fn take_pending_cancel(&mut self) -> Option<CommandResult> {
        if self.cancel_handled || !self.cancel.is_requested() || !self.is_running() {
            return None;
        }
        self.cancel_handled = true;
        info!("Interrupt received - quitting game gracefully");
        Some(self.execute(&Command::Quit))
    }

    fn execute(&mut self, command: &Command) -> CommandResult {
        if !self.is_running() {
            return CommandResult::not_running(command.input());
        }

        if *command == Command::Quit && self.autosave_on_quit {
            let autosave = Command::Save(Savefile::autosave(&self.game_name));
            let saved = autosave.execute(&mut self.reader, &self.save_root);
            info!(
                "Autosave before quit: {}",
                saved.message.as_deref().unwrap_or("no message")
            );
        }

        command.execute(&mut self.reader, &self.save_root)
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.reader.terminate();
    }
}
