//! Child-process channel to the interpreter
//!
//! This module owns the `dfrotz` child process: it spawns it with piped
//! stdin/stdout, forwards stdout through a reader thread, and tears the
//! process down again. It knows nothing about prompts or commands; that is
//! the job of [`PatternReader`](super::reader::PatternReader).

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Timing;

/// Size of one read from the interpreter's stdout
const CHUNK_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Interpreter {0} pipe was not captured")]
    MissingPipe(&'static str),

    #[error("Failed to start output reader: {0}")]
    ReaderThread(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, ChannelError>;

/// Byte-level operations the command dialogues are written against.
///
/// [`ProcessChannel`] is the real implementation; tests drive the dialogues
/// with a scripted one.
pub trait Transport {
    /// Spawn the interpreter unless it is already running.
    /// Returns whether an interpreter is running afterwards.
    fn start(&mut self) -> Result<bool>;

    /// Send one line. Returns `false` when the interpreter is gone,
    /// including a broken pipe while it is shutting down.
    fn write(&mut self, line: &str) -> bool;

    /// One bounded attempt to drain output into `output`.
    /// Returns whether anything was read.
    fn read_chunk(&mut self, output: &mut String) -> bool;

    /// Output still open and process not yet exited
    fn is_running(&mut self) -> bool;

    /// Close both streams and kill the process. Idempotent.
    fn terminate(&mut self);
}

/// Interpreter child process with piped stdin/stdout
pub struct ProcessChannel {
    program: String,
    game_path: PathBuf,
    working_dir: PathBuf,
    timing: Timing,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    /// Chunks forwarded by the reader thread
    output_rx: Option<Receiver<Vec<u8>>>,
    reader_thread: Option<JoinHandle<()>>,
    /// Reader thread has hung up
    eof: bool,
    /// Bytes of an incomplete UTF-8 sequence carried to the next chunk
    pending: Vec<u8>,
}

impl ProcessChannel {
    /// Create a channel for `program <game_path>`, run inside `working_dir`.
    /// Nothing is spawned until [`Transport::start`].
    pub fn new(program: &str, game_path: &Path, working_dir: &Path, timing: Timing) -> Self {
        // The child runs in working_dir, so a relative game path must be
        // resolved against our own directory first.
        let game_path = if game_path.is_absolute() {
            game_path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(game_path))
                .unwrap_or_else(|_| game_path.to_path_buf())
        };

        Self {
            program: program.to_string(),
            game_path,
            working_dir: working_dir.to_path_buf(),
            timing,
            child: None,
            stdin: None,
            output_rx: None,
            reader_thread: None,
            eof: false,
            pending: Vec::new(),
        }
    }

    /// Path of the game the interpreter is given
    pub fn game_path(&self) -> &Path {
        &self.game_path
    }

    fn spawn_reader(
        mut stdout: impl Read + Send + 'static,
    ) -> io::Result<(Receiver<Vec<u8>>, JoinHandle<()>)> {
        let (tx, rx) = mpsc::channel::<Vec<u8>>();

        let handle = thread::Builder::new()
            .name("dfrotz-reader".to_string())
            .spawn(move || {
                let mut buffer = [0u8; CHUNK_SIZE];

                loop {
                    match stdout.read(&mut buffer) {
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(buffer[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(_) => break,
                    }
                }
            })?;

        Ok((rx, handle))
    }

    /// Move the complete UTF-8 prefix of `pending` into `output`
    fn decode_pending(&mut self, output: &mut String) {
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // Incomplete sequence at the end: keep it for the next chunk
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.pending.len(),
        };

        output.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
        self.pending.drain(..valid);
    }
}

impl Transport for ProcessChannel {
    fn start(&mut self) -> Result<bool> {
        if self.is_running() {
            return Ok(true);
        }

        let mut command = Command::new(&self.program);
        command
            .arg(&self.game_path)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        // Own process group: a terminal Ctrl-C reaches us, not the
        // interpreter, so it can still be quit through its prompt.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|source| ChannelError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ChannelError::MissingPipe("stdio"));
        };

        let (rx, reader_thread) = match Self::spawn_reader(stdout) {
            Ok(reader) => reader,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ChannelError::ReaderThread(e));
            }
        };

        info!(
            "Started {} {} (pid {})",
            self.program,
            self.game_path.display(),
            child.id()
        );

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.output_rx = Some(rx);
        self.reader_thread = Some(reader_thread);
        self.eof = false;
        self.pending.clear();
        Ok(true)
    }

    fn write(&mut self, line: &str) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return false;
        };

        let result = stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .and_then(|_| stdin.flush());

        match result {
            Ok(()) => {
                debug!("-> {:?}", line);
                // The interpreter is not drained synchronously; without this
                // pause the next read sees the previous command's output.
                thread::sleep(self.timing.command_delay());
                true
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!("Interpreter closed its input while writing {:?}", line);
                false
            }
            Err(e) => {
                warn!("Failed to write {:?} to interpreter: {}", line, e);
                false
            }
        }
    }

    fn read_chunk(&mut self, output: &mut String) -> bool {
        let Some(rx) = &self.output_rx else {
            return false;
        };

        let first = match rx.recv_timeout(self.timing.poll_interval()) {
            Ok(chunk) => chunk,
            Err(RecvTimeoutError::Timeout) => return false,
            Err(RecvTimeoutError::Disconnected) => {
                self.eof = true;
                return false;
            }
        };
        self.pending.extend_from_slice(&first);

        // Take everything else that is already queued
        loop {
            match rx.try_recv() {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.eof = true;
                    break;
                }
            }
        }

        self.decode_pending(output);
        true
    }

    fn is_running(&mut self) -> bool {
        if self.stdin.is_none() || self.eof {
            return false;
        }
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                debug!("Interpreter exited: {}", status);
                false
            }
            Some(Err(_)) | None => false,
        }
    }

    fn terminate(&mut self) {
        // Closing stdin first lets a well-behaved interpreter exit on EOF
        self.stdin.take();

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Kill after exit: {}", e);
            }
            let _ = child.wait();
            info!("Interpreter terminated");
        }

        self.output_rx.take();
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
        self.eof = true;
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        self.terminate();
    }
}
