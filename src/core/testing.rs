//! Scripted transport for exercising dialogues without an interpreter

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use super::channel::{Result, Transport};

/// Plays back canned interpreter output and records every write.
///
/// Each successful write releases the next queued reply (if any) as
/// readable output, which is roughly how the interpreter answers a line.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub running: bool,
    pub starts: usize,
    pub terminations: usize,
    pub writes: Vec<String>,
    /// Output readable right now, one chunk per `read_chunk`
    pub output: VecDeque<String>,
    /// Released into `output` one per write
    pub replies: VecDeque<String>,
    /// Write index at which the pipe breaks and the process dies
    pub broken_pipe_at: Option<usize>,
    /// Endless filler returned when `output` is empty
    pub noise: Option<String>,
}

impl ScriptedTransport {
    /// A live transport whose first read yields `banner`
    pub fn new(banner: &str) -> Self {
        let mut transport = Self {
            running: true,
            ..Self::default()
        };
        transport.queue_output(banner);
        transport
    }

    pub fn queue_output(&mut self, chunk: &str) {
        if !chunk.is_empty() {
            self.output.push_back(chunk.to_string());
        }
    }

    pub fn reply(mut self, chunk: &str) -> Self {
        self.replies.push_back(chunk.to_string());
        self
    }

    pub fn with_noise(mut self, noise: &str) -> Self {
        self.noise = Some(noise.to_string());
        self
    }

    pub fn with_broken_pipe_at(mut self, index: usize) -> Self {
        self.broken_pipe_at = Some(index);
        self
    }
}

impl Transport for ScriptedTransport {
    fn start(&mut self) -> Result<bool> {
        self.starts += 1;
        self.running = true;
        Ok(true)
    }

    fn write(&mut self, line: &str) -> bool {
        if !self.running {
            return false;
        }
        let index = self.writes.len();
        self.writes.push(line.to_string());

        if self.broken_pipe_at == Some(index) {
            self.running = false;
            return false;
        }
        if let Some(reply) = self.replies.pop_front() {
            self.queue_output(&reply);
        }
        true
    }

    fn read_chunk(&mut self, output: &mut String) -> bool {
        if let Some(chunk) = self.output.pop_front() {
            output.push_str(&chunk);
            return true;
        }
        thread::sleep(Duration::from_millis(1));
        match &self.noise {
            Some(noise) if self.running => {
                output.push_str(noise);
                true
            }
            _ => false,
        }
    }

    fn is_running(&mut self) -> bool {
        self.running
    }

    fn terminate(&mut self) {
        self.terminations += 1;
        self.running = false;
    }
}
