//! Interpreter plumbing.
//!
//! This module contains the layers between the player and `dfrotz`:
//!
//! - **channel**: the child process with piped stdin/stdout
//! - **reader**: pattern-bounded reads that cut the byte stream into turns
//! - **session**: lifecycle, command dispatch and cancellation
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── PatternReader (read_until prompt / confirmation / budget)
//! │   └── Transport
//! │       └── ProcessChannel (dfrotz child + reader thread)
//! └── Command dialogues (start, action, score, save, restore, quit)
//! ```

pub mod channel;
pub mod reader;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
