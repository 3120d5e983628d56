//! textplay - play interactive fiction through dfrotz, one structured turn
//! at a time.
//!
//! A [`Session`] spawns the interpreter, runs each command as a short
//! dialogue with it and returns a [`CommandResult`]. [`parser::parse`]
//! splits a result's raw output into location, score, moves, time, prompt
//! and the remaining narrative.
//!
//! ```no_run
//! use textplay::{Config, Gamefile, Session};
//!
//! let config = Config::load();
//! let game = Gamefile::from_input("zork1", &config.games_dir)?;
//! let mut session = Session::new(&game, &config);
//!
//! let opening = session.start();
//! println!("{}", textplay::parser::parse(&opening.raw_output).output);
//!
//! let result = session.dispatch("open mailbox");
//! assert!(result.success);
//! session.quit();
//! # Ok::<(), textplay::gamefile::GamefileError>(())
//! ```

pub mod command;
pub mod config;
pub mod core;
pub mod format;
pub mod gamefile;
pub mod parser;
pub mod savefile;

pub use crate::command::{Command, CommandResult, Operation};
pub use crate::config::{Config, Timing};
pub use crate::core::channel::{ChannelError, ProcessChannel, Transport};
pub use crate::core::session::{CancelToken, Session};
pub use crate::format::Formatter;
pub use crate::gamefile::Gamefile;
pub use crate::parser::ParsedOutput;
pub use crate::savefile::Savefile;
