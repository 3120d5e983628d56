//! textplay - play interactive fiction through dfrotz
//!
//! Reads commands from stdin, one per line, and writes each result in the
//! chosen format. End of input, or Ctrl-C, quits the game cleanly; a second
//! Ctrl-C during that quit stops the interpreter at once.
//!
//! # Quick Start
//!
//! ```text
//! textplay zork1                   # Look up games/zork1.* and play
//! textplay -f json zork1           # One JSON object per turn
//! textplay --dfrotz ~/bin/dfrotz ./stories/anchor.z8
//! ```
//!
//! # Commands
//!
//! | Input | Effect |
//! |-------|--------|
//! | score | Ask the game for the score |
//! | save [slot] | Save to `saves/<game>_<slot>.qzl` (default slot: autosave) |
//! | restore [slot] | Restore from a slot |
//! | quit | Quit and stop the interpreter |
//! | anything else | Sent to the game as is |

use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use textplay::{Config, Formatter, Gamefile, Operation, Session};

/// Command line options
#[derive(Default)]
struct Args {
    game: Option<String>,
    formatter: Formatter,
    dfrotz: Option<String>,
    games_dir: Option<PathBuf>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("textplay {}", VERSION);
}

fn print_help() {
    eprintln!("textplay {} - play interactive fiction through dfrotz", VERSION);
    eprintln!();
    eprintln!("Usage: textplay [OPTIONS] <GAME>");
    eprintln!();
    eprintln!("GAME is a path to a story file, or a name looked up in the games directory.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -f, --formatter <NAME>  Output format: shell (default), text, json");
    eprintln!("  -d, --dfrotz <PATH>     Interpreter executable (default: $DFROTZ_PATH or dfrotz)");
    eprintln!("  -g, --games <DIR>       Directory searched for game names (default: games)");
    eprintln!("  -v, --version           Show version");
    eprintln!("  -h, --help              Show this help");
    eprintln!();
    eprintln!("Settings are read from ~/.textplay/config.toml; options override them.");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-f" | "--formatter" => {
                i += 1;
                let name = args.get(i).ok_or("Missing formatter argument")?;
                parsed.formatter = name.parse()?;
            }
            "-d" | "--dfrotz" => {
                i += 1;
                let path = args.get(i).ok_or("Missing dfrotz argument")?;
                parsed.dfrotz = Some(path.clone());
            }
            "-g" | "--games" => {
                i += 1;
                let dir = args.get(i).ok_or("Missing games directory argument")?;
                parsed.games_dir = Some(PathBuf::from(dir));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            game => {
                if parsed.game.is_some() {
                    return Err(format!("Unexpected argument: {}", game));
                }
                parsed.game = Some(game.to_string());
            }
        }
        i += 1;
    }

    if parsed.game.is_none() {
        return Err("Missing GAME argument".to_string());
    }
    Ok(parsed)
}

/// Log to ~/.textplay/textplay.log; stdout belongs to the game
fn init_logging() {
    let log_path = Config::data_dir()
        .map(|dir| dir.join("textplay.log"))
        .unwrap_or_else(|| PathBuf::from("textplay.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("textplay starting...");

    // Command line overrides the config file
    let mut config = Config::load();
    if let Some(dfrotz) = args.dfrotz {
        config.dfrotz = dfrotz;
    }
    if let Some(dir) = args.games_dir {
        config.games_dir = dir;
    }

    let game = args.game.unwrap_or_default();
    let gamefile = Gamefile::from_input(&game, &config.games_dir)
        .with_context(|| format!("Cannot open game '{}'", game))?;
    info!("Game: {} ({})", gamefile.name(), gamefile.path().display());
    info!("Interpreter: {}", config.dfrotz);

    let formatter = args.formatter;
    let mut session = Session::new(&gamefile, &config);
    let mut stdout = io::stdout();

    let token = session.cancel_token();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let count = handler_token.cancel();
        info!("Ctrl-C received ({})", count);
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    // Stdin is read on its own thread so a cancellation is noticed while
    // waiting for the next line.
    let (input_tx, input_rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if input_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
        })
        .context("Failed to start input reader")?;

    let poll_interval = config.timing.poll_interval();
    let last = session.run(|result| {
        if let Err(e) = formatter.write(result, &mut stdout) {
            error!("Failed to write output: {}", e);
            return None;
        }
        loop {
            if token.is_requested() {
                return None;
            }
            match input_rx.recv_timeout(poll_interval) {
                Ok(line) => return Some(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    });

    if last.operation == Operation::Error {
        anyhow::bail!(last.message.unwrap_or_else(|| "Game failed".to_string()));
    }

    if session.is_running() {
        // Input ended while the game was still going
        info!("Input closed");
        if let Some(result) = session.request_cancel() {
            formatter.write(&result, &mut stdout)?;
        }
    } else {
        formatter.write(&last, &mut stdout)?;
    }

    info!("Session ended");
    Ok(())
}
