//! A small interactive shell with pipelines, redirection and background jobs.
//!
//! Lines are split on spaces (there is no quoting), then run as one of:
//! - a builtin: `exit [code]`, `wait`, `fg [pid]`, `bg [pid]`, `cd <dir>`, `pwd`;
//! - a pipeline: `cmd1 args | cmd2 args | ...`, always in the foreground;
//! - a single external command, optionally with `< file`, `> file` or `>> file`,
//!   and a trailing `&` to run it in the background.
//!
//! The main entry point is [`Interpreter`]. It reaches the operating system through
//! the [`ProcessControl`] trait, implemented for real processes by [`UnixProcesses`].

mod builtin;
pub mod command;
pub mod config;
mod env;
mod external;
pub mod input;
mod interpreter;
mod job;
mod launch;
mod lexer;
mod log;
mod pipeline;
mod redirect;
pub mod signal;

pub use crate::command::{ChildIo, ExitCode, ProcessControl};
pub use crate::config::ShellConfig;
pub use crate::env::Environment;
pub use crate::external::UnixProcesses;
pub use crate::interpreter::{Flow, Interpreter};
pub use crate::job::{Job, JobTable};
pub use crate::log::ShellLogger;

use anyhow::{Context, Result};
use crate::input::{Editor, LineReader, StreamReader};
use crate::signal::InterruptHandler;
use std::io::{self, IsTerminal};

/// Runs the shell on the process's standard streams.
///
/// With `command`, that single line is executed; otherwise lines are read until `exit`
/// or end of input, through a line editor when standard input is a terminal.
/// Returns the status the process should exit with.
pub fn run_shell(config: ShellConfig, command: Option<&str>) -> Result<ExitCode> {
    let handler = InterruptHandler::install().context("failed to install the SIGINT handler")?;
    let mut shell = Interpreter::new(config, Box::new(UnixProcesses), handler.interrupt());
    let mut stdout = io::stdout();

    if let Some(line) = command {
        return Ok(shell.run_once(line, &mut stdout));
    }

    let mut input: Box<dyn LineReader> = if io::stdin().is_terminal() {
        Box::new(Editor::new()?)
    } else {
        Box::new(StreamReader::stdio())
    };
    shell.repl(input.as_mut(), &mut stdout)
}
