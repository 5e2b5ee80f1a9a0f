use crate::command::ExitCode;
use crate::job::JobTable;
use std::env as stdenv;
use std::path::PathBuf;

/// State that outlives a single command line.
///
/// The environment contains:
/// - `current_dir`: the working directory, kept in sync with the process by `cd`.
/// - `jobs`: background processes not yet reaped.
/// - `exit_status`: set by `exit`; the interpreter stops once it is present.
#[derive(Debug)]
pub struct Environment {
    pub current_dir: PathBuf,
    pub jobs: JobTable,
    pub exit_status: Option<ExitCode>,
}

impl Environment {
    /// Capture the current process state with room for `max_jobs` background jobs.
    pub fn new(max_jobs: usize) -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            current_dir,
            jobs: JobTable::with_capacity(max_jobs),
            exit_status: None,
        }
    }
}
