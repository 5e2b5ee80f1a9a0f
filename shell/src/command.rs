use anyhow::Result;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::os::fd::OwnedFd;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Descriptors a child uses in place of the shell's standard input and output.
///
/// `None` means the child inherits the shell's own stream. The descriptors are moved
/// into the child on spawn, so the shell's copies are closed once spawning returns.
#[derive(Debug, Default)]
pub struct ChildIo {
    pub stdin: Option<OwnedFd>,
    pub stdout: Option<OwnedFd>,
}

/// Capability through which the shell creates and controls child processes.
///
/// The interpreter and the builtins only reach the operating system through this
/// trait, so tests can substitute a recording implementation.
pub trait ProcessControl {
    /// Starts `argv[0]` with `argv` as its argument list and returns its pid.
    ///
    /// Failing to locate or start the program is an error of this command only.
    fn spawn(&mut self, argv: &[&str], io: ChildIo) -> Result<Pid>;

    /// Blocks until `pid` has exited. Its exit status is discarded.
    fn wait(&mut self, pid: Pid) -> Result<()>;

    /// Delivers `signal` to `pid`.
    fn signal(&mut self, pid: Pid, signal: Signal) -> Result<()>;

    /// Creates an anonymous pipe as `(read end, write end)`.
    fn pipe(&mut self) -> Result<(OwnedFd, OwnedFd)>;
}
