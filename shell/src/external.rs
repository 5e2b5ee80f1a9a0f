use crate::command::{ChildIo, ProcessControl};
use crate::log::dev_debug;
use anyhow::{Context, Result, anyhow};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::waitpid;
use nix::unistd::{Pid, pipe2};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::os::fd::OwnedFd;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Process control backed by real child processes of the shell.
#[derive(Debug, Default)]
pub struct UnixProcesses;

impl ProcessControl for UnixProcesses {
    fn spawn(&mut self, argv: &[&str], io: ChildIo) -> Result<Pid> {
        let (name, args) = argv.split_first().ok_or_else(|| anyhow!("empty command"))?;
        let search_paths = std::env::var_os("PATH").unwrap_or_default();
        let program = find_command_path(&search_paths, Path::new(name))
            .ok_or_else(|| anyhow!("{name}: command not found"))?;

        let mut cmd = Command::new(&*program);
        cmd.arg0(name).args(args);
        if let Some(fd) = io.stdin {
            cmd.stdin(Stdio::from(fd));
        }
        if let Some(fd) = io.stdout {
            cmd.stdout(Stdio::from(fd));
        }
        // The Child handle is dropped right away: reaping goes through `wait` by pid,
        // which also covers background jobs picked up later by `fg` or `wait`.
        let child = cmd
            .spawn()
            .with_context(|| format!("{name}: failed to execute {}", program.display()))?;
        let pid = Pid::from_raw(i32::try_from(child.id())?);
        dev_debug!("spawned {} as {pid}", program.display());
        Ok(pid)
    }

    fn wait(&mut self, pid: Pid) -> Result<()> {
        loop {
            match waitpid(pid, None) {
                Ok(status) => {
                    dev_debug!("reaped {pid}: {status:?}");
                    return Ok(());
                }
                // A keyboard interrupt reaches the child as well; keep waiting until
                // it is actually gone so no zombie is left behind.
                Err(Errno::EINTR) => continue,
                Err(err) => return Err(err).with_context(|| format!("waitpid failed for {pid}")),
            }
        }
    }

    fn signal(&mut self, pid: Pid, signal: Signal) -> Result<()> {
        kill(pid, signal).with_context(|| format!("kill failed for {pid}"))
    }

    fn pipe(&mut self) -> Result<(OwnedFd, OwnedFd)> {
        // Close-on-exec keeps every child from inheriting pipe ends it was not given.
        pipe2(OFlag::O_CLOEXEC).context("pipe failed")
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it names an executable file.
/// - `./foo` or any relative path with more than one component (e.g. `bin/sh`):
///   resolved against the current directory.
/// - Single path component (no separators): search each directory in `search_paths`
///   (PATH) and return the first executable match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(first), None) if !path.starts_with(".") => {
            find_in_path(search_paths, first.as_os_str()).map(Cow::Owned)
        }
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
