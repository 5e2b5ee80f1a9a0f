//! Starting external commands, in the foreground, the background, or as a pipeline.
use crate::command::{ChildIo, ProcessControl};
use crate::job::JobTable;
use crate::log::{dev_debug, user_error};
use crate::pipeline::Pipeline;
use crate::redirect::RedirectionPlan;
use crate::signal::Interrupt;
use anyhow::{Result, bail};
use std::io::Write;
use std::os::fd::OwnedFd;

/// Runs one command with its redirections applied.
///
/// In the foreground this blocks until the child exits. In the background the child
/// is added to `jobs` and its pid reported on `stdout`.
pub fn run_command(
    argv: &[&str],
    plan: RedirectionPlan,
    background: bool,
    jobs: &mut JobTable,
    procs: &mut dyn ProcessControl,
    stdout: &mut dyn Write,
) -> Result<()> {
    if argv.is_empty() {
        bail!("syntax error: missing command before redirection");
    }
    // Refuse before spawning, so no untracked child is left running.
    if background && jobs.is_full() {
        bail!("too many background jobs (limit is {})", jobs.capacity());
    }

    let pid = procs.spawn(argv, plan.into_child_io())?;
    if background {
        jobs.push(pid)?;
        dev_debug!("job {pid} added, {} running in background", jobs.len());
        writeln!(stdout, "Running in background with PID {pid}")?;
    } else {
        procs.wait(pid)?;
    }
    Ok(())
}

/// Runs every segment of `pipeline` concurrently, each one's output feeding the next
/// one's input, and waits for all of them.
///
/// The parent's copy of each pipe end is closed as soon as the child that uses it has
/// been spawned, so end-of-file propagates down the chain once a writer exits. If
/// `interrupt` is raised during setup, no further segment is started.
pub fn run_pipeline(
    pipeline: &Pipeline<'_>,
    procs: &mut dyn ProcessControl,
    interrupt: Interrupt,
) -> Result<()> {
    let segments = pipeline.segments();
    let mut pids = Vec::with_capacity(segments.len());
    let mut upstream: Option<OwnedFd> = None;
    let mut failure = None;

    for (idx, argv) in segments.iter().enumerate() {
        if interrupt.is_raised() {
            dev_debug!("interrupted after starting {idx} of {} commands", segments.len());
            break;
        }
        let (downstream, write_end) = if idx + 1 < segments.len() {
            match procs.pipe() {
                Ok((read_end, write_end)) => (Some(read_end), Some(write_end)),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        } else {
            (None, None)
        };

        let io = ChildIo {
            stdin: upstream.take(),
            stdout: write_end,
        };
        match procs.spawn(argv, io) {
            Ok(pid) => pids.push(pid),
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
        upstream = downstream;
    }
    drop(upstream);

    for pid in pids {
        if let Err(err) = procs.wait(pid) {
            user_error!("{err:#}");
        }
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
