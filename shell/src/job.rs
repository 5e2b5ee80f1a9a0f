use anyhow::{Result, bail};
use nix::unistd::Pid;
use std::collections::VecDeque;

/// A child process that was started in the background and not yet reaped.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Job {
    pub pid: Pid,
}

/// Background jobs in the order they were started.
///
/// Each pid is tracked at most once, and no more than `capacity` jobs are kept.
/// `fg` and `wait` without arguments pick the oldest entry.
#[derive(Debug)]
pub struct JobTable {
    jobs: VecDeque<Job>,
    capacity: usize,
}

impl JobTable {
    pub fn with_capacity(capacity: usize) -> JobTable {
        JobTable {
            jobs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a job for `pid`. Fails when the table is full or already tracks `pid`.
    pub fn push(&mut self, pid: Pid) -> Result<()> {
        if self.contains(pid) {
            bail!("job {pid} is already tracked");
        }
        if self.is_full() {
            bail!("too many background jobs (limit is {})", self.capacity);
        }
        self.jobs.push_back(Job { pid });
        Ok(())
    }

    pub fn oldest(&self) -> Option<Pid> {
        self.jobs.front().map(|job| job.pid)
    }

    /// Forgets `pid`. Returns whether it was tracked.
    pub fn remove(&mut self, pid: Pid) -> bool {
        match self.jobs.iter().position(|job| job.pid == pid) {
            Some(idx) => {
                self.jobs.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.jobs.iter().any(|job| job.pid == pid)
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }
}
