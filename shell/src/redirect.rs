use crate::command::ChildIo;
use anyhow::{Context, Result, anyhow};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;

/// Permissions for files created by `>` and `>>`.
const CREATE_MODE: u32 = 0o644;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType {
    /// `<`: read standard input from a file.
    Input,
    /// `>`: write standard output to a file, truncating it.
    Output,
    /// `>>`: append standard output to a file.
    Append,
}

impl RedirectType {
    pub fn from_operator(word: &str) -> Option<RedirectType> {
        match word {
            "<" => Some(RedirectType::Input),
            ">" => Some(RedirectType::Output),
            ">>" => Some(RedirectType::Append),
            _ => None,
        }
    }

    fn open(self, path: &str) -> io::Result<File> {
        let mut options = OpenOptions::new();
        match self {
            RedirectType::Input => options.read(true),
            RedirectType::Output => options
                .write(true)
                .create(true)
                .truncate(true)
                .mode(CREATE_MODE),
            RedirectType::Append => options.append(true).create(true).mode(CREATE_MODE),
        };
        options.open(path)
    }
}

/// Whether any word is a redirection operator.
pub fn contains_redirection(words: &[&str]) -> bool {
    words
        .iter()
        .any(|word| RedirectType::from_operator(word).is_some())
}

/// Files a single command's standard streams are rebound to.
///
/// The plan owns the opened files: if the command is abandoned before it is
/// launched, dropping the plan closes them.
#[derive(Debug, Default)]
pub struct RedirectionPlan {
    stdin: Option<File>,
    stdout: Option<File>,
}

impl RedirectionPlan {
    /// Opens every file named by `<`, `>` and `>>` in `words`.
    ///
    /// Returns the plan together with the program's real argument list, which ends
    /// at the first redirection operator. When several output operators appear, each
    /// file is opened (and so created or truncated) and the last one wins.
    pub fn from_args<'a>(words: &[&'a str]) -> Result<(RedirectionPlan, Vec<&'a str>)> {
        let mut plan = RedirectionPlan::default();
        let mut argv_end = None;
        let mut idx = 0;
        while idx < words.len() {
            let Some(typ) = RedirectType::from_operator(words[idx]) else {
                idx += 1;
                continue;
            };
            let path = words
                .get(idx + 1)
                .ok_or_else(|| anyhow!("missing file name after `{}`", words[idx]))?;
            let file = typ
                .open(path)
                .with_context(|| format!("open failed: {path}"))?;
            match typ {
                RedirectType::Input => plan.stdin = Some(file),
                RedirectType::Output | RedirectType::Append => plan.stdout = Some(file),
            }
            argv_end.get_or_insert(idx);
            idx += 2;
        }
        let argv = words[..argv_end.unwrap_or(words.len())].to_vec();
        Ok((plan, argv))
    }

    pub fn into_child_io(self) -> ChildIo {
        ChildIo {
            stdin: self.stdin.map(OwnedFd::from),
            stdout: self.stdout.map(OwnedFd::from),
        }
    }
}
