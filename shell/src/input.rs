//! Sources of command lines for the read-eval loop.
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, ErrorKind, Read, Write};

/// Outcome of one blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A complete line, possibly still carrying its terminator.
    Line(String),
    /// A keyboard interrupt arrived while waiting; the partial line was dropped.
    Interrupted,
    /// The input stream is exhausted.
    Eof,
}

/// Something the shell can read command lines from.
pub trait LineReader {
    /// Shows `prompt` and blocks until a line, an interrupt, or end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Input>;
}

/// Interactive line editing with in-memory history, for terminals.
pub struct Editor {
    editor: DefaultEditor,
}

impl Editor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineReader for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Io(err)) if err.kind() == ErrorKind::Interrupted => {
                Ok(Input::Interrupted)
            }
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(err) => Err(err.into()),
        }
    }
}

/// Plain line reader for pipes and files.
///
/// The prompt is written to `prompt_out`. A read failing with `EINTR` is reported as
/// [`Input::Interrupted`], discarding whatever part of the line had arrived.
pub struct StreamReader<R, W> {
    input: R,
    prompt_out: W,
    pending: Vec<u8>,
    eof: bool,
}

impl<R: Read, W: Write> StreamReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self {
            input,
            prompt_out,
            pending: Vec::new(),
            eof: false,
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let end = match self.pending.iter().position(|&b| b == b'\n') {
            Some(newline) => newline + 1,
            None if self.eof && !self.pending.is_empty() => self.pending.len(),
            None => return None,
        };
        let line: Vec<u8> = self.pending.drain(..end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl<R: Read, W: Write> LineReader for StreamReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;

        let mut chunk = [0u8; 512];
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Input::Line(line));
            }
            if self.eof {
                return Ok(Input::Eof);
            }
            match self.input.read(&mut chunk) {
                Ok(0) => self.eof = true,
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => {
                    self.pending.clear();
                    return Ok(Input::Interrupted);
                }
                Err(err) => return Err(err).context("failed to read standard input"),
            }
        }
    }
}

impl StreamReader<io::Stdin, io::Stdout> {
    /// Reads the process's standard input, prompting on standard output.
    pub fn stdio() -> Self {
        Self::new(io::stdin(), io::stdout())
    }
}
