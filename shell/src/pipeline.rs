use crate::redirect::contains_redirection;
use anyhow::{Result, bail};

/// Word separating the commands of a pipeline.
pub const PIPE: &str = "|";

/// Whether `words` contain a pipe operator.
pub fn is_pipeline(words: &[&str]) -> bool {
    words.contains(&PIPE)
}

/// Commands connected output-to-input, in order.
///
/// Every segment borrows its words from the tokenized line and is non-empty.
#[derive(Debug, PartialEq, Eq)]
pub struct Pipeline<'a> {
    segments: Vec<Vec<&'a str>>,
}

impl<'a> Pipeline<'a> {
    /// Splits `words` at each `|`.
    ///
    /// Without any `|` the result is a single segment. An empty segment, more than
    /// `max_segments` segments, or a redirection operator inside a segment is an error.
    pub fn split(words: &[&'a str], max_segments: usize) -> Result<Pipeline<'a>> {
        let mut segments = Vec::new();
        for segment in words.split(|word| *word == PIPE) {
            if segment.is_empty() {
                bail!("syntax error: empty command in pipeline");
            }
            if contains_redirection(segment) {
                bail!("redirection is not supported inside a pipeline");
            }
            segments.push(segment.to_vec());
        }
        if segments.len() > max_segments {
            bail!("pipeline too long (limit is {max_segments} commands)");
        }
        Ok(Pipeline { segments })
    }

    pub fn segments(&self) -> &[Vec<&'a str>] {
        &self.segments
    }
}
