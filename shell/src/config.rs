//! Limits and presentation settings for the shell.

/// Maximum number of words kept from one command line. Extra words are dropped.
pub const MAX_TOKENS: usize = 64;

/// Maximum number of background jobs tracked at the same time.
pub const MAX_JOBS: usize = 100;

/// Maximum number of commands joined by `|` in a single pipeline.
pub const MAX_PIPELINE_SEGMENTS: usize = 16;

/// Maximum accepted line length in bytes, counting the line terminator.
pub const MAX_LINE_LENGTH: usize = 256;

/// Prompt printed before each line unless configured otherwise.
pub const DEFAULT_PROMPT: &str = "$ ";

/// Settings the [`Interpreter`](crate::Interpreter) is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Text printed before every read.
    pub prompt: String,
    /// When false, nothing is printed before a read.
    pub show_prompt: bool,
    pub max_tokens: usize,
    pub max_jobs: usize,
    pub max_pipeline_segments: usize,
    pub max_line_length: usize,
}

impl ShellConfig {
    /// The prompt to print, or an empty string when prompting is disabled.
    pub fn prompt(&self) -> &str {
        if self.show_prompt { &self.prompt } else { "" }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            show_prompt: true,
            max_tokens: MAX_TOKENS,
            max_jobs: MAX_JOBS,
            max_pipeline_segments: MAX_PIPELINE_SEGMENTS,
            max_line_length: MAX_LINE_LENGTH,
        }
    }
}
