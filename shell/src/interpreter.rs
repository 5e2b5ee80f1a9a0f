use crate::builtin;
use crate::command::{ExitCode, ProcessControl};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::input::{Input, LineReader};
use crate::launch;
use crate::lexer;
use crate::log::{dev_debug, user_error, user_warn};
use crate::pipeline::{self, Pipeline};
use crate::redirect::RedirectionPlan;
use crate::signal::Interrupt;
use anyhow::{Result, bail};
use std::io::Write;

/// What the read-eval loop does after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(ExitCode),
}

/// A small job-control shell: builtins, external commands, pipelines, redirection
/// and background jobs.
///
/// The interpreter owns the [`Environment`] (working directory and job table) for its
/// whole lifetime and reaches the operating system only through [`ProcessControl`].
///
/// Example
/// ```
/// use jobsh::{Flow, Interpreter, ShellConfig, UnixProcesses};
/// use jobsh::signal::Interrupt;
///
/// let mut sh = Interpreter::new(ShellConfig::default(), Box::new(UnixProcesses), Interrupt::keyboard());
/// let mut out = Vec::new();
/// assert_eq!(sh.execute_line("exit 3", &mut out).unwrap(), Flow::Exit(3));
/// ```
pub struct Interpreter {
    env: Environment,
    procs: Box<dyn ProcessControl>,
    interrupt: Interrupt,
    config: ShellConfig,
}

impl Interpreter {
    pub fn new(config: ShellConfig, procs: Box<dyn ProcessControl>, interrupt: Interrupt) -> Self {
        Self {
            env: Environment::new(config.max_jobs),
            procs,
            interrupt,
            config,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Reads and executes lines until `exit` or end of input.
    ///
    /// Command errors are reported and the loop goes on. Only a failure of `input`
    /// itself ends the loop with an error.
    pub fn repl(&mut self, input: &mut dyn LineReader, stdout: &mut dyn Write) -> Result<ExitCode> {
        loop {
            // Top of the iteration: an interrupt raised while the previous line ran
            // has been dealt with and must not cancel this read.
            self.interrupt.take();

            match input.read_line(self.config.prompt())? {
                Input::Line(line) => match self.execute_line(&line, stdout) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Exit(code)) => return Ok(code),
                    Err(err) => user_error!("{err:#}"),
                },
                Input::Interrupted => {
                    self.interrupt.take();
                    writeln!(stdout)?;
                }
                Input::Eof => return Ok(0),
            }
            stdout.flush()?;
        }
    }

    /// Executes a single line, e.g. the argument of `-c`.
    ///
    /// Errors are reported instead of returned; the result is the status the shell
    /// should exit with.
    pub fn run_once(&mut self, line: &str, stdout: &mut dyn Write) -> ExitCode {
        let code = match self.execute_line(line, stdout) {
            Ok(Flow::Continue) => 0,
            Ok(Flow::Exit(code)) => code,
            Err(err) => {
                user_error!("{err:#}");
                1
            }
        };
        let _ = stdout.flush();
        code
    }

    /// Tokenizes `line` and runs it as a builtin, a pipeline, or a single command.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write) -> Result<Flow> {
        let content = line.trim_end_matches(|c| c == '\n' || c == '\r');
        if content.len() >= self.config.max_line_length {
            bail!(
                "line too long (limit is {} bytes)",
                self.config.max_line_length - 1
            );
        }

        let mut words = lexer::split_into_tokens(content, lexer::DELIMITER, self.config.max_tokens);
        if words.is_empty() {
            return Ok(Flow::Continue);
        }
        let background = lexer::strip_background_marker(&mut words);
        dev_debug!("words {words:?}, background: {background}");

        if let Some(res) = builtin::dispatch(&words, stdout, &mut self.env, self.procs.as_mut()) {
            res?;
            return Ok(match self.env.exit_status.take() {
                Some(code) => Flow::Exit(code),
                None => Flow::Continue,
            });
        }

        if pipeline::is_pipeline(&words) {
            let pipeline = Pipeline::split(&words, self.config.max_pipeline_segments)?;
            if let Some(argv) = pipeline
                .segments()
                .iter()
                .find(|argv| builtin::is_builtin(argv[0]))
            {
                bail!("{}: builtins cannot be used in a pipeline", argv[0]);
            }
            if background {
                user_warn!("pipelines cannot run in the background; running in the foreground");
            }
            launch::run_pipeline(&pipeline, self.procs.as_mut(), self.interrupt)?;
        } else {
            let (plan, argv) = RedirectionPlan::from_args(&words)?;
            launch::run_command(
                &argv,
                plan,
                background,
                &mut self.env.jobs,
                self.procs.as_mut(),
                stdout,
            )?;
        }

        // An interrupt during a foreground wait ended the child; start on a new line.
        if self.interrupt.take() {
            writeln!(stdout)?;
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::{Call, RecordingProcesses};
    use nix::sys::signal::Signal;
    use nix::unistd::Pid;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct ScriptedInput {
        inputs: VecDeque<Input>,
        prompts: usize,
    }

    impl ScriptedInput {
        fn new(inputs: impl IntoIterator<Item = Input>) -> Self {
            Self {
                inputs: inputs.into_iter().collect(),
                prompts: 0,
            }
        }
    }

    impl LineReader for ScriptedInput {
        fn read_line(&mut self, _prompt: &str) -> Result<Input> {
            self.prompts += 1;
            Ok(self.inputs.pop_front().unwrap_or(Input::Eof))
        }
    }

    fn line(text: &str) -> Input {
        Input::Line(format!("{text}\n"))
    }

    fn shell_with(config: ShellConfig) -> (Interpreter, RecordingProcesses, Interrupt) {
        let procs = RecordingProcesses::new();
        let interrupt = Interrupt::detached();
        let sh = Interpreter::new(config, Box::new(procs.clone()), interrupt);
        (sh, procs, interrupt)
    }

    fn shell() -> (Interpreter, RecordingProcesses, Interrupt) {
        shell_with(ShellConfig::default())
    }

    fn execute(sh: &mut Interpreter, text: &str) -> (Result<Flow>, String) {
        let mut out = Vec::new();
        let res = sh.execute_line(text, &mut out);
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_blank_lines_do_nothing() {
        let (mut sh, procs, _) = shell();
        for text in ["", "\n", "    \n"] {
            let (res, out) = execute(&mut sh, text);
            assert_eq!(res.unwrap(), Flow::Continue);
            assert_eq!(out, "");
        }
        assert!(procs.calls().is_empty());
    }

    #[test]
    fn test_plain_command_runs_in_foreground() {
        let (mut sh, procs, _) = shell();
        let (res, _) = execute(&mut sh, "echo a b c\n");

        assert_eq!(res.unwrap(), Flow::Continue);
        assert_eq!(procs.spawned(), vec![vec!["echo", "a", "b", "c"]]);
        assert_eq!(procs.waited(), vec![Pid::from_raw(1000)]);
    }

    #[test]
    fn test_background_then_wait() {
        let (mut sh, procs, _) = shell();

        let (res, out) = execute(&mut sh, "sleep 5 &");
        res.unwrap();
        assert_eq!(out, "Running in background with PID 1000\n");
        assert_eq!(sh.env().jobs.len(), 1);
        assert!(procs.waited().is_empty());

        execute(&mut sh, "wait").0.unwrap();
        assert_eq!(procs.waited(), vec![Pid::from_raw(1000)]);
        assert!(sh.env().jobs.is_empty());
    }

    #[test]
    fn test_bg_keeps_job_and_fg_removes_it() {
        let (mut sh, procs, _) = shell();
        execute(&mut sh, "sleep 5 &").0.unwrap();

        let (_, out) = execute(&mut sh, "bg");
        assert_eq!(out, "Running in background with PID 1000\n");
        assert_eq!(sh.env().jobs.len(), 1);

        execute(&mut sh, "fg 1000").0.unwrap();
        assert!(sh.env().jobs.is_empty());
        assert_eq!(
            procs.calls()[1..].to_vec(),
            vec![
                Call::Signal(Pid::from_raw(1000), Signal::SIGCONT),
                Call::Signal(Pid::from_raw(1000), Signal::SIGCONT),
                Call::Wait(Pid::from_raw(1000)),
            ]
        );
    }

    #[test]
    fn test_fg_without_jobs() {
        let (mut sh, procs, _) = shell();
        let (res, out) = execute(&mut sh, "fg");
        assert_eq!(res.unwrap(), Flow::Continue);
        assert_eq!(out, "No background jobs\n");
        assert!(procs.waited().is_empty());
    }

    #[test]
    fn test_pipeline_spawns_every_segment() {
        let (mut sh, procs, _) = shell();
        execute(&mut sh, "cmd1 | cmd2 | cmd3").0.unwrap();

        assert_eq!(procs.spawned().len(), 3);
        assert_eq!(procs.pipes(), 2);
        assert_eq!(procs.waited().len(), 3);
    }

    #[test]
    fn test_background_pipeline_runs_in_foreground() {
        let (mut sh, procs, _) = shell();
        execute(&mut sh, "yes | head &").0.unwrap();

        assert_eq!(procs.spawned(), vec![vec!["yes"], vec!["head"]]);
        assert_eq!(procs.waited().len(), 2);
        assert!(sh.env().jobs.is_empty());
    }

    #[test]
    fn test_builtin_inside_pipeline_is_rejected() {
        let (mut sh, procs, _) = shell();
        let (res, _) = execute(&mut sh, "ls | fg");
        assert!(res.is_err());
        assert!(procs.calls().is_empty());
    }

    #[test]
    fn test_exit_codes() {
        let (mut sh, _, _) = shell();
        assert_eq!(execute(&mut sh, "exit").0.unwrap(), Flow::Exit(0));
        assert_eq!(execute(&mut sh, "exit 5").0.unwrap(), Flow::Exit(5));

        let (res, out) = execute(&mut sh, "exit -1");
        assert_eq!(res.unwrap(), Flow::Continue);
        assert_eq!(out, "Invalid exit code\n");
    }

    #[test]
    fn test_builtins_take_priority_over_redirection() {
        let (mut sh, procs, _) = shell();
        // `pwd` takes no operands, so the operator reaches it as a stray argument
        let (res, out) = execute(&mut sh, "pwd > /nonexistent/dir/file");
        assert!(res.is_err());
        assert_eq!(out, "");
        assert!(procs.calls().is_empty());
    }

    #[test]
    fn test_redirection_reaches_child() {
        let (mut sh, procs, _) = shell();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("jobsh_interp_{}_{nanos}", std::process::id()));

        execute(&mut sh, &format!("echo hi > {}", path.display())).0.unwrap();

        assert_eq!(
            procs.calls()[0],
            Call::Spawn {
                argv: vec!["echo".into(), "hi".into()],
                stdin: false,
                stdout: true,
                pid: Pid::from_raw(1000),
            }
        );
        assert!(path.exists());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_failed_redirection_launches_nothing() {
        let (mut sh, procs, _) = shell();
        let (res, _) = execute(&mut sh, "cat < /nonexistent/jobsh/input");
        assert!(format!("{:#}", res.unwrap_err()).contains("open failed"));
        assert!(procs.calls().is_empty());
    }

    #[test]
    fn test_unknown_command_is_recoverable() {
        let (mut sh, procs, _) = shell();
        procs.fail_spawn("nope");

        let (res, _) = execute(&mut sh, "nope");
        assert!(res.is_err());
        let (res, _) = execute(&mut sh, "true");
        assert_eq!(res.unwrap(), Flow::Continue);
    }

    #[test]
    fn test_lone_ampersand_is_a_command() {
        let (mut sh, procs, _) = shell();
        execute(&mut sh, "&").0.unwrap();
        assert_eq!(procs.spawned(), vec![vec!["&"]]);
        assert!(sh.env().jobs.is_empty());
    }

    #[test]
    fn test_words_past_limit_are_dropped() {
        let (mut sh, procs, _) = shell_with(ShellConfig {
            max_tokens: 2,
            ..ShellConfig::default()
        });
        execute(&mut sh, "echo a b c").0.unwrap();
        assert_eq!(procs.spawned(), vec![vec!["echo", "a"]]);
    }

    #[test]
    fn test_long_lines_are_rejected() {
        let (mut sh, procs, _) = shell_with(ShellConfig {
            max_line_length: 8,
            ..ShellConfig::default()
        });
        assert!(execute(&mut sh, "echo 123\n").0.is_err());
        assert!(execute(&mut sh, "echo 12\n").0.is_ok());
        assert_eq!(procs.spawned(), vec![vec!["echo", "12"]]);
    }

    #[test]
    fn test_repl_runs_until_exit() {
        let (mut sh, procs, _) = shell();
        let mut input = ScriptedInput::new([line("echo one"), line("exit 7"), line("echo two")]);
        let mut out = Vec::new();

        assert_eq!(sh.repl(&mut input, &mut out).unwrap(), 7);
        assert_eq!(procs.spawned(), vec![vec!["echo", "one"]]);
    }

    #[test]
    fn test_repl_end_of_input_exits_zero() {
        let (mut sh, _, _) = shell();
        let mut input = ScriptedInput::new([line("sleep 1 &")]);
        assert_eq!(sh.repl(&mut input, &mut Vec::new()).unwrap(), 0);
    }

    #[test]
    fn test_repl_survives_errors() {
        let (mut sh, procs, _) = shell();
        let mut input = ScriptedInput::new([line("cd"), line("ls |"), line("ls")]);
        assert_eq!(sh.repl(&mut input, &mut Vec::new()).unwrap(), 0);
        assert_eq!(procs.spawned(), vec![vec!["ls"]]);
    }

    #[test]
    fn test_interrupted_read_reprompts() {
        let (mut sh, procs, interrupt) = shell();
        interrupt.raise();
        let mut input = ScriptedInput::new([Input::Interrupted, line("exit 2")]);
        let mut out = Vec::new();

        assert_eq!(sh.repl(&mut input, &mut out).unwrap(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), "\n");
        assert_eq!(input.prompts, 2);
        assert!(procs.calls().is_empty());
        assert!(!interrupt.is_raised());
    }

    #[test]
    fn test_stale_interrupt_does_not_cancel_next_pipeline() {
        let (mut sh, procs, interrupt) = shell();
        interrupt.raise();
        let mut input = ScriptedInput::new([line("a | b")]);

        sh.repl(&mut input, &mut Vec::new()).unwrap();
        assert_eq!(procs.spawned().len(), 2);
    }
}
