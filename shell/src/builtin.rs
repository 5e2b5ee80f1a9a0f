use crate::command::{ExitCode, ProcessControl};
use crate::env::Environment;
use crate::job::JobTable;
use anyhow::{Context, Result, anyhow, bail};
use argh::{EarlyExit, FromArgs};
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use regex::Regex;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "fg" or "cd".
    const NAME: &'static str;

    /// Parses the words following the command name.
    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[Self::NAME], args)
    }

    /// Executes the command against the shell's state.
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        procs: &mut dyn ProcessControl,
    ) -> Result<()>;
}

type Runner =
    fn(&[&str], &mut dyn Write, &mut Environment, &mut dyn ProcessControl) -> Result<()>;

/// Builtins in the order they are matched.
const BUILTINS: &[(&str, Runner)] = &[
    (Exit::NAME, run::<Exit>),
    (Wait::NAME, run::<Wait>),
    (Fg::NAME, run::<Fg>),
    (Bg::NAME, run::<Bg>),
    (Cd::NAME, run::<Cd>),
    (Pwd::NAME, run::<Pwd>),
];

/// Runs `words` as a builtin if its first word names one.
///
/// Returns `None` when the command is not a builtin and must be launched instead.
pub fn dispatch(
    words: &[&str],
    stdout: &mut dyn Write,
    env: &mut Environment,
    procs: &mut dyn ProcessControl,
) -> Option<Result<()>> {
    let (name, args) = words.split_first()?;
    BUILTINS
        .iter()
        .find(|(builtin, _)| builtin == name)
        .map(|(_, run)| run(args, stdout, env, procs))
}

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.iter().any(|(builtin, _)| *builtin == name)
}

fn run<T: BuiltinCommand>(
    args: &[&str],
    stdout: &mut dyn Write,
    env: &mut Environment,
    procs: &mut dyn ProcessControl,
) -> Result<()> {
    match T::parse(args) {
        Ok(cmd) => cmd.execute(stdout, env, procs),
        Err(EarlyExit { output, status }) => match status {
            Ok(()) => Ok(stdout.write_all(output.as_bytes())?),
            Err(()) => Err(anyhow!("{}", output.trim_end())),
        },
    }
}

/// Arguments for builtins whose operand may be a negative number.
///
/// argh would take `-1` for an unknown flag, so a `--` is put in front of it.
fn numeric_operands<'a>(args: &[&'a str]) -> Vec<&'a str> {
    static NEGATIVE: OnceLock<Regex> = OnceLock::new();
    let negative = NEGATIVE.get_or_init(|| Regex::new(r"^-\d").expect("valid regex"));
    match args.first() {
        Some(first) if negative.is_match(first) => {
            std::iter::once("--").chain(args.iter().copied()).collect()
        }
        _ => args.to_vec(),
    }
}

/// Lenient integer parsing: leading blanks, an optional sign, then as many digits
/// as there are. Anything unparsable yields 0; out-of-range values saturate.
pub fn parse_leading_int(word: &str) -> i32 {
    static LEADING_INT: OnceLock<Regex> = OnceLock::new();
    let leading_int =
        LEADING_INT.get_or_init(|| Regex::new(r"^\s*([+-]?)(\d+)").expect("valid regex"));
    let Some(caps) = leading_int.captures(word) else {
        return 0;
    };
    let negative = &caps[1] == "-";
    let magnitude = caps[2].parse::<i64>().unwrap_or(i64::MAX);
    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i32::MIN.into(), i32::MAX.into()) as i32
}

/// Picks the pid `fg` and `bg` act on.
///
/// A pid is only taken from a single operand; with none or several, the oldest job
/// is used.
fn select_target(name: &str, operands: &[String], jobs: &JobTable) -> Result<Option<Pid>> {
    match operands {
        [word] => match word.parse::<i32>() {
            Ok(raw) if raw > 0 => Ok(Some(Pid::from_raw(raw))),
            _ => bail!("{name}: invalid pid: {word}"),
        },
        _ => Ok(jobs.oldest()),
    }
}

#[derive(FromArgs)]
/// Exit the shell, with status 0 or the given code.
pub struct Exit {
    #[argh(positional)]
    /// exit status; only the first operand counts and it must not be negative.
    pub code: Vec<String>,
}

impl BuiltinCommand for Exit {
    const NAME: &'static str = "exit";

    /// Every word is an operand, even `help` or `-x`.
    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        let operands: Vec<&str> = std::iter::once("--").chain(args.iter().copied()).collect();
        Self::from_args(&[Self::NAME], &operands)
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _procs: &mut dyn ProcessControl,
    ) -> Result<()> {
        let code: ExitCode = self.code.first().map_or(0, |word| parse_leading_int(word));
        if code < 0 {
            writeln!(stdout, "Invalid exit code")?;
            return Ok(());
        }
        env.exit_status = Some(code);
        Ok(())
    }
}

#[derive(FromArgs)]
/// Wait for every background job to finish, oldest first.
pub struct Wait {}

impl BuiltinCommand for Wait {
    const NAME: &'static str = "wait";

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        procs: &mut dyn ProcessControl,
    ) -> Result<()> {
        // A failed wait stops here and keeps this job and every later one.
        while let Some(pid) = env.jobs.oldest() {
            procs.wait(pid)?;
            env.jobs.remove(pid);
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Continue a job and wait for it in the foreground.
pub struct Fg {
    #[argh(positional)]
    /// process id; defaults to the oldest background job.
    pub pid: Vec<String>,
}

impl BuiltinCommand for Fg {
    const NAME: &'static str = "fg";

    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[Self::NAME], &numeric_operands(args))
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        procs: &mut dyn ProcessControl,
    ) -> Result<()> {
        let Some(pid) = select_target(Self::NAME, &self.pid, &env.jobs)? else {
            writeln!(stdout, "No background jobs")?;
            return Ok(());
        };
        procs.signal(pid, Signal::SIGCONT)?;
        procs.wait(pid)?;
        env.jobs.remove(pid);
        Ok(())
    }
}

#[derive(FromArgs)]
/// Continue a stopped job without waiting for it.
pub struct Bg {
    #[argh(positional)]
    /// process id; defaults to the oldest background job.
    pub pid: Vec<String>,
}

impl BuiltinCommand for Bg {
    const NAME: &'static str = "bg";

    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[Self::NAME], &numeric_operands(args))
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        procs: &mut dyn ProcessControl,
    ) -> Result<()> {
        let Some(pid) = select_target(Self::NAME, &self.pid, &env.jobs)? else {
            writeln!(stdout, "No background jobs")?;
            return Ok(());
        };
        // Unlike fg, the job table is left exactly as it is.
        procs.signal(pid, Signal::SIGCONT)?;
        writeln!(stdout, "Running in background with PID {pid}")?;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    const NAME: &'static str = "cd";

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _procs: &mut dyn ProcessControl,
    ) -> Result<()> {
        let target = match self.target.as_deref() {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => bail!("cd: missing directory operand"),
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    const NAME: &'static str = "pwd";

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _procs: &mut dyn ProcessControl,
    ) -> Result<()> {
        writeln!(stdout, "{}", env.current_dir.display())?;
        Ok(())
    }
}
