use argh::FromArgs;
use jobsh::config::DEFAULT_PROMPT;
use jobsh::{ShellConfig, ShellLogger, run_shell};
use std::io::Write;

#[derive(FromArgs)]
/// A small interactive shell with pipelines, redirection and background jobs.
struct Options {
    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    /// text printed before each command line.
    prompt: String,

    #[argh(switch)]
    /// do not print a prompt.
    no_prompt: bool,

    #[argh(option, short = 'c')]
    /// execute this command line and exit.
    command: Option<String>,

    #[argh(switch, short = 'v')]
    /// trace what the shell does on standard error.
    verbose: bool,
}

fn main() {
    let options: Options = argh::from_env();
    ShellLogger::to_stderr("jobsh: ").into_global_logger(options.verbose);

    let config = ShellConfig {
        prompt: options.prompt,
        show_prompt: !options.no_prompt,
        ..ShellConfig::default()
    };
    let code = match run_shell(config, options.command.as_deref()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("jobsh: {err:#}");
            1
        }
    };
    let _ = std::io::stdout().flush();
    std::process::exit(code);
}
