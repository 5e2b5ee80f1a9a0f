//! Diagnostics routed through the `log` facade.
//!
//! Messages for the person at the prompt go to the `jobsh::user` target and are
//! always shown. Tracing of the shell's own decisions goes to `jobsh::dev` and is
//! only shown in verbose mode.
#![allow(unused_macros)]
use std::io::Write;

macro_rules! logger_macro {
    ($name:ident is $rule_level:ident to $target:expr, $d:tt) => {
        macro_rules! $name {
            ($d($d arg:tt)+) => (::log::log!(target: $target, ::log::Level::$rule_level, $d($d arg)+));
        }

        pub(crate) use $name;
    };
    ($name:ident is $rule_level:ident to $target:expr) => {
        logger_macro!($name is $rule_level to $target, $);
    };
}

logger_macro!(user_error is Error to "jobsh::user");
logger_macro!(user_warn is Warn to "jobsh::user");
logger_macro!(dev_debug is Debug to "jobsh::dev");

const TARGET_PREFIX: &str = "jobsh::";

/// Writes every enabled record on its own line, behind a fixed prefix.
pub struct ShellLogger<W: Send + Sync>
where
    for<'a> &'a W: Write,
{
    target: W,
    prefix: &'static str,
}

impl ShellLogger<std::io::Stderr> {
    pub fn to_stderr(prefix: &'static str) -> Self {
        ShellLogger {
            target: std::io::stderr(),
            prefix,
        }
    }
}

impl<W: Send + Sync + 'static> ShellLogger<W>
where
    for<'a> &'a W: Write,
{
    /// Installs this logger for the whole process.
    ///
    /// Developer tracing is only let through when `verbose` is set.
    pub fn into_global_logger(self, verbose: bool) {
        let level = if verbose {
            ::log::LevelFilter::Debug
        } else {
            ::log::LevelFilter::Warn
        };
        if ::log::set_boxed_logger(Box::new(self)).is_ok() {
            ::log::set_max_level(level);
        }
    }
}

impl<W: Send + Sync> ::log::Log for ShellLogger<W>
where
    for<'a> &'a W: Write,
{
    fn enabled(&self, metadata: &::log::Metadata) -> bool {
        // Dependencies log through the same facade; only our own targets are shown.
        metadata.target().starts_with(TARGET_PREFIX) && metadata.level() <= ::log::max_level()
    }

    fn log(&self, record: &::log::Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(&self.target, "{}{}", self.prefix, record.args());
        }
    }

    fn flush(&self) {
        let _ = (&self.target).flush();
    }
}
