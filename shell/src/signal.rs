//! Keyboard-interrupt handling.
//!
//! The SIGINT handler does nothing but raise a flag. Because it is installed without
//! `SA_RESTART`, a read blocked on the terminal or a pipe fails with `EINTR`, which
//! the line readers report as [`Input::Interrupted`](crate::input::Input). The
//! interpreter then drops the partial line and goes back to the prompt.
use crate::log::user_warn;
use nix::libc::c_int;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::sync::atomic::{AtomicBool, Ordering};

static SIGINT_RAISED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_: c_int) {
    SIGINT_RAISED.store(true, Ordering::SeqCst);
}

/// Handle to an interrupt flag, polled between the steps of a command.
#[derive(Debug, Clone, Copy)]
pub struct Interrupt {
    flag: &'static AtomicBool,
}

impl Interrupt {
    /// The flag raised by the SIGINT handler.
    pub fn keyboard() -> Interrupt {
        Interrupt {
            flag: &SIGINT_RAISED,
        }
    }

    /// A private flag no signal handler touches.
    #[cfg(test)]
    pub(crate) fn detached() -> Interrupt {
        Interrupt {
            flag: Box::leak(Box::new(AtomicBool::new(false))),
        }
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clears the flag, returning whether it was raised.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

/// The installed SIGINT handler.
///
/// Dropping it restores whatever action was registered before [`InterruptHandler::install`].
pub struct InterruptHandler {
    original: SigAction,
}

impl InterruptHandler {
    pub fn install() -> nix::Result<InterruptHandler> {
        let action = SigAction::new(
            SigHandler::Handler(on_sigint),
            SaFlags::empty(),
            SigSet::empty(),
        );
        // SAFETY: the handler only stores into an atomic, which is async-signal-safe.
        let original = unsafe { sigaction(Signal::SIGINT, &action)? };
        Ok(InterruptHandler { original })
    }

    pub fn interrupt(&self) -> Interrupt {
        Interrupt::keyboard()
    }
}

impl Drop for InterruptHandler {
    fn drop(&mut self) {
        // SAFETY: restores an action previously returned by sigaction.
        if let Err(err) = unsafe { sigaction(Signal::SIGINT, &self.original) } {
            user_warn!("cannot restore the original SIGINT action: {err}");
        }
    }
}
