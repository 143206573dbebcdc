//! SIGINT bridge between signal context and the supervisor's poll loop.
//!
//! The handler only touches two atomics and `sigaction`, both
//! async-signal-safe. The supervisor consumes the flags through
//! [`InterruptSource`] and never sees the raw bits.

use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InterruptError {
    #[error("SIGINT handler already installed")]
    AlreadyInstalled,
    #[error("failed to register SIGINT handler")]
    Register(#[source] io::Error),
}

/// The two flags shared between the handler and the poll loop.
#[derive(Debug, Default)]
pub struct InterruptFlags {
    caught_interrupt: AtomicBool,
    waiting_for_eos: AtomicBool,
}

impl InterruptFlags {
    pub const fn new() -> Self {
        Self {
            caught_interrupt: AtomicBool::new(false),
            waiting_for_eos: AtomicBool::new(false),
        }
    }

    /// Handler body. While an EOS is pending the interrupt only clears the
    /// pending mark, so the next one falls through to `restore`.
    pub fn on_interrupt(&self, restore: impl FnOnce()) {
        if !self.waiting_for_eos.swap(false, Ordering::SeqCst) {
            restore();
        }
        self.caught_interrupt.store(true, Ordering::SeqCst);
    }

    /// Read and clear `caught_interrupt`.
    pub fn take_interrupt(&self) -> bool {
        self.caught_interrupt.swap(false, Ordering::SeqCst)
    }

    pub fn set_waiting_for_eos(&self, waiting: bool) {
        self.waiting_for_eos.store(waiting, Ordering::SeqCst);
    }

    pub fn waiting_for_eos(&self) -> bool {
        self.waiting_for_eos.load(Ordering::SeqCst)
    }
}

/// Interrupt state as seen by the supervisor.
pub trait InterruptSource {
    fn take_interrupt(&self) -> bool;
    fn set_waiting_for_eos(&self, waiting: bool);
    /// Return SIGINT to the OS default disposition. Idempotent.
    fn restore(&self);
}

impl<T: InterruptSource + ?Sized> InterruptSource for &T {
    fn take_interrupt(&self) -> bool {
        (**self).take_interrupt()
    }

    fn set_waiting_for_eos(&self, waiting: bool) {
        (**self).set_waiting_for_eos(waiting);
    }

    fn restore(&self) {
        (**self).restore();
    }
}

static FLAGS: InterruptFlags = InterruptFlags::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_signum: libc::c_int) {
    FLAGS.on_interrupt(restore_default);
}

#[cfg(unix)]
fn restore_default() {
    // SAFETY: sigaction is async-signal-safe and `action` is fully initialised.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = libc::SIG_DFL;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut());
    }
}

#[cfg(not(unix))]
fn restore_default() {
    // SAFETY: resetting to SIG_DFL has no preconditions.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

#[cfg(unix)]
fn register_handler() -> io::Result<()> {
    // SAFETY: the handler only performs async-signal-safe operations.
    let rc = unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut())
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn register_handler() -> io::Result<()> {
    // SAFETY: see the unix variant.
    let previous = unsafe {
        libc::signal(
            libc::SIGINT,
            handle_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t,
        )
    };
    if previous == libc::SIG_ERR {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Process-wide SIGINT bridge. At most one exists per process.
#[derive(Debug)]
pub struct SigintBridge {
    _private: (),
}

impl SigintBridge {
    pub fn install() -> Result<Self, InterruptError> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(InterruptError::AlreadyInstalled);
        }
        if let Err(err) = register_handler() {
            INSTALLED.store(false, Ordering::SeqCst);
            return Err(InterruptError::Register(err));
        }
        debug!("SIGINT handler installed");
        Ok(Self { _private: () })
    }
}

impl InterruptSource for SigintBridge {
    fn take_interrupt(&self) -> bool {
        FLAGS.take_interrupt()
    }

    fn set_waiting_for_eos(&self, waiting: bool) {
        FLAGS.set_waiting_for_eos(waiting);
    }

    fn restore(&self) {
        restore_default();
    }
}
