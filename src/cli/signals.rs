//! Shutdown signal handling for the run loop

use std::sync::atomic::{AtomicBool, Ordering};

/// Set from the signal handler; read by the run loop
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Shutdown signal for the cooperative run loop.
///
/// SIGINT and SIGTERM only set a flag; the loop notices it between ticks
/// and finishes the current session through the upload path.
pub struct ShutdownSignal {
    flag: &'static AtomicBool,
}

impl ShutdownSignal {
    /// Create a shutdown signal backed by the process-wide flag
    pub fn new() -> Self {
        Self {
            flag: &SHUTDOWN_REQUESTED,
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown without a signal
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Install SIGINT and SIGTERM handlers
    #[cfg(unix)]
    pub fn setup(&self) -> Result<(), std::io::Error> {
        use nix::sys::signal::Signal;

        for signal in [Signal::SIGINT, Signal::SIGTERM] {
            install_flag_handler(signal)?;
        }
        Ok(())
    }

    /// Signals are not wired up on this platform; the loop runs until killed
    #[cfg(not(unix))]
    pub fn setup(&self) -> Result<(), std::io::Error> {
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Route `signal` to a handler that only sets `SHUTDOWN_REQUESTED`
#[cfg(unix)]
fn install_flag_handler(signal: nix::sys::signal::Signal) -> Result<(), std::io::Error> {
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet};

    extern "C" fn on_signal(_: nix::libc::c_int) {
        SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
    }

    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler performs a single atomic store, which is
    // async-signal-safe, and touches no other state.
    unsafe { sigaction(signal, &action) }
        .map(|_| ())
        .map_err(std::io::Error::from)
}
