//! Ctrl+C / SIGTERM handling
//!
//! The handler only clears the shared running flag. The logging loop polls
//! that flag between reads and winds down on its own.

use crate::error::{LoggerError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static RUNNING: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Route SIGINT and SIGTERM to `running`.
///
/// Only the first call takes effect; later calls keep the original flag.
pub fn install(running: Arc<AtomicBool>) -> Result<()> {
    if RUNNING.set(running).is_err() {
        log::debug!("Interrupt handler already installed");
        return Ok(());
    }

    #[cfg(unix)]
    {
        for signum in [libc::SIGINT, libc::SIGTERM] {
            // SAFETY: the handler only performs an atomic store.
            let previous = unsafe { libc::signal(signum, handle_stop as libc::sighandler_t) };
            if previous == libc::SIG_ERR {
                return Err(LoggerError::Signal(std::io::Error::last_os_error()));
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
extern "C" fn handle_stop(_: libc::c_int) {
    if let Some(running) = RUNNING.get() {
        running.store(false, Ordering::SeqCst);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_sigint_clears_flag() {
        let running = Arc::new(AtomicBool::new(true));
        install(Arc::clone(&running)).unwrap();

        // SAFETY: raising a signal we just installed a handler for.
        unsafe {
            libc::raise(libc::SIGINT);
        }
        assert!(!running.load(Ordering::SeqCst));
    }
}
