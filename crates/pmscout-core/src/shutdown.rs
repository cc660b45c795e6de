//! Graceful interruption between fetch batches
//!
//! First SIGINT/SIGTERM raises the flag; the harvester stops dispatching new
//! batches and the records extracted so far are still written. A second
//! signal exits immediately with status 130.

use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status of an interrupted run
pub const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Global interruption flag
pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// Whether an interrupt has been received
pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::Relaxed)
}

/// Raise the flag without a signal
pub fn request_shutdown() {
    shutdown_flag().store(true, Ordering::Relaxed);
}

/// Register SIGINT and SIGTERM handlers.
pub fn install_signal_handlers() -> std::io::Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
        unsafe {
            signal_hook::low_level::register(signal, || {
                if shutdown_flag().swap(true, Ordering::Relaxed) {
                    std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
                }
            })?;
        }
    }
    Ok(())
}
