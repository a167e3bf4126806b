//! Ctrl+C handling.
//!
//! A single `AtomicBool` is shared by the walker, the hashing pool and the
//! archive reader. The first SIGINT sets it; each of them checks it between
//! files and blocks and unwinds with a cancellation error. The cache is then
//! dropped normally, which releases its lock file.
//!
//! ```rust,no_run
//! use ftwin::duplicates::FinderConfig;
//! use ftwin::signal::install_handler;
//!
//! let handler = install_handler().expect("signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request cancellation as if SIGINT had arrived.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to workers.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide SIGINT/SIGTERM handler.
///
/// The hook can only be registered once per process. Later calls return the
/// same handler with its flag cleared.
///
/// # Errors
///
/// Returns an error if the OS refuses the hook on the first call.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    match ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Cleaning up...");
        let _ = stderr.flush();
    }) {
        Ok(()) => Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone()),
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Signal handler already registered, using unhooked handler");
            let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
            handler.reset();
            Ok(handler.clone())
        }
        Err(e) => Err(e.into()),
    }
}
