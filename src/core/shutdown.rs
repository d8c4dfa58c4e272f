//! Cooperative shutdown flag shared by every actor thread.
//!
//! A single `Arc<AtomicBool>`, optionally wired to SIGINT/SIGTERM, trimmed to
//! the one flag this system needs (no reload/rescan signals).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared shutdown flag. Every actor's receive loop polls this at the same
/// cadence as its transport's read timeout.
#[derive(Clone)]
pub struct ShutdownFlag {
    flag: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// A flag that is not yet set, with SIGINT/SIGTERM registered to set it.
    ///
    /// Registration is best-effort: a failure is logged to stderr but not
    /// fatal.
    #[must_use]
    pub fn new() -> Self {
        let flag = Self {
            flag: Arc::new(AtomicBool::new(false)),
        };
        #[cfg(feature = "daemon")]
        flag.register_signals();
        flag
    }

    /// A flag with no OS signal registration, for tests and embedding.
    #[must_use]
    pub fn bare() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn set(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[cfg(feature = "daemon")]
    fn register_signals(&self) {
        use signal_hook::consts::{SIGINT, SIGTERM};
        if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&self.flag)) {
            eprintln!("[LIFT-SIGNAL] failed to register SIGTERM: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGINT, Arc::clone(&self.flag)) {
            eprintln!("[LIFT-SIGNAL] failed to register SIGINT: {e}");
        }
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}
