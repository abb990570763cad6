//! Cooperative shutdown flag, set from signal handlers

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide shutdown flag. Signal handlers set it; capture loops poll it.
pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// Check if shutdown was requested
pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::Relaxed)
}

/// Request shutdown (for signal handlers)
pub fn request_shutdown() {
    shutdown_flag().store(true, Ordering::Relaxed);
}
