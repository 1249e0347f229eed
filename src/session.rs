//! Shared session state: `connected` and `restart_requested`, observed by
//! every activity.
//!
//! Grounded on the ambient representation choice recorded in
//! `SPEC_FULL.md` §3: plain `AtomicBool`s rather than mutex-guarded
//! booleans, which still satisfies "atomic-observable from all activities"
//! without a lock a reader has to take just to peek at a flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shared between the Connection Manager, Receiver, Sender, and Event
/// Processor. One instance per [`crate::CresnetClient`], handed out as
/// clones of an `Arc`.
#[derive(Debug, Default)]
pub struct Session {
    connected: AtomicBool,
    restart_requested: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, value: bool) {
        self.connected.store(value, Ordering::Release);
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested.load(Ordering::Acquire)
    }

    /// Latched by any I/O error or protocol-level disconnect.
    pub fn request_restart(&self) {
        self.restart_requested.store(true, Ordering::Release);
    }

    /// Cleared by the Connection Manager once a fresh socket is live.
    pub fn clear_restart(&self) {
        self.restart_requested.store(false, Ordering::Release);
    }
}
