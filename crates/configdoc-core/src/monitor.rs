#![forbid(unsafe_code)]

//! Suppression of self-inflicted raw-store events.
//!
//! When a typed view writes back into the raw store, the store publishes a
//! change like any other. The document must not reflect that change into
//! its views a second time, so the write runs inside a [`Silence`] scope and
//! the raw-store handler checks [`EventMonitor::events_enabled`] first.
//!
//! The monitor is a depth counter rather than a flag: nested silenced writes
//! (a list write that triggers a cell write, say) only re-enable events once
//! the outermost scope ends. The guard restores the depth on every exit
//! path, unwinding included.
//!
//! The depth is atomic, so the monitor can be shared by a document used from
//! several threads. It is still one counter per document: while any thread
//! holds a silence scope, raw events from every thread are dropped for that
//! document. Concurrent writers on one document must coordinate.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-document suppression state.
#[derive(Debug, Default)]
pub(crate) struct EventMonitor {
    depth: AtomicUsize,
}

impl EventMonitor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether raw-store events should reach the typed views.
    pub(crate) fn events_enabled(&self) -> bool {
        self.depth.load(Ordering::Acquire) == 0
    }

    /// Suppress events until the returned guard drops.
    #[must_use = "events are re-enabled as soon as the guard drops"]
    pub(crate) fn silence(&self) -> Silence<'_> {
        self.depth.fetch_add(1, Ordering::AcqRel);
        Silence { depth: &self.depth }
    }

    /// Run `f` with events suppressed.
    pub(crate) fn run_silently<R>(&self, f: impl FnOnce() -> R) -> R {
        let _silence = self.silence();
        f()
    }
}

/// RAII guard for a suppression scope.
pub(crate) struct Silence<'a> {
    depth: &'a AtomicUsize,
}

impl Drop for Silence<'_> {
    fn drop(&mut self) {
        let released = self
            .depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| d.checked_sub(1));
        debug_assert!(released.is_ok(), "silence scope released twice");
    }
}
