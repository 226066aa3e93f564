//! Frame ticking
//!
//! The engine is single-threaded and frame-driven: nothing blocks, and
//! "waiting" means being advanced once per rendered frame. A [`Ticker`] is
//! the registration an animating activity holds while it wants those frame
//! advances. The [`Vsync`] registry tracks every live ticker so the host can
//! ask "does anything still need frames?" before parking its loop.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Unique identifier for a ticker registration
    pub struct TickerId;
}

struct VsyncInner {
    tickers: SlotMap<TickerId, bool>,
}

/// Registry of frame-tick registrations.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct Vsync {
    inner: Arc<Mutex<VsyncInner>>,
}

impl Vsync {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VsyncInner {
                tickers: SlotMap::with_key(),
            })),
        }
    }

    /// Create a new ticker, initially stopped.
    pub fn create_ticker(&self) -> Ticker {
        let id = self.inner.lock().unwrap().tickers.insert(false);
        Ticker {
            id,
            vsync: Arc::downgrade(&self.inner),
            active: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Whether any ticker is currently running.
    ///
    /// The host frame loop can stop scheduling frames once this is false.
    pub fn has_active_tickers(&self) -> bool {
        self.inner
            .lock()
            .unwrap()
            .tickers
            .values()
            .any(|active| *active)
    }

    /// Number of live ticker registrations (running or not).
    pub fn ticker_count(&self) -> usize {
        self.inner.lock().unwrap().tickers.len()
    }
}

impl Default for Vsync {
    fn default() -> Self {
        Self::new()
    }
}

/// A per-frame advance registration owned by exactly one animating activity.
///
/// The owner must [`stop`](Ticker::stop) the ticker before dropping it;
/// dropping a running ticker is a resource leak and trips a debug assertion.
pub struct Ticker {
    id: TickerId,
    vsync: Weak<Mutex<VsyncInner>>,
    active: bool,
    elapsed: Duration,
}

impl Ticker {
    /// Start receiving frame advances, resetting elapsed time to zero.
    pub fn start(&mut self) {
        self.active = true;
        self.elapsed = Duration::ZERO;
        self.mark(true);
    }

    /// Stop receiving frame advances.
    pub fn stop(&mut self) {
        self.active = false;
        self.mark(false);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance by one frame delta and return total elapsed time since start.
    pub fn tick(&mut self, dt: Duration) -> Duration {
        debug_assert!(self.active, "tick() on a stopped ticker");
        self.elapsed += dt;
        self.elapsed
    }

    /// Total time accumulated since the last `start()`.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn mark(&self, active: bool) {
        if let Some(inner) = self.vsync.upgrade() {
            let mut inner = inner.lock().unwrap();
            if let Some(slot) = inner.tickers.get_mut(self.id) {
                *slot = active;
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // An activity that drops its ticker while still running was never
        // disposed; catch the leak here rather than spin the frame loop
        // forever.
        debug_assert!(!self.active, "ticker dropped while still running");
        if let Some(inner) = self.vsync.upgrade() {
            inner.lock().unwrap().tickers.remove(self.id);
        }
    }
}
