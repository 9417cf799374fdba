//! The time seam.
//!
//! All timestamps in this system are UTC epoch seconds as `f64`, matching
//! the wire format of the command surface.  Components never call
//! `SystemTime::now` directly — they take a [`Clock`] so tests and the
//! demo can drive simulated time deterministically.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in epoch seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

// ── SystemClock ───────────────────────────────────────────────────────────────

/// Wall-clock time from the operating system.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

// ── ManualClock ───────────────────────────────────────────────────────────────

/// A clock that only moves when told to.  Used by tests and offline
/// simulation runs.
pub struct ManualClock {
    secs: Mutex<f64>,
}

impl ManualClock {
    pub fn new(start_secs: f64) -> Self {
        Self { secs: Mutex::new(start_secs) }
    }

    /// Advance by `dt_secs` (may be fractional; negative values are ignored).
    pub fn advance(&self, dt_secs: f64) {
        if dt_secs > 0.0 {
            *self.secs.lock().expect("clock poisoned") += dt_secs;
        }
    }

    pub fn set(&self, secs: f64) {
        *self.secs.lock().expect("clock poisoned") = secs;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.secs.lock().expect("clock poisoned")
    }
}
