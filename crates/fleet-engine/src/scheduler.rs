//! The dispatch loop: four independent cadences, one cancellation signal.
//!
//! Within one wall-clock interval tasks run in a fixed order — Observer,
//! Matcher, Motion, Adapter — so freshly posted loads can be matched in
//! the same interval and adaptations see post-motion state.  Observer
//! triggers pull the matcher or adapter forward to the current interval.
//!
//! Back-pressure is coalescing, never queueing: a task that overruns its
//! period simply runs at the next opportunity; missed firings are
//! dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use fleet_advisor::Advisor;
use fleet_route::RouteSource;

use crate::engine::Engine;

/// Longest uninterruptible sleep; bounds cancellation latency.
const MAX_SLEEP: Duration = Duration::from_millis(200);

// ── Stats & handle ────────────────────────────────────────────────────────────

/// Counters accumulated over one `run`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub observer_cycles: u64,
    pub matcher_runs: u64,
    pub motion_ticks: u64,
    pub adapter_runs: u64,
    pub trips_completed: u64,
    /// Matcher/adapter runs pulled forward by triggers.
    pub early_runs: u64,
}

/// Cancellation handle for a loop running on its own thread.
pub struct LoopHandle {
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<LoopStats>,
}

impl LoopHandle {
    /// Signal cancellation: no new work starts; in-flight external calls
    /// run out their own deadlines.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Cancel and wait for the loop to finish, returning its counters.
    pub fn join(self) -> LoopStats {
        self.cancel();
        self.thread.join().unwrap_or_default()
    }
}

// ── DispatchLoop ──────────────────────────────────────────────────────────────

pub struct DispatchLoop<S: RouteSource, A: Advisor> {
    engine: Arc<Engine<S, A>>,
    cancel: Arc<AtomicBool>,
}

impl<S, A> DispatchLoop<S, A>
where
    S: RouteSource + 'static,
    A: Advisor + 'static,
{
    pub fn new(engine: Arc<Engine<S, A>>) -> Self {
        Self {
            engine,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A cancellation flag shared with [`run`](Self::run); flip it from
    /// anywhere to stop the loop.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run until cancelled, blocking the current thread.
    pub fn run(&self) -> LoopStats {
        let config = &self.engine.config().ticks;
        let motion_period = Duration::from_secs_f64(config.motion_secs.max(0.01));
        let observer_period = Duration::from_secs_f64(config.observer_secs.max(0.01));
        let matcher_period = Duration::from_secs_f64(config.matcher_secs.max(0.01));
        let adapter_period = Duration::from_secs_f64(config.adapter_secs.max(0.01));

        let start = Instant::now();
        let mut observer_due = start;
        let mut matcher_due = start;
        let mut motion_due = start;
        let mut adapter_due = start;

        let mut stats = LoopStats::default();

        while !self.cancelled() {
            let now = Instant::now();

            // ── Observer ──────────────────────────────────────────────────
            if now >= observer_due {
                let report = self.engine.observer_cycle();
                stats.observer_cycles += 1;
                observer_due = now + observer_period;

                // Triggers pull the other agents into this interval.
                let mut early_matcher = false;
                let mut early_adapter = false;
                for trigger in &report.triggers {
                    early_matcher |= trigger.wants_matcher();
                    early_adapter |= trigger.wants_adapter();
                }
                if early_matcher && matcher_due > now {
                    matcher_due = now;
                    stats.early_runs += 1;
                }
                if early_adapter && adapter_due > now {
                    adapter_due = now;
                    stats.early_runs += 1;
                }
            }
            if self.cancelled() {
                break;
            }

            // ── Matcher (before motion, so new loads dispatch promptly) ───
            if Instant::now() >= matcher_due {
                let report = self.engine.matcher_run();
                tracing::debug!(
                    created = report.matches_created(),
                    fallback = report.used_fallback,
                    "matcher run"
                );
                stats.matcher_runs += 1;
                matcher_due = Instant::now() + matcher_period;
            }
            if self.cancelled() {
                break;
            }

            // ── Motion ────────────────────────────────────────────────────
            if Instant::now() >= motion_due {
                let report = self.engine.motion_tick(motion_period.as_secs_f64());
                stats.motion_ticks += 1;
                stats.trips_completed += report.completed.len() as u64;
                // Coalesce: overruns drop ticks instead of queueing them.
                motion_due = Instant::now() + motion_period;
            }
            if self.cancelled() {
                break;
            }

            // ── Adapter (after motion: decide against post-motion state) ──
            if Instant::now() >= adapter_due {
                let decisions = self.engine.adapter_run();
                tracing::debug!(trips = decisions.len(), "adapter run");
                stats.adapter_runs += 1;
                adapter_due = Instant::now() + adapter_period;
            }

            // ── Sleep until the earliest deadline ─────────────────────────
            let next_due = observer_due
                .min(matcher_due)
                .min(motion_due)
                .min(adapter_due);
            let pause = next_due
                .saturating_duration_since(Instant::now())
                .min(MAX_SLEEP);
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
        }

        tracing::info!(?stats, "dispatch loop stopped");
        stats
    }

    /// Run on a dedicated thread; the returned handle cancels and joins.
    pub fn spawn(self) -> LoopHandle
    where
        S: Send + Sync,
        A: Send + Sync,
    {
        let cancel = Arc::clone(&self.cancel);
        let thread = std::thread::spawn(move || self.run());
        LoopHandle { cancel, thread }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}
