//! The `Engine` composite and its builder.

use std::sync::{Arc, Mutex};

use fleet_advisor::Advisor;
use fleet_agents::{
    AdapterAgent, MatcherAgent, ObserverAgent, ObserverReport, SignalSource, SimulatedSignals,
};
use fleet_core::{Clock, EngineConfig, FleetRng, SystemClock};
use fleet_motion::{MotionEngine, MotionReport};
use fleet_route::{RouteCache, RouteSource};
use fleet_store::FleetStore;

/// Observer-posted loads start here so they never collide with the ids
/// handed out by `initialize`.
const SIMULATED_LOAD_ID_BASE: u32 = 1_001;

// ── Engine ────────────────────────────────────────────────────────────────────

/// The assembled dispatch engine: store, caches, external clients, and
/// the four workers, behind one owner.
///
/// Cheap to share (`Arc<Engine<_, _>>`); every method takes `&self`.  The
/// store serializes writes internally, and the scheduler keeps the
/// matcher and adapter off each other's ticks.
pub struct Engine<S: RouteSource, A: Advisor> {
    pub(crate) config: EngineConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) store: Arc<FleetStore>,
    pub(crate) routes: Arc<RouteCache<S>>,
    pub(crate) motion: MotionEngine,
    /// The observer owns a `&mut` signal source; serialized here so the
    /// engine itself can be shared.
    pub(crate) observer: Mutex<ObserverAgent>,
    pub(crate) matcher: MatcherAgent<A>,
    pub(crate) adapter: AdapterAgent<A>,
    pub(crate) seed: u64,
}

impl<S: RouteSource, A: Advisor> Engine<S, A> {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<FleetStore> {
        &self.store
    }

    pub fn routes(&self) -> &Arc<RouteCache<S>> {
        &self.routes
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Fresh deterministic RNG for the seeding step.
    pub(crate) fn seeding_rng(&self) -> FleetRng {
        FleetRng::new(self.seed)
    }

    // ── Worker entry points (used by commands and the scheduler) ──────────

    pub fn observer_cycle(&self) -> ObserverReport {
        let now = self.now();
        self.observer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .cycle(&self.store, now)
    }

    pub fn matcher_run(&self) -> fleet_agents::MatchReport {
        self.matcher.run(&self.store, &self.routes, self.now())
    }

    pub fn motion_tick(&self, dt_secs: f64) -> MotionReport {
        self.motion.tick(&self.store, &self.routes, self.now(), dt_secs)
    }

    pub fn adapter_run(&self) -> Vec<fleet_agents::TripDecision> {
        self.adapter.run(&self.store, self.now())
    }
}

// ── EngineBuilder ─────────────────────────────────────────────────────────────

/// Builder for [`Engine`].
///
/// Required inputs are the configuration, the route source, and the
/// advisor; clock, signal source, and seed have sensible defaults:
///
/// | Method        | Default                                  |
/// |---------------|------------------------------------------|
/// | `.clock(c)`   | [`SystemClock`]                          |
/// | `.signals(s)` | [`SimulatedSignals`] from the seed       |
/// | `.seed(n)`    | 42                                       |
pub struct EngineBuilder<S: RouteSource, A: Advisor> {
    config: EngineConfig,
    route_source: S,
    advisor: A,
    clock: Option<Arc<dyn Clock>>,
    signals: Option<Box<dyn SignalSource>>,
    seed: u64,
}

impl<S: RouteSource, A: Advisor> EngineBuilder<S, A> {
    pub fn new(config: EngineConfig, route_source: S, advisor: A) -> Self {
        Self {
            config,
            route_source,
            advisor,
            clock: None,
            signals: None,
            seed: 42,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn signals(mut self, signals: Box<dyn SignalSource>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Engine<S, A> {
        let advisor = Arc::new(self.advisor);
        let signals = self
            .signals
            .unwrap_or_else(|| Box::new(SimulatedSignals::new(self.seed, SIMULATED_LOAD_ID_BASE)));

        Engine {
            store: Arc::new(FleetStore::new(self.config.events.ring_size)),
            routes: Arc::new(RouteCache::new(self.route_source, &self.config.route)),
            motion: MotionEngine::new(&self.config),
            observer: Mutex::new(ObserverAgent::new(signals, self.config.observer.clone())),
            matcher: MatcherAgent::new(Arc::clone(&advisor), self.config.matcher.clone()),
            adapter: AdapterAgent::new(
                advisor,
                self.config.adapter.clone(),
                self.config.matcher.clone(),
            ),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            seed: self.seed,
            config: self.config,
        }
    }
}
