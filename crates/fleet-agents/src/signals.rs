//! External signal ingestion for the observer.
//!
//! In production the source would wrap a telematics feed and a load
//! board; [`SimulatedSignals`] stands in for both, generating the same
//! categories of input from a seeded RNG so runs are reproducible.

use fleet_core::{FleetRng, LoadId, TripId, VehicleId};
use fleet_store::seed::make_load;
use fleet_store::{Load, Snapshot};
use thiserror::Error;

/// One raw input from the outside world, before it becomes an event.
#[derive(Clone, Debug)]
pub enum Signal {
    Traffic {
        vehicle_id: VehicleId,
        delay_minutes: f64,
        reason: String,
    },
    NewLoad(Load),
    FuelLow {
        vehicle_id: VehicleId,
        percent: f64,
    },
    MaintenanceRequired {
        vehicle_id: VehicleId,
        reason: String,
    },
    DeliveryDelay {
        trip_id: TripId,
        delay_minutes: f64,
        reason: String,
    },
}

#[derive(Debug, Error)]
#[error("signal ingestion failed: {0}")]
pub struct SignalError(pub String);

/// Where the observer gets its input.  A failing poll is swallowed by the
/// observer — the cycle still returns.
pub trait SignalSource: Send {
    fn poll(&mut self, snapshot: &Snapshot, now: f64) -> Result<Vec<Signal>, SignalError>;
}

// ── SimulatedSignals ──────────────────────────────────────────────────────────

const TRAFFIC_REASONS: &[&str] = &[
    "heavy traffic on highway",
    "road construction ahead",
    "accident blocking lane",
    "weather conditions slow",
];

const MAINTENANCE_REASONS: &[&str] = &["brake wear warning", "coolant temperature high"];

/// Stochastic generator: occasional traffic alerts on moving vehicles,
/// occasional freshly posted loads, and condition-derived fuel warnings.
pub struct SimulatedSignals {
    rng: FleetRng,
    next_load: u32,
}

impl SimulatedSignals {
    pub fn new(seed: u64, next_load_id: u32) -> Self {
        Self {
            rng: FleetRng::new(seed),
            next_load: next_load_id,
        }
    }
}

impl SignalSource for SimulatedSignals {
    fn poll(&mut self, snapshot: &Snapshot, now: f64) -> Result<Vec<Signal>, SignalError> {
        let mut signals = Vec::new();

        // Traffic hits a random moving vehicle ~30% of cycles.
        let moving: Vec<VehicleId> = snapshot
            .vehicles
            .values()
            .filter(|v| v.status.on_trip())
            .map(|v| v.id)
            .collect();
        if !moving.is_empty() && self.rng.gen_bool(0.3) {
            let vehicle_id = *self.rng.choose(&moving).expect("non-empty");
            let reason = *self.rng.choose(TRAFFIC_REASONS).expect("non-empty");
            signals.push(Signal::Traffic {
                vehicle_id,
                delay_minutes: self.rng.gen_range(15.0..90.0),
                reason: reason.to_owned(),
            });
        }

        // A shipper posts a new load ~15% of cycles.
        if self.rng.gen_bool(0.15) {
            let id = LoadId(self.next_load);
            self.next_load += 1;
            signals.push(Signal::NewLoad(make_load(id, &mut self.rng, now)));
        }

        // Fuel warnings are condition-derived, not random.
        for v in snapshot.vehicles.values() {
            if v.status.on_trip() && v.fuel_level_percent < 20.0 {
                signals.push(Signal::FuelLow {
                    vehicle_id: v.id,
                    percent: v.fuel_level_percent,
                });
            }
        }

        // Rare maintenance flag on a random vehicle.
        if self.rng.gen_bool(0.05) {
            let all: Vec<VehicleId> = snapshot.vehicles.keys().copied().collect();
            if let Some(&vehicle_id) = self.rng.choose(&all) {
                let reason = *self.rng.choose(MAINTENANCE_REASONS).expect("non-empty");
                signals.push(Signal::MaintenanceRequired {
                    vehicle_id,
                    reason: reason.to_owned(),
                });
            }
        }

        Ok(signals)
    }
}

/// A source that never produces anything.  Keeps tests deterministic.
pub struct NoSignals;

impl SignalSource for NoSignals {
    fn poll(&mut self, _snapshot: &Snapshot, _now: f64) -> Result<Vec<Signal>, SignalError> {
        Ok(vec![])
    }
}
