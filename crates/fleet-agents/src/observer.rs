//! The observer: ingest external signals, write events, surface triggers.

use std::sync::Arc;

use fleet_core::config::ObserverConfig;
use fleet_core::{LoadId, TripId, VehicleId};
use fleet_store::{Event, EventKind, FleetStore};

use crate::signals::{Signal, SignalSource};

// ── Triggers ──────────────────────────────────────────────────────────────────

/// Hints for the scheduler to run the matcher or adapter ahead of their
/// periodic deadlines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// A vehicle has sat idle past the configured threshold → matcher.
    IdleTimeout(VehicleId),
    /// An active trip is ≥ the near-delivery progress threshold → adapter.
    NearDelivery(TripId),
    /// A freshly posted load pays above the priority rate → matcher.
    HighPriorityLoad(LoadId),
    /// Traffic hit a vehicle in flight → adapter.
    TrafficAlert(VehicleId),
}

impl Trigger {
    /// Should the matcher run early because of this trigger?
    pub fn wants_matcher(&self) -> bool {
        matches!(self, Trigger::IdleTimeout(_) | Trigger::HighPriorityLoad(_))
    }

    /// Should the adapter run early because of this trigger?
    pub fn wants_adapter(&self) -> bool {
        matches!(self, Trigger::NearDelivery(_) | Trigger::TrafficAlert(_))
    }
}

/// What one observer cycle produced.
#[derive(Debug, Default)]
pub struct ObserverReport {
    /// Events written to the ring this cycle, as stamped.
    pub events: Vec<Arc<Event>>,
    pub triggers: Vec<Trigger>,
    /// Signal-source failure, swallowed so the cycle still returns.
    pub ingest_error: Option<String>,
    /// Loads inserted from `new_load_posted` signals.
    pub loads_posted: usize,
}

// ── ObserverAgent ─────────────────────────────────────────────────────────────

/// Periodically ingests external signals (traffic, new loads, vehicle
/// conditions), converts them to events and store writes, and scans the
/// world for trigger conditions.
pub struct ObserverAgent {
    source: Box<dyn SignalSource>,
    config: ObserverConfig,
}

impl ObserverAgent {
    pub fn new(source: Box<dyn SignalSource>, config: ObserverConfig) -> Self {
        Self { source, config }
    }

    /// One observe cycle.  Infallible: ingestion errors are swallowed
    /// into the report.
    pub fn cycle(&mut self, store: &FleetStore, now: f64) -> ObserverReport {
        let mut report = ObserverReport::default();
        let snapshot = store.snapshot(now);

        let signals = match self.source.poll(&snapshot, now) {
            Ok(signals) => signals,
            Err(e) => {
                tracing::warn!(error = %e, "signal ingestion failed, cycle continues");
                report.ingest_error = Some(e.to_string());
                vec![]
            }
        };

        let mut kinds = Vec::new();
        for signal in signals {
            match signal {
                Signal::Traffic { vehicle_id, delay_minutes, reason } => {
                    kinds.push(EventKind::TrafficAlert { vehicle_id, delay_minutes, reason });
                    report.triggers.push(Trigger::TrafficAlert(vehicle_id));
                }
                Signal::NewLoad(load) => {
                    let load_id = load.id;
                    let high_priority = load.rate_per_km >= self.config.high_priority_rate;
                    match store.insert_load(load) {
                        Ok(()) => {
                            kinds.push(EventKind::NewLoadPosted { load_id });
                            report.loads_posted += 1;
                            if high_priority {
                                report.triggers.push(Trigger::HighPriorityLoad(load_id));
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, %load_id, "posted load rejected");
                        }
                    }
                }
                Signal::FuelLow { vehicle_id, percent } => {
                    kinds.push(EventKind::FuelLow { vehicle_id, percent });
                }
                Signal::MaintenanceRequired { vehicle_id, reason } => {
                    kinds.push(EventKind::MaintenanceRequired { vehicle_id, reason });
                }
                Signal::DeliveryDelay { trip_id, delay_minutes, reason } => {
                    kinds.push(EventKind::DeliveryDelay { trip_id, delay_minutes, reason });
                }
            }
        }

        // Trigger scan runs against the pre-cycle snapshot: idle vehicles
        // and near-delivery trips are conditions, not edge events, so a
        // one-cycle-stale view is fine.
        for vehicle in snapshot.vehicles.values() {
            if vehicle.is_available()
                && vehicle.idle_minutes(now) >= self.config.idle_timeout_minutes
            {
                report.triggers.push(Trigger::IdleTimeout(vehicle.id));
            }
        }
        for trip in snapshot.active_trips() {
            if trip.progress_pct >= self.config.near_delivery_progress {
                report.triggers.push(Trigger::NearDelivery(trip.id));
            }
        }

        report.events = store.apply_events(now, kinds);
        report
    }
}
