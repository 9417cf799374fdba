//! The command surface consumed by the REST boundary.
//!
//! Each command returns a structured, serializable result with an
//! explicit `message` field.  HTTP mechanics (routing, status codes,
//! auth) belong to the external boundary; `NotFound`/`Conflict` errors
//! surface as `FleetError` for it to map.

use std::sync::Arc;

use fleet_advisor::Advisor;
use fleet_agents::{predict, Trigger, TripDecision, TripPrediction};
use fleet_core::{FleetResult, LoadId, VehicleId};
use fleet_route::RouteSource;
use fleet_store::seed::{seed_loads, seed_vehicles};
use fleet_store::{Event, EventKind, Load, LoadStatus, Snapshot, Vehicle, VehicleStatus};
use serde::Serialize;

use crate::engine::Engine;
use crate::metrics::{self, KpiSummary};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct InitializeResponse {
    pub message: String,
    pub num_vehicles: usize,
    pub num_loads: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct CycleResponse {
    pub message: String,
    pub snapshot_at: f64,
    pub events_ingested: usize,
    pub loads_posted: usize,
    pub triggers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest_error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ApprovedMatch {
    pub vehicle_id: VehicleId,
    pub load_id: LoadId,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchLoadsResponse {
    pub message: String,
    pub opportunities_analyzed: usize,
    pub matches_created: usize,
    pub approved_matches: Vec<ApprovedMatch>,
    pub advisor_reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ManageRoutesResponse {
    pub message: String,
    pub routes_managed: usize,
    pub decisions: Vec<TripDecision>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimulateMovementResponse {
    pub message: String,
    pub trips_advanced: usize,
    pub trips_completed: usize,
    pub predictions: Vec<TripPrediction>,
    pub timestamp: f64,
}

// ── Command implementations ───────────────────────────────────────────────────

impl<S: RouteSource, A: Advisor> Engine<S, A> {
    /// Seed the world: `num_vehicles` trucks and `num_loads` posted loads
    /// scattered over the city table, plus one `load_posted` event per
    /// load.
    pub fn initialize(
        &self,
        num_vehicles: usize,
        num_loads: usize,
    ) -> FleetResult<InitializeResponse> {
        let now = self.now();
        let mut rng = self.seeding_rng();

        for vehicle in seed_vehicles(num_vehicles, &mut rng, now) {
            self.store.insert_vehicle(vehicle)?;
        }
        let loads = seed_loads(num_loads, &mut rng, now);
        let events = loads
            .iter()
            .map(|l| EventKind::LoadPosted {
                load_id: l.id,
                origin: l.origin.clone(),
                destination: l.destination.clone(),
                weight_tons: l.weight_tons,
                rate_per_km: l.rate_per_km,
            })
            .collect();
        for load in loads {
            self.store.insert_load(load)?;
        }
        self.store.apply_events(now, events);

        Ok(InitializeResponse {
            message: "fleet initialized".to_owned(),
            num_vehicles,
            num_loads,
        })
    }

    /// Full point-in-time snapshot.
    pub fn state(&self) -> Snapshot {
        self.store.snapshot(self.now())
    }

    /// The KPI object.
    pub fn metrics(&self) -> KpiSummary {
        metrics::kpis(&self.state(), self.now())
    }

    /// Wider dashboard (KPIs + trip economics).
    pub fn dashboard(&self) -> metrics::FleetDashboard {
        metrics::dashboard(&self.state(), self.now())
    }

    /// Vehicles, optionally filtered by status.
    pub fn vehicles(&self, status: Option<VehicleStatus>) -> Vec<Arc<Vehicle>> {
        self.state()
            .vehicles
            .values()
            .filter(|v| status.map_or(true, |s| v.status == s))
            .cloned()
            .collect()
    }

    /// Loads, optionally filtered by status.
    pub fn loads(&self, status: Option<LoadStatus>) -> Vec<Arc<Load>> {
        self.state()
            .loads
            .values()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .cloned()
            .collect()
    }

    /// Recent events, newest first, optionally filtered by wire type name.
    pub fn events(&self, limit: usize, event_type: Option<&str>) -> Vec<Arc<Event>> {
        self.state()
            .recent_events
            .iter()
            .rev()
            .filter(|e| event_type.map_or(true, |t| e.kind.type_name() == t))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Run the observer once.
    pub fn cycle(&self) -> (CycleResponse, Vec<Trigger>) {
        let report = self.observer_cycle();
        let response = CycleResponse {
            message: "observer cycle completed".to_owned(),
            snapshot_at: self.now(),
            events_ingested: report.events.len(),
            loads_posted: report.loads_posted,
            triggers: report.triggers.len(),
            ingest_error: report.ingest_error.clone(),
        };
        (response, report.triggers)
    }

    /// Run the matcher once.
    pub fn match_loads(&self) -> MatchLoadsResponse {
        let report = self.matcher_run();
        MatchLoadsResponse {
            message: if report.used_fallback {
                "matching completed (rule-based fallback)".to_owned()
            } else {
                "matching completed".to_owned()
            },
            opportunities_analyzed: report.opportunities_analyzed,
            matches_created: report.matches_created(),
            approved_matches: report
                .approved
                .iter()
                .map(|&(vehicle_id, load_id)| ApprovedMatch { vehicle_id, load_id })
                .collect(),
            advisor_reasoning: report.reasoning,
        }
    }

    /// Run the adapter once.
    pub fn manage_routes(&self) -> ManageRoutesResponse {
        let decisions = self.adapter_run();
        ManageRoutesResponse {
            message: if decisions.is_empty() {
                "no trips currently in flight".to_owned()
            } else {
                "route management completed".to_owned()
            },
            routes_managed: decisions.len(),
            decisions,
        }
    }

    /// Run the motion engine for one tick and return the predictor's
    /// readout of the post-tick state.
    pub fn simulate_movement(&self) -> SimulateMovementResponse {
        let report = self.motion_tick(self.config.ticks.motion_secs);
        let now = self.now();
        let snapshot = self.store.snapshot(now);
        let predictions = predict(&snapshot, &self.config.motion, &self.config.predictor, now);

        SimulateMovementResponse {
            message: "movement simulated".to_owned(),
            trips_advanced: report.trips_processed,
            trips_completed: report.completed.len(),
            predictions,
            timestamp: now,
        }
    }
}
