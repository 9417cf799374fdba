//! The motion tick.

use std::sync::Arc;

use fleet_core::config::{EngineConfig, MatcherConfig, MotionConfig};
use fleet_core::{GeoPoint, Location, TripId};
use fleet_route::{RouteCache, RouteSource};
use fleet_store::{
    EventKind, FleetStore, Load, LoadStatus, Snapshot, Trip, TripPhase, Vehicle, VehicleStatus,
};

/// Hours-of-service restored by a (simulated, instantaneous) rest break.
const REST_RESET_HOURS: f64 = 10.0;

/// A pickup leg shorter than this counts as "already at the origin".
const ZERO_LEG_KM: f64 = 0.01;

// ── Report ────────────────────────────────────────────────────────────────────

/// What one motion tick did.
#[derive(Debug, Default)]
pub struct MotionReport {
    /// Trips that were advanced (or held) this tick.
    pub trips_processed: usize,
    /// Trips that reached `completed` and were removed.
    pub completed: Vec<TripId>,
    /// Follow-up trips instantiated at completion.
    pub followups_started: Vec<TripId>,
    /// Trips held in place because the driver ran out of hours.
    pub rest_holds: usize,
    /// Set when an internal consistency check failed and the tick was
    /// abandoned part-way.  The scheduler keeps running.
    pub aborted: Option<String>,
}

// ── MotionEngine ──────────────────────────────────────────────────────────────

/// Advances every active trip once per invocation.
///
/// Trips are processed in ascending trip-id order, so a tick is
/// deterministic for a given store state.  All events emitted in one tick
/// share the tick timestamp and are totally ordered by their store
/// sequence numbers.
pub struct MotionEngine {
    motion: MotionConfig,
    /// Cost coefficients for pricing follow-up trips at completion.
    economics: MatcherConfig,
}

impl MotionEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            motion: config.motion.clone(),
            economics: config.matcher.clone(),
        }
    }

    /// Advance all active trips by `dt_secs` of simulated driving.
    ///
    /// `dt_secs == 0` is an exact no-op: no progress, no odometer or fuel
    /// change, no phase transition.
    pub fn tick<S: RouteSource>(
        &self,
        store: &FleetStore,
        routes: &RouteCache<S>,
        now: f64,
        dt_secs: f64,
    ) -> MotionReport {
        let mut report = MotionReport::default();
        if dt_secs <= 0.0 {
            return report;
        }

        let snap = store.snapshot(now);
        let active: Vec<&Arc<Trip>> = snap.active_trips();

        for trip in active {
            match self.step_trip(store, routes, trip, &snap, now, dt_secs, &mut report) {
                Ok(()) => report.trips_processed += 1,
                Err(msg) => {
                    tracing::error!(trip = %trip.id, %msg, "invariant violation, aborting tick");
                    report.aborted = Some(msg);
                    break;
                }
            }
        }
        report
    }

    // ── Per-trip step ─────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn step_trip<S: RouteSource>(
        &self,
        store: &FleetStore,
        routes: &RouteCache<S>,
        trip: &Trip,
        snap: &Snapshot,
        now: f64,
        dt_secs: f64,
        report: &mut MotionReport,
    ) -> Result<(), String> {
        let vehicle = snap
            .vehicle(trip.vehicle_id)
            .ok_or_else(|| format!("{} references missing {}", trip.id, trip.vehicle_id))?;
        let load = snap
            .load(trip.load_id)
            .ok_or_else(|| format!("{} references missing {}", trip.id, trip.load_id))?;

        let _ = store.update_trip(trip.id, |t| t.ticks += 1);
        let tick_no = trip.ticks + 1;

        match trip.phase {
            TripPhase::Planning => {
                match self.step_planning(store, routes, trip, vehicle, load, now)? {
                    // Departed straight into a driving phase: spend the
                    // rest of this tick actually driving.
                    Some(phase) => self.step_driving(
                        store, routes, trip, phase, vehicle, load, now, dt_secs, tick_no, report,
                    ),
                    None => Ok(()),
                }
            }
            TripPhase::Loading => self.finish_loading(store, trip, load, now),
            TripPhase::Unloading => self.finish_unloading(store, trip, load, now, report),
            phase @ (TripPhase::EnRouteToPickup | TripPhase::InTransit) => self.step_driving(
                store, routes, trip, phase, vehicle, load, now, dt_secs, tick_no, report,
            ),
            TripPhase::Completed | TripPhase::Cancelled => Ok(()),
        }
    }

    /// Obtain a route if missing (the cache cannot fail) and hold; with a
    /// route in hand, enter the first driving phase.  Returns the fresh
    /// phase when the tick should continue with actual driving.
    fn step_planning<S: RouteSource>(
        &self,
        store: &FleetStore,
        routes: &RouteCache<S>,
        trip: &Trip,
        vehicle: &Vehicle,
        load: &Load,
        now: f64,
    ) -> Result<Option<TripPhase>, String> {
        if trip.route.is_none() {
            let origin = load.origin.point();
            let destination = load.destination.point();
            let start = vehicle.current_location.point();

            let loaded_leg = routes.route(origin, destination);
            let (path, pickup_km) = if start.distance_km(origin) < ZERO_LEG_KM {
                ((*loaded_leg).clone(), 0.0)
            } else {
                let pickup_leg = routes.route(start, origin);
                let pickup_km = pickup_leg.total_km;
                ((*pickup_leg).clone().then((*loaded_leg).clone()), pickup_km)
            };
            let loaded_km = loaded_leg.total_km;

            let path = Arc::new(path);
            store
                .update_trip(trip.id, |t| {
                    t.route = Some(Arc::clone(&path));
                    t.pickup_leg_km = pickup_km;
                    t.loaded_leg_km = loaded_km;
                })
                .map_err(|e| e.to_string())?;
            // The trip stays in planning for this tick; driving starts on
            // the next pass.
            return Ok(None);
        }

        // Route in hand: enter the first driving phase.
        let (next_phase, vehicle_status) = if trip.pickup_leg_km < ZERO_LEG_KM {
            (TripPhase::Loading, VehicleStatus::AtPickup)
        } else {
            (TripPhase::EnRouteToPickup, VehicleStatus::EnRouteEmpty)
        };
        store
            .update_trip(trip.id, |t| t.phase = next_phase)
            .map_err(|e| e.to_string())?;
        store
            .update_vehicle(trip.vehicle_id, |v| {
                v.status = vehicle_status;
                v.last_activity_at = now;
            })
            .map_err(|e| e.to_string())?;
        self.emit_position(store, trip, vehicle.current_location.point(), now);

        Ok((next_phase == TripPhase::EnRouteToPickup).then_some(next_phase))
    }

    /// One tick of actual driving, plus threshold crossings.
    #[allow(clippy::too_many_arguments)]
    fn step_driving<S: RouteSource>(
        &self,
        store: &FleetStore,
        routes: &RouteCache<S>,
        trip: &Trip,
        phase: TripPhase,
        vehicle: &Vehicle,
        load: &Load,
        now: f64,
        dt_secs: f64,
        tick_no: u64,
        report: &mut MotionReport,
    ) -> Result<(), String> {
        // Exhausted driver: hold in place, surface the condition, and let
        // the (instantaneous) rest restore hours for the next pass.
        if vehicle.hours_remaining <= 0.0 {
            report.rest_holds += 1;
            store.apply_events(
                now,
                vec![EventKind::DriverRestRequired { vehicle_id: vehicle.id }],
            );
            store
                .update_vehicle(vehicle.id, |v| v.hours_remaining = REST_RESET_HOURS)
                .map_err(|e| e.to_string())?;
            return Ok(());
        }

        let route = match &trip.route {
            Some(r) => Arc::clone(r),
            // The adapter invalidated the route.  Fetch a fresh polyline
            // for the remaining journey and rebase sampling onto it; the
            // trip holds position for this tick, like the planning hold.
            None => {
                self.refetch_remaining(store, routes, trip, vehicle, load)?;
                return Ok(());
            }
        };

        // The current polyline spans trip progress [base, 100].
        let base = trip.route_base_pct.clamp(0.0, 100.0);
        let span_pct = (100.0 - base).max(f64::EPSILON);
        let route_km = route.total_km.max(f64::EPSILON);

        let max_step_pct = self.motion.speed_kmh * dt_secs / 3600.0 / route_km * span_pct;
        let delta_pct = (100.0 - trip.progress_pct).min(max_step_pct).max(0.0);
        let new_pct = trip.progress_pct + delta_pct;
        let km_covered = delta_pct / span_pct * route_km;

        let loaded = phase == TripPhase::InTransit;
        let fuel_rate_per_km = if loaded {
            self.motion.fuel_pct_per_10km_loaded / 10.0
        } else {
            self.motion.fuel_pct_per_10km_empty / 10.0
        };
        let fuel_used = km_covered * fuel_rate_per_km;
        let hours_used = dt_secs / 3600.0;

        let on_route_pct = (new_pct - base) / span_pct * 100.0;
        let position = route
            .point_at_pct(on_route_pct)
            .unwrap_or_else(|| vehicle.current_location.point());

        store
            .update_trip(trip.id, |t| t.progress_pct = new_pct)
            .map_err(|e| e.to_string())?;
        store
            .update_vehicle(vehicle.id, |v| {
                v.current_location = Location::new(position.lat, position.lng);
                v.total_km_today += km_covered;
                if loaded {
                    v.loaded_km_today += km_covered;
                }
                v.fuel_level_percent = (v.fuel_level_percent - fuel_used).max(0.0);
                v.hours_remaining = (v.hours_remaining - hours_used).max(0.0);
                v.last_activity_at = now;
            })
            .map_err(|e| e.to_string())?;

        // Threshold crossings.  The pickup sits `pickup_leg_km` into the
        // current polyline, expressed in trip progress terms.
        let pickup_boundary = base + trip.pickup_leg_km / route_km * span_pct;
        if phase == TripPhase::EnRouteToPickup && new_pct >= pickup_boundary {
            // Snap to the pickup location for the held tick.
            let origin = load.origin.clone();
            store
                .update_trip(trip.id, |t| t.phase = TripPhase::Loading)
                .map_err(|e| e.to_string())?;
            store
                .update_vehicle(vehicle.id, |v| {
                    v.status = VehicleStatus::AtPickup;
                    v.current_location = origin;
                })
                .map_err(|e| e.to_string())?;
            self.emit_position(store, trip, load.origin.point(), now);
            return Ok(());
        }
        if phase == TripPhase::InTransit && new_pct >= 100.0 {
            let destination = load.destination.clone();
            store
                .update_trip(trip.id, |t| t.phase = TripPhase::Unloading)
                .map_err(|e| e.to_string())?;
            store
                .update_vehicle(vehicle.id, |v| {
                    v.status = VehicleStatus::AtDelivery;
                    v.current_location = destination;
                })
                .map_err(|e| e.to_string())?;
            self.emit_position(store, trip, load.destination.point(), now);
            return Ok(());
        }

        // Decimated position reporting between boundaries.
        if self.motion.position_event_every > 0 && tick_no % self.motion.position_event_every == 0 {
            self.emit_position(store, trip, position, now);
        }
        Ok(())
    }

    /// Replace an invalidated polyline with one covering the remaining
    /// journey, rebasing progress sampling onto it.
    fn refetch_remaining<S: RouteSource>(
        &self,
        store: &FleetStore,
        routes: &RouteCache<S>,
        trip: &Trip,
        vehicle: &Vehicle,
        load: &Load,
    ) -> Result<(), String> {
        let current = vehicle.current_location.point();
        let origin = load.origin.point();
        let destination = load.destination.point();

        // Planned leg distances stay as the economics were priced; only the
        // pickup portion of the *current* polyline matters for the phase
        // boundary, and past the pickup there is none.
        let (path, pickup_km) = if trip.phase == TripPhase::EnRouteToPickup {
            let pickup_leg = routes.route(current, origin);
            let loaded_leg = routes.route(origin, destination);
            let pickup_km = pickup_leg.total_km;
            ((*pickup_leg).clone().then((*loaded_leg).clone()), pickup_km)
        } else {
            ((*routes.route(current, destination)).clone(), 0.0)
        };

        let path = Arc::new(path);
        let base = trip.progress_pct;
        store
            .update_trip(trip.id, |t| {
                t.route = Some(Arc::clone(&path));
                t.route_base_pct = base;
                t.pickup_leg_km = pickup_km;
            })
            .map_err(|e| e.to_string())
    }

    /// One-tick hold at the pickup: cargo goes on board.
    fn finish_loading(
        &self,
        store: &FleetStore,
        trip: &Trip,
        load: &Load,
        now: f64,
    ) -> Result<(), String> {
        store
            .transition_load(trip.load_id, LoadStatus::InTransit)
            .map_err(|e| e.to_string())?;
        let weight = load.weight_tons;
        store
            .update_trip(trip.id, |t| t.phase = TripPhase::InTransit)
            .map_err(|e| e.to_string())?;
        store
            .update_vehicle(trip.vehicle_id, |v| {
                v.status = VehicleStatus::EnRouteLoaded;
                v.current_load_tons = weight;
                v.last_activity_at = now;
            })
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// One-tick hold at the delivery: cargo comes off, the trip ends, and
    /// an annotated follow-up (if any) begins.
    fn finish_unloading(
        &self,
        store: &FleetStore,
        trip: &Trip,
        load: &Load,
        now: f64,
        report: &mut MotionReport,
    ) -> Result<(), String> {
        store
            .transition_load(trip.load_id, LoadStatus::Delivered)
            .map_err(|e| e.to_string())?;
        store
            .update_vehicle(trip.vehicle_id, |v| {
                v.status = VehicleStatus::Idle;
                v.current_load_tons = 0.0;
                v.current_location = load.destination.clone();
                v.last_activity_at = now;
            })
            .map_err(|e| e.to_string())?;
        store
            .update_trip(trip.id, |t| {
                t.phase = TripPhase::Completed;
                t.completed_at = Some(now);
            })
            .map_err(|e| e.to_string())?;
        store.apply_events(now, vec![EventKind::TripCompleted { trip_id: trip.id }]);
        store.remove_trip(trip.id).map_err(|e| e.to_string())?;
        report.completed.push(trip.id);

        if let Some(followup_id) = trip.followup_load_id {
            self.start_followup(store, trip, followup_id, now, report);
        }
        Ok(())
    }

    /// Roll the vehicle straight into the follow-up load it was promised.
    fn start_followup(
        &self,
        store: &FleetStore,
        finished: &Trip,
        followup_id: fleet_core::LoadId,
        now: f64,
        report: &mut MotionReport,
    ) {
        let snap = store.snapshot(now);
        let (vehicle, load) = match (snap.vehicle(finished.vehicle_id), snap.load(followup_id)) {
            (Some(v), Some(l)) => (v, l),
            _ => {
                tracing::warn!(trip = %finished.id, load = %followup_id, "follow-up load vanished");
                return;
            }
        };
        if load.status != LoadStatus::Available || load.is_expired(now) {
            tracing::warn!(load = %followup_id, status = ?load.status, "follow-up no longer available");
            return;
        }

        let pickup_km = vehicle.current_location.distance_km(&load.origin);
        let loaded_km = load.distance_km;
        let total_km = pickup_km + loaded_km;
        let revenue = load.total_revenue();
        let hours = total_km / self.economics.assumed_speed_kmh;
        let cost = total_km * self.economics.cost_per_km + hours * self.economics.driver_cost_per_hour;

        let next = Trip {
            id: store.allocate_trip_id(),
            vehicle_id: finished.vehicle_id,
            load_id: followup_id,
            phase: TripPhase::Planning,
            route: None,
            progress_pct: 0.0,
            route_base_pct: 0.0,
            pickup_leg_km: pickup_km,
            loaded_leg_km: loaded_km,
            estimated_revenue: revenue,
            estimated_cost: cost,
            estimated_profit: revenue - cost,
            delay_minutes: 0.0,
            followup_load_id: None,
            ticks: 0,
            started_at: now,
            completed_at: None,
        };
        let next_id = next.id;

        match store.commit_match(next, now) {
            Ok(_) => report.followups_started.push(next_id),
            Err(e) => {
                tracing::warn!(error = %e, load = %followup_id, "follow-up commit failed");
            }
        }
    }

    fn emit_position(&self, store: &FleetStore, trip: &Trip, at: GeoPoint, now: f64) {
        store.apply_events(
            now,
            vec![EventKind::VehiclePositionUpdate {
                vehicle_id: trip.vehicle_id,
                lat: at.lat,
                lng: at.lng,
            }],
        );
    }
}
