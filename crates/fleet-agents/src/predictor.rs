//! The predictive readout: per-trip ETA, fuel-at-arrival, and on-time
//! status, derived from a snapshot.  Pure — no state, no store writes.

use fleet_core::config::{MotionConfig, PredictorConfig};
use fleet_core::{LoadId, TripId, VehicleId};
use fleet_store::{EventKind, Snapshot};
use serde::Serialize;

// ── Output types ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnTimeStatus {
    OnTime,
    Delayed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Fuel at arrival projected below the threshold.  High priority.
    Refuel,
    /// Driver hours will run out before the ETA.  High priority.
    Rest,
    /// The delivery deadline will be missed; tell the customer.
    DelayNotification,
    OnTrack,
}

/// Forward-looking readout for one active trip.
#[derive(Clone, Debug, Serialize)]
pub struct TripPrediction {
    pub trip_id: TripId,
    pub vehicle_id: VehicleId,
    pub load_id: LoadId,
    pub progress_pct: f64,
    pub remaining_km: f64,
    pub current_speed_kmh: f64,
    pub eta_secs: f64,
    /// Epoch seconds of projected arrival.
    pub eta_at: f64,
    pub fuel_at_arrival_pct: f64,
    pub on_time: OnTimeStatus,
    /// Advisories in priority order.
    pub recommendations: Vec<Recommendation>,
}

// ── Predict ───────────────────────────────────────────────────────────────────

/// Derive predictions for every active trip in `snapshot`.
pub fn predict(
    snapshot: &Snapshot,
    motion: &MotionConfig,
    config: &PredictorConfig,
    now: f64,
) -> Vec<TripPrediction> {
    snapshot
        .active_trips()
        .into_iter()
        .filter_map(|trip| {
            let vehicle = snapshot.vehicle(trip.vehicle_id)?;
            let load = snapshot.load(trip.load_id)?;

            let total_km = trip.total_route_km();
            let covered_km = trip.progress_pct / 100.0 * total_km;
            let remaining_km = (total_km - covered_km).max(0.0);

            // Effective speed: the cruising speed degraded by the latest
            // traffic alert for this vehicle (a 60-minute delay halves it).
            let alert_minutes = latest_traffic_delay(snapshot, trip.vehicle_id);
            let traffic_factor = 60.0 / (60.0 + alert_minutes);
            let speed_kmh = (motion.speed_kmh * traffic_factor).max(1.0);

            let eta_secs = remaining_km / speed_kmh * 3600.0
                + trip.delay_minutes * 60.0 * config.traffic_weight;
            let eta_at = now + eta_secs;

            // Fuel burn splits the remaining path at the pickup boundary.
            let remaining_empty_km = (trip.pickup_leg_km - covered_km).max(0.0);
            let remaining_loaded_km = (remaining_km - remaining_empty_km).max(0.0);
            let fuel_needed = remaining_empty_km * motion.fuel_pct_per_10km_empty / 10.0
                + remaining_loaded_km * motion.fuel_pct_per_10km_loaded / 10.0;
            let fuel_at_arrival_pct = vehicle.fuel_level_percent - fuel_needed;

            let on_time = if eta_at <= load.delivery_deadline {
                OnTimeStatus::OnTime
            } else {
                OnTimeStatus::Delayed
            };

            let mut recommendations = Vec::new();
            if fuel_at_arrival_pct < config.fuel_low_threshold_pct {
                recommendations.push(Recommendation::Refuel);
            }
            if vehicle.hours_remaining < eta_secs / 3600.0 {
                recommendations.push(Recommendation::Rest);
            }
            if on_time == OnTimeStatus::Delayed {
                recommendations.push(Recommendation::DelayNotification);
            }
            if recommendations.is_empty() {
                recommendations.push(Recommendation::OnTrack);
            }

            Some(TripPrediction {
                trip_id: trip.id,
                vehicle_id: trip.vehicle_id,
                load_id: trip.load_id,
                progress_pct: trip.progress_pct,
                remaining_km,
                current_speed_kmh: speed_kmh,
                eta_secs,
                eta_at,
                fuel_at_arrival_pct,
                on_time,
                recommendations,
            })
        })
        .collect()
}

/// Delay minutes of the newest traffic alert touching `vehicle`, 0 if none.
fn latest_traffic_delay(snapshot: &Snapshot, vehicle: VehicleId) -> f64 {
    snapshot
        .recent_events
        .iter()
        .rev()
        .find_map(|e| match &e.kind {
            EventKind::TrafficAlert { vehicle_id, delay_minutes, .. } if *vehicle_id == vehicle => {
                Some(*delay_minutes)
            }
            _ => None,
        })
        .unwrap_or(0.0)
}
