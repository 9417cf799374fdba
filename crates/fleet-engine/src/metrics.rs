//! KPI aggregation.  Pure functions over a snapshot; agents do not
//! compute metrics themselves.

use fleet_store::{LoadStatus, Snapshot, VehicleStatus};
use serde::Serialize;

/// The summary object served by the `metrics` command.
#[derive(Clone, Debug, Serialize)]
pub struct KpiSummary {
    pub total_vehicles: usize,
    pub available_vehicles: usize,
    pub idle_vehicles: usize,
    pub en_route_vehicles: usize,
    pub total_loads: usize,
    pub available_loads: usize,
    pub matched_loads: usize,
    pub in_transit_loads: usize,
    /// Mean per-vehicle utilization, 0–100.
    pub avg_utilization: f64,
    pub total_km_today: f64,
}

/// Wider operational dashboard for reports and the demo binary.
#[derive(Clone, Debug, Serialize)]
pub struct FleetDashboard {
    #[serde(flatten)]
    pub kpis: KpiSummary,
    pub active_trips: usize,
    /// Trips whose pickup leg exceeds 20 % of their total distance.
    pub empty_return_rate: f64,
    pub revenue_per_km: f64,
    pub avg_profit_margin: f64,
}

pub fn kpis(snapshot: &Snapshot, now: f64) -> KpiSummary {
    let vehicles = snapshot.vehicles.values();
    let idle_vehicles = vehicles
        .clone()
        .filter(|v| v.status == VehicleStatus::Idle)
        .count();
    let en_route_vehicles = vehicles
        .clone()
        .filter(|v| {
            matches!(
                v.status,
                VehicleStatus::EnRouteEmpty | VehicleStatus::EnRouteLoaded
            )
        })
        .count();

    let total_vehicles = snapshot.vehicles.len();
    let avg_utilization = if total_vehicles == 0 {
        0.0
    } else {
        snapshot
            .vehicles
            .values()
            .map(|v| v.utilization_rate() * 100.0)
            .sum::<f64>()
            / total_vehicles as f64
    };

    KpiSummary {
        total_vehicles,
        available_vehicles: snapshot.available_vehicles().len(),
        idle_vehicles,
        en_route_vehicles,
        total_loads: snapshot.loads.len(),
        available_loads: snapshot.available_loads(now).len(),
        matched_loads: count_loads(snapshot, LoadStatus::Matched),
        in_transit_loads: count_loads(snapshot, LoadStatus::InTransit),
        avg_utilization,
        total_km_today: snapshot.vehicles.values().map(|v| v.total_km_today).sum(),
    }
}

pub fn dashboard(snapshot: &Snapshot, now: f64) -> FleetDashboard {
    let trips = snapshot.active_trips();
    let empty_returns = trips
        .iter()
        .filter(|t| {
            let total = t.total_route_km();
            total > 0.0 && t.pickup_leg_km / total > 0.20
        })
        .count();

    let total_trip_km: f64 = trips.iter().map(|t| t.total_route_km()).sum();
    let total_revenue: f64 = trips.iter().map(|t| t.estimated_revenue).sum();
    let avg_profit_margin = if trips.is_empty() {
        0.0
    } else {
        trips.iter().map(|t| t.profit_margin()).sum::<f64>() / trips.len() as f64
    };

    FleetDashboard {
        kpis: kpis(snapshot, now),
        active_trips: trips.len(),
        empty_return_rate: if trips.is_empty() {
            0.0
        } else {
            empty_returns as f64 / trips.len() as f64
        },
        revenue_per_km: if total_trip_km > 0.0 {
            total_revenue / total_trip_km
        } else {
            0.0
        },
        avg_profit_margin,
    }
}

fn count_loads(snapshot: &Snapshot, status: LoadStatus) -> usize {
    snapshot.loads.values().filter(|l| l.status == status).count()
}
