//! Events: things that happened in the world, as a closed tagged enum.
//!
//! Payloads are typed variants, not open dictionaries — emission and
//! parsing are total functions over [`EventKind`].  The store stamps each
//! event with a globally monotone sequence number and a non-decreasing
//! timestamp; `(timestamp, seq)` is the total order across ticks.

use fleet_core::{LoadId, Location, TripId, VehicleId};
use serde::{Deserialize, Serialize};

/// A stamped event in the ring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Globally monotone sequence number assigned by the store.
    pub seq: u64,
    /// Epoch seconds, clamped non-decreasing across the ring.
    pub timestamp: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// The closed event-type enumeration with typed payloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventKind {
    VehiclePositionUpdate {
        vehicle_id: VehicleId,
        lat: f64,
        lng: f64,
    },
    LoadPosted {
        load_id: LoadId,
        origin: Location,
        destination: Location,
        weight_tons: f64,
        rate_per_km: f64,
    },
    LoadMatched {
        load_id: LoadId,
        vehicle_id: VehicleId,
    },
    TripStarted {
        trip_id: TripId,
        vehicle_id: VehicleId,
        load_id: LoadId,
    },
    TripCompleted {
        trip_id: TripId,
    },
    TrafficAlert {
        vehicle_id: VehicleId,
        delay_minutes: f64,
        reason: String,
    },
    DeliveryDelay {
        trip_id: TripId,
        delay_minutes: f64,
        reason: String,
    },
    FuelLow {
        vehicle_id: VehicleId,
        percent: f64,
    },
    MaintenanceRequired {
        vehicle_id: VehicleId,
        reason: String,
    },
    NewLoadPosted {
        load_id: LoadId,
    },
    DriverRestRequired {
        vehicle_id: VehicleId,
    },
}

impl EventKind {
    /// The wire tag, matching the serde representation.
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::VehiclePositionUpdate { .. } => "vehicle_position_update",
            EventKind::LoadPosted { .. } => "load_posted",
            EventKind::LoadMatched { .. } => "load_matched",
            EventKind::TripStarted { .. } => "trip_started",
            EventKind::TripCompleted { .. } => "trip_completed",
            EventKind::TrafficAlert { .. } => "traffic_alert",
            EventKind::DeliveryDelay { .. } => "delivery_delay",
            EventKind::FuelLow { .. } => "fuel_low",
            EventKind::MaintenanceRequired { .. } => "maintenance_required",
            EventKind::NewLoadPosted { .. } => "new_load_posted",
            EventKind::DriverRestRequired { .. } => "driver_rest_required",
        }
    }

    /// The vehicle this event concerns, if any.  Used by the adapter when
    /// assembling a per-vehicle disturbance picture.
    pub fn vehicle_id(&self) -> Option<VehicleId> {
        match self {
            EventKind::VehiclePositionUpdate { vehicle_id, .. }
            | EventKind::LoadMatched { vehicle_id, .. }
            | EventKind::TripStarted { vehicle_id, .. }
            | EventKind::TrafficAlert { vehicle_id, .. }
            | EventKind::FuelLow { vehicle_id, .. }
            | EventKind::MaintenanceRequired { vehicle_id, .. }
            | EventKind::DriverRestRequired { vehicle_id } => Some(*vehicle_id),
            _ => None,
        }
    }
}
