//! The `Vehicle` entity.

use fleet_core::{DriverId, Location, VehicleId};
use serde::{Deserialize, Serialize};

/// Operational status of a truck.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    /// Parked, available, no assignment.
    Idle,
    /// Moving without cargo (deadhead leg).
    EnRouteEmpty,
    /// Moving with cargo.
    EnRouteLoaded,
    /// Physically at the pickup location.
    AtPickup,
    /// Physically at the delivery location.
    AtDelivery,
    /// Out of service.
    Maintenance,
    /// GPS lost or driver logged out.
    Offline,
}

impl VehicleStatus {
    /// `true` for statuses that mean the vehicle is executing a trip.
    #[inline]
    pub fn on_trip(self) -> bool {
        matches!(
            self,
            VehicleStatus::EnRouteEmpty
                | VehicleStatus::EnRouteLoaded
                | VehicleStatus::AtPickup
                | VehicleStatus::AtDelivery
        )
    }
}

/// A truck in the fleet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub driver_id: DriverId,
    pub status: VehicleStatus,
    pub current_location: Location,
    /// Max payload, metric tons.
    pub capacity_tons: f64,
    /// Cargo currently on board, tons.  Always ≤ `capacity_tons`.
    pub current_load_tons: f64,
    pub fuel_level_percent: f64,
    /// Regulatory hours-of-service remaining for the driver.
    pub hours_remaining: f64,
    pub total_km_today: f64,
    pub loaded_km_today: f64,
    /// Epoch seconds of the last status or position change.
    pub last_activity_at: f64,
    /// Where the vehicle eventually needs to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_depot: Option<Location>,
}

impl Vehicle {
    /// loaded km / total km for today; 0 if nothing driven yet.
    pub fn utilization_rate(&self) -> f64 {
        if self.total_km_today == 0.0 {
            0.0
        } else {
            self.loaded_km_today / self.total_km_today
        }
    }

    /// Can this vehicle take a new load right now?
    ///
    /// Stricter than `status == Idle`: a truck with an exhausted driver or
    /// a near-empty tank is parked, not available.
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Idle
            && self.current_load_tons == 0.0
            && self.hours_remaining > 1.0
            && self.fuel_level_percent > 15.0
    }

    /// Minutes since the last recorded activity.
    #[inline]
    pub fn idle_minutes(&self, now: f64) -> f64 {
        ((now - self.last_activity_at) / 60.0).max(0.0)
    }
}
