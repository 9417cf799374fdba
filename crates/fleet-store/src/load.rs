//! The `Load` entity and its monotone status lifecycle.

use fleet_core::{LoadId, Location, VehicleId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a freight load.
///
/// Transitions are monotone along
/// `available → matched → in_transit → delivered`; `cancelled` and
/// `expired` are reachable only from `available` or `matched`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Posted, not yet matched.
    Available,
    /// Assigned to a vehicle, not yet picked up.
    Matched,
    /// On the truck, moving.
    InTransit,
    /// Dropped off successfully.
    Delivered,
    /// No longer needs transport.
    Cancelled,
    /// Pickup window passed.
    Expired,
}

impl LoadStatus {
    /// Whether the lifecycle permits moving from `self` to `to`.
    pub fn can_transition(self, to: LoadStatus) -> bool {
        use LoadStatus::*;
        matches!(
            (self, to),
            (Available, Matched)
                | (Matched, InTransit)
                | (InTransit, Delivered)
                | (Available, Cancelled)
                | (Available, Expired)
                | (Matched, Cancelled)
                | (Matched, Expired)
        )
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadStatus::Delivered | LoadStatus::Cancelled | LoadStatus::Expired)
    }
}

/// A cargo request to be transported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub id: LoadId,
    pub status: LoadStatus,
    pub origin: Location,
    pub destination: Location,
    pub weight_tons: f64,
    /// Pre-computed origin → destination road distance, km.
    pub distance_km: f64,
    /// What the shipper pays per loaded kilometre.
    pub rate_per_km: f64,
    /// Epoch seconds — earliest pickup.
    pub pickup_window_start: f64,
    /// Epoch seconds — latest pickup; after this the load expires.
    pub pickup_window_end: f64,
    /// Epoch seconds — must arrive by this time.
    pub delivery_deadline: f64,
    /// Set iff status ∈ {matched, in_transit}.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_vehicle_id: Option<VehicleId>,
    pub posted_at: f64,
}

impl Load {
    #[inline]
    pub fn is_expired(&self, now: f64) -> bool {
        now > self.pickup_window_end
    }

    /// Revenue if delivered: rate × loaded distance.
    #[inline]
    pub fn total_revenue(&self) -> f64 {
        self.rate_per_km * self.distance_km
    }
}
