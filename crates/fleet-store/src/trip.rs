//! The `Trip` entity: one vehicle moving one load, phase by phase.

use std::sync::Arc;

use fleet_core::{LoadId, TripId, VehicleId};
use fleet_route::Polyline;
use serde::{Deserialize, Serialize};

/// Phase of an active trip, in execution order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPhase {
    /// Created; route not yet obtained or journey not yet begun.
    Planning,
    /// Driving empty toward the pickup location.
    EnRouteToPickup,
    /// At the pickup location taking cargo on board (held one tick).
    Loading,
    /// Driving loaded toward the delivery location.
    InTransit,
    /// At the delivery location discharging cargo (held one tick).
    Unloading,
    Completed,
    Cancelled,
}

impl TripPhase {
    /// Position in the forward phase order; `Cancelled` sits outside it.
    fn rank(self) -> u8 {
        match self {
            TripPhase::Planning => 0,
            TripPhase::EnRouteToPickup => 1,
            TripPhase::Loading => 2,
            TripPhase::InTransit => 3,
            TripPhase::Unloading => 4,
            TripPhase::Completed => 5,
            TripPhase::Cancelled => 6,
        }
    }

    /// Whether a trip may move from `self` to `to`: strictly forward along
    /// the phase order, or to `Cancelled` from any non-terminal phase.
    pub fn can_advance_to(self, to: TripPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        if to == TripPhase::Cancelled {
            return true;
        }
        to.rank() > self.rank() && to != TripPhase::Cancelled
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TripPhase::Completed | TripPhase::Cancelled)
    }
}

/// A dispatched journey: pickup leg plus loaded leg over one cached route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub vehicle_id: VehicleId,
    pub load_id: LoadId,
    pub phase: TripPhase,
    /// Cached road path covering both legs.  `None` until the motion
    /// engine obtains one (or after the adapter invalidates it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Arc<Polyline>>,
    /// Progress over the whole route, percent in [0, 100].  Monotone
    /// non-decreasing for the lifetime of the trip.
    pub progress_pct: f64,
    /// Trip progress at which the current polyline begins.  0 for the
    /// original route; set by the motion engine when a mid-journey
    /// re-route replaces the remaining leg, so progress stays monotone
    /// while sampling maps onto the fresh polyline.
    #[serde(default)]
    pub route_base_pct: f64,
    /// Deadhead distance from the vehicle's start to the pickup, km.
    pub pickup_leg_km: f64,
    /// Loaded distance from pickup to delivery, km.
    pub loaded_leg_km: f64,
    pub estimated_revenue: f64,
    pub estimated_cost: f64,
    pub estimated_profit: f64,
    /// Accumulated traffic/rerouting delay, minutes.  Feeds the predictor.
    pub delay_minutes: f64,
    /// Load to roll into once this trip completes, if the adapter chose one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followup_load_id: Option<LoadId>,
    /// Motion ticks this trip has seen; drives position-event decimation.
    pub ticks: u64,
    pub started_at: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<f64>,
}

impl Trip {
    /// Total planned distance over both legs, km.
    #[inline]
    pub fn total_route_km(&self) -> f64 {
        self.pickup_leg_km + self.loaded_leg_km
    }

    /// Progress percentage at which the pickup is reached.
    pub fn pickup_boundary_pct(&self) -> f64 {
        let total = self.total_route_km();
        if total <= 0.0 {
            0.0
        } else {
            self.pickup_leg_km / total * 100.0
        }
    }

    /// (revenue − cost) / revenue; 0 when revenue is 0.
    pub fn profit_margin(&self) -> f64 {
        if self.estimated_revenue == 0.0 {
            0.0
        } else {
            self.estimated_profit / self.estimated_revenue
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.phase.is_terminal()
    }
}
