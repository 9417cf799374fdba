//! `fleet-core` — foundational types for the fleet dispatch engine.
//!
//! This crate is a dependency of every other `fleet-*` crate.  It
//! intentionally has no `fleet-*` dependencies and minimal external ones
//! (`rand`, `serde`, `thiserror`).
//!
//! # What lives here
//!
//! | Module      | Contents                                               |
//! |-------------|--------------------------------------------------------|
//! | [`ids`]     | `VehicleId`, `DriverId`, `LoadId`, `TripId`            |
//! | [`geo`]     | `GeoPoint`, `Location`, haversine distance, bearing    |
//! | [`clock`]   | `Clock` trait, `SystemClock`, `ManualClock`            |
//! | [`rng`]     | `FleetRng` — deterministic seeded RNG                  |
//! | [`config`]  | `EngineConfig` and its per-component sections          |
//! | [`error`]   | `FleetError`, `FleetResult`                            |

pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{FleetError, FleetResult};
pub use geo::{GeoPoint, Location};
pub use ids::{DriverId, LoadId, TripId, VehicleId};
pub use rng::FleetRng;
