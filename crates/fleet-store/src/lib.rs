//! `fleet-store` — entity models and the authoritative in-memory state store.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`vehicle`] | `Vehicle`, `VehicleStatus`                                |
//! | [`load`]    | `Load`, `LoadStatus` and its transition rules             |
//! | [`trip`]    | `Trip`, `TripPhase` and its phase order                   |
//! | [`event`]   | `Event`, tagged `EventKind` payloads                      |
//! | [`store`]   | `FleetStore`, `Snapshot`, the bounded event ring          |
//! | [`seed`]    | count-parameterized fleet/load seeding over a city table  |
//! | [`error`]   | `StoreError`, `StoreResult<T>`                            |
//!
//! # Ownership model
//!
//! The store exclusively owns the entity maps and the event ring.  Readers
//! get a [`Snapshot`] — `Arc`-shared immutable values, safe to retain with
//! no further synchronization.  Writers go through the store's methods,
//! which serialize under one write lock; no component holds mutable
//! references across tick boundaries.

pub mod error;
pub mod event;
pub mod load;
pub mod seed;
pub mod store;
pub mod trip;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use error::{StoreError, StoreResult};
pub use event::{Event, EventKind};
pub use load::{Load, LoadStatus};
pub use store::{FleetStore, Snapshot};
pub use trip::{Trip, TripPhase};
pub use vehicle::{Vehicle, VehicleStatus};
