//! `fleet-route` — road-following polylines for the dispatch engine.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`polyline`] | `Polyline`, progress sampling, fallback synthesis         |
//! | [`client`]   | `RouteSource` trait, `OsrmClient`, test sources           |
//! | [`cache`]    | `RouteCache` — rounded-key LRU + TTL + single-flight      |
//! | [`error`]    | `RouteError`, `RouteResult<T>`                            |
//!
//! The public cache contract never fails: when the external service cannot
//! be consulted within its budget, a synthetic straight-line polyline is
//! substituted and flagged `fallback = true`.

pub mod cache;
pub mod client;
pub mod error;
pub mod polyline;

#[cfg(test)]
mod tests;

pub use cache::{CacheStats, RouteCache};
pub use client::{FailingSource, OsrmClient, RouteSource, SyntheticSource};
pub use error::{RouteError, RouteResult};
pub use polyline::Polyline;
