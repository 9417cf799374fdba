//! Route sources: the external OSRM-style client and test doubles.
//!
//! # Pluggability
//!
//! The cache calls routing via the [`RouteSource`] trait, so tests and
//! offline runs can swap in synthetic implementations without touching the
//! cache or anything above it.

use std::time::{Duration, Instant};

use fleet_core::config::RouteConfig;
use fleet_core::GeoPoint;
use serde::Deserialize;

use crate::error::{RouteError, RouteResult};
use crate::polyline::Polyline;

// ── RouteSource trait ─────────────────────────────────────────────────────────

/// Pluggable provider of road-following polylines.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; the cache is shared read-write
/// across agents and serializes concurrent misses per key, but distinct
/// keys may fetch concurrently.
pub trait RouteSource: Send + Sync {
    /// Fetch a drivable path from `start` to `end`.
    ///
    /// Must respect a bounded deadline internally; callers treat any error
    /// as "use the fallback".
    fn fetch(&self, start: GeoPoint, end: GeoPoint) -> RouteResult<Polyline>;
}

// ── OSRM wire format ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    /// Metres.
    distance: f64,
    /// Seconds.
    duration: f64,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: `[lng, lat]`.
    coordinates: Vec<[f64; 2]>,
}

// ── OsrmClient ────────────────────────────────────────────────────────────────

/// Blocking client for an OSRM `route/v1/driving` endpoint.
///
/// One attempt with a per-call timeout, at most one retry, and an overall
/// budget; whatever remains of the budget caps the retry's timeout.
pub struct OsrmClient {
    http: reqwest::blocking::Client,
    base_url: String,
    timeout: Duration,
    budget: Duration,
}

impl OsrmClient {
    pub fn new(config: &RouteConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            timeout: Duration::from_secs_f64(config.timeout_secs),
            budget: Duration::from_secs_f64(config.budget_secs),
        }
    }

    fn request_once(&self, url: &str, timeout: Duration) -> RouteResult<Polyline> {
        let response = self
            .http
            .get(url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .timeout(timeout)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    RouteError::Timeout { budget_secs: timeout.as_secs_f64() }
                } else {
                    RouteError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RouteError::Unavailable(format!("HTTP {status}")));
        }

        let body: OsrmResponse = response
            .json()
            .map_err(|e| RouteError::Malformed(e.to_string()))?;

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RouteError::Malformed("no routes in response".into()))?;

        if route.geometry.coordinates.len() < 2 {
            return Err(RouteError::Malformed("geometry has fewer than 2 points".into()));
        }

        // OSRM emits [lng, lat]; swap to our lat/lng convention.
        let points: Vec<GeoPoint> = route
            .geometry
            .coordinates
            .iter()
            .map(|c| GeoPoint::new(c[1], c[0]))
            .collect();

        Ok(Polyline {
            points,
            total_km: route.distance / 1000.0,
            duration_secs: route.duration,
            fallback: false,
        })
    }
}

impl RouteSource for OsrmClient {
    fn fetch(&self, start: GeoPoint, end: GeoPoint) -> RouteResult<Polyline> {
        // OSRM path segments are lng,lat.
        let url = format!(
            "{}/{:.6},{:.6};{:.6},{:.6}",
            self.base_url, start.lng, start.lat, end.lng, end.lat
        );

        let started = Instant::now();
        match self.request_once(&url, self.timeout) {
            Ok(polyline) => Ok(polyline),
            Err(first_err) => {
                let remaining = self.budget.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    return Err(first_err);
                }
                tracing::warn!(error = %first_err, "routing attempt failed, retrying once");
                self.request_once(&url, remaining.min(self.timeout))
            }
        }
    }
}

// ── Test / offline sources ────────────────────────────────────────────────────

/// Source that answers every query with a synthetic straight-line polyline,
/// as if the routing service had returned it (so `fallback` is `false`).
/// Used by offline demos and tests that need successful fetches.
pub struct SyntheticSource;

impl RouteSource for SyntheticSource {
    fn fetch(&self, start: GeoPoint, end: GeoPoint) -> RouteResult<Polyline> {
        let mut p = Polyline::synthetic(start, end);
        p.fallback = false;
        // Pretend the service estimated 60 km/h.
        p.duration_secs = p.total_km / 60.0 * 3600.0;
        Ok(p)
    }
}

/// Source that fails every query with a timeout.  Exercises the cache's
/// fallback path.
pub struct FailingSource;

impl RouteSource for FailingSource {
    fn fetch(&self, _start: GeoPoint, _end: GeoPoint) -> RouteResult<Polyline> {
        Err(RouteError::Timeout { budget_secs: 0.0 })
    }
}
