//! Geographic coordinate types and spatial utilities.
//!
//! Coordinates are double-precision WGS-84 degrees.  Trip legs in this
//! system span hundreds of kilometres, so the ~0.5 % error of an `f32`
//! haversine would leak into revenue and ETA figures; `f64` keeps the
//! arithmetic exact enough to ignore.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6_371.0;

// ── GeoPoint ──────────────────────────────────────────────────────────────────

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `true` if latitude is in [−90, 90] and longitude in [−180, 180].
    #[inline]
    pub fn in_bounds(self) -> bool {
        self.lat.abs() <= 90.0 && self.lng.abs() <= 180.0
    }

    /// Haversine great-circle distance in kilometres.
    pub fn distance_km(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng * 0.5).sin().powi(2);

        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }

    /// Initial bearing from `self` toward `other`, in degrees [0, 360).
    pub fn bearing_deg(self, other: GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let y = d_lng.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }

    /// Linear interpolation between two points by fraction `t` in [0, 1].
    ///
    /// Planar interpolation is fine at the segment lengths this system
    /// produces (polyline points are a few kilometres apart at most).
    #[inline]
    pub fn lerp(self, other: GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lng)
    }
}

// ── Location ──────────────────────────────────────────────────────────────────

/// A geographic point with an optional human-readable label (city, depot).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    /// Human-readable label; `None` for synthetic en-route positions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng, name: None }
    }

    pub fn named(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self { lat, lng, name: Some(name.into()) }
    }

    #[inline]
    pub fn point(&self) -> GeoPoint {
        GeoPoint { lat: self.lat, lng: self.lng }
    }

    /// Great-circle distance to another location, in kilometres.
    #[inline]
    pub fn distance_km(&self, other: &Location) -> f64 {
        self.point().distance_km(other.point())
    }

    /// The label if present, else the formatted coordinates.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.point().to_string(),
        }
    }
}

impl From<GeoPoint> for Location {
    fn from(p: GeoPoint) -> Self {
        Location::new(p.lat, p.lng)
    }
}
