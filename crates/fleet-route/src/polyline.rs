//! `Polyline` — an ordered sequence of road points with progress sampling.

use fleet_core::GeoPoint;
use serde::{Deserialize, Serialize};

/// Spacing of synthesized fallback points, km.
const FALLBACK_POINT_SPACING_KM: f64 = 5.0;
/// A fallback polyline never has fewer points than this.
const FALLBACK_MIN_POINTS: usize = 20;

/// A drivable path between two coordinates.
///
/// `points` runs from start to end inclusive.  `fallback` marks polylines
/// synthesized locally because the external routing service could not be
/// consulted in time; callers that care (the motion engine does not) can
/// inspect the flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<GeoPoint>,
    /// Total path length, km.
    pub total_km: f64,
    /// Estimated driving time, seconds.
    pub duration_secs: f64,
    pub fallback: bool,
}

impl Polyline {
    /// Build from road points, computing the length by summing haversine
    /// segment distances.  `duration_secs` of zero means "unknown".
    pub fn from_points(points: Vec<GeoPoint>, duration_secs: f64, fallback: bool) -> Self {
        let total_km = path_length_km(&points);
        Self { points, total_km, duration_secs, fallback }
    }

    /// Synthesize a straight-line fallback between two endpoints: one point
    /// per ≈5 km, never fewer than 20 points.
    pub fn synthetic(start: GeoPoint, end: GeoPoint) -> Self {
        let distance = start.distance_km(end);
        let segments = ((distance / FALLBACK_POINT_SPACING_KM).ceil() as usize)
            .max(FALLBACK_MIN_POINTS - 1);

        let points: Vec<GeoPoint> = (0..=segments)
            .map(|i| start.lerp(end, i as f64 / segments as f64))
            .collect();

        Self {
            points,
            total_km: distance,
            duration_secs: 0.0,
            fallback: true,
        }
    }

    /// Concatenate two legs into one path (pickup leg + loaded leg).
    ///
    /// The duplicated join point (end of `self` == start of `next`) is
    /// dropped.  The result is flagged `fallback` if either leg was.
    pub fn then(mut self, next: Polyline) -> Polyline {
        let skip_join = match (self.points.last(), next.points.first()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        self.points
            .extend(next.points.into_iter().skip(usize::from(skip_join)));
        Polyline {
            points: self.points,
            total_km: self.total_km + next.total_km,
            duration_secs: self.duration_secs + next.duration_secs,
            fallback: self.fallback || next.fallback,
        }
    }

    /// Sample the position at `pct` percent progress in [0, 100].
    ///
    /// Interpolates linearly between adjacent points by index — segment
    /// lengths are near-uniform (routing services emit dense geometry and
    /// fallbacks are built that way), so index position is an adequate
    /// stand-in for arc length.
    pub fn point_at_pct(&self, pct: f64) -> Option<GeoPoint> {
        let first = *self.points.first()?;
        if self.points.len() == 1 {
            return Some(first);
        }

        let pct = pct.clamp(0.0, 100.0);
        let exact = pct / 100.0 * (self.points.len() - 1) as f64;
        let lower = exact.floor() as usize;
        if lower >= self.points.len() - 1 {
            return self.points.last().copied();
        }
        let fraction = exact - lower as f64;
        Some(self.points[lower].lerp(self.points[lower + 1], fraction))
    }

    #[inline]
    pub fn start(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    #[inline]
    pub fn end(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }
}

/// Sum of haversine segment lengths, km.
fn path_length_km(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| w[0].distance_km(w[1]))
        .sum()
}
