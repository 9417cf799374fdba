//! Count-parameterized seeding: trucks and loads scattered over a fixed
//! city table.
//!
//! In production these records come from fleet telematics and a load
//! board; this module stands in for both so the engine can run against a
//! realistic population from the first tick.  Everything is driven by a
//! [`FleetRng`], so a given seed always produces the same fleet.

use fleet_core::{DriverId, FleetRng, LoadId, Location, VehicleId};

use crate::load::{Load, LoadStatus};
use crate::vehicle::{Vehicle, VehicleStatus};

// ── City table ────────────────────────────────────────────────────────────────

/// Major freight-corridor cities: `(key, name, lat, lng)`.
const CITIES: &[(&str, &str, f64, f64)] = &[
    ("delhi", "Delhi", 28.6139, 77.2090),
    ("mumbai", "Mumbai", 19.0760, 72.8777),
    ("bangalore", "Bangalore", 12.9716, 77.5946),
    ("chennai", "Chennai", 13.0827, 80.2707),
    ("hyderabad", "Hyderabad", 17.3850, 78.4867),
    ("kolkata", "Kolkata", 22.5726, 88.3639),
    ("pune", "Pune", 18.5204, 73.8567),
    ("jaipur", "Jaipur", 26.9124, 75.7873),
    ("lucknow", "Lucknow", 26.8467, 80.9462),
    ("ahmedabad", "Ahmedabad", 22.5726, 72.8311),
];

/// Approximate road distances between city pairs, km.  Symmetric;
/// unlisted pairs fall back to a scaled coordinate estimate.
const ROAD_DISTANCES: &[(&str, &str, f64)] = &[
    ("delhi", "mumbai", 1412.0),
    ("delhi", "bangalore", 2150.0),
    ("delhi", "chennai", 2180.0),
    ("delhi", "hyderabad", 1750.0),
    ("delhi", "kolkata", 1470.0),
    ("delhi", "pune", 1380.0),
    ("delhi", "jaipur", 270.0),
    ("delhi", "lucknow", 470.0),
    ("delhi", "ahmedabad", 960.0),
    ("mumbai", "bangalore", 840.0),
    ("mumbai", "chennai", 1340.0),
    ("mumbai", "hyderabad", 730.0),
    ("mumbai", "pune", 155.0),
    ("mumbai", "ahmedabad", 440.0),
    ("bangalore", "chennai", 340.0),
    ("bangalore", "hyderabad", 570.0),
    ("chennai", "hyderabad", 630.0),
    ("kolkata", "lucknow", 1030.0),
    ("pune", "hyderabad", 580.0),
    ("jaipur", "ahmedabad", 540.0),
];

fn city_location(key: &str) -> Location {
    let (_, name, lat, lng) = CITIES
        .iter()
        .find(|(k, ..)| *k == key)
        .copied()
        .unwrap_or(CITIES[0]);
    Location::named(lat, lng, name)
}

/// Road distance between two city keys, km.
pub fn city_distance_km(a: &str, b: &str) -> f64 {
    ROAD_DISTANCES
        .iter()
        .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, _, d)| *d)
        .unwrap_or_else(|| {
            // Rough estimate: 111 km per degree of separation.
            let la = city_location(a);
            let lb = city_location(b);
            (((la.lat - lb.lat).powi(2) + (la.lng - lb.lng).powi(2)).sqrt() * 111.0 * 10.0)
                .round()
                / 10.0
        })
}

// ── Seeding ───────────────────────────────────────────────────────────────────

/// Create `count` trucks parked round-robin over the city table.
pub fn seed_vehicles(count: usize, rng: &mut FleetRng, now: f64) -> Vec<Vehicle> {
    (0..count)
        .map(|i| {
            let (key, ..) = CITIES[i % CITIES.len()];
            Vehicle {
                id: VehicleId(i as u32 + 1),
                driver_id: DriverId(i as u32 + 1),
                status: VehicleStatus::Idle,
                current_location: city_location(key),
                capacity_tons: rng.gen_range(10.0..25.0),
                current_load_tons: 0.0,
                fuel_level_percent: rng.gen_range(60.0..100.0),
                hours_remaining: rng.gen_range(4.0..10.0),
                total_km_today: 0.0,
                loaded_km_today: 0.0,
                last_activity_at: now,
                home_depot: Some(city_location("delhi")),
            }
        })
        .collect()
}

/// One available load between two distinct random cities, with a pickup
/// window 2–6 h out and a deadline padded past the travel estimate.
pub fn make_load(id: LoadId, rng: &mut FleetRng, now: f64) -> Load {
    let origin_idx = rng.gen_range(0..CITIES.len());
    let mut dest_idx = rng.gen_range(0..CITIES.len() - 1);
    if dest_idx >= origin_idx {
        dest_idx += 1;
    }
    let origin_key = CITIES[origin_idx].0;
    let dest_key = CITIES[dest_idx].0;

    let distance_km = city_distance_km(origin_key, dest_key);
    let window_hours = rng.gen_range(2.0..6.0);
    let travel_hours = distance_km / 60.0;
    let deadline_buffer_hours = rng.gen_range(1.0..4.0);

    Load {
        id,
        status: LoadStatus::Available,
        origin: city_location(origin_key),
        destination: city_location(dest_key),
        weight_tons: (rng.gen_range(2.0..20.0) * 10.0_f64).round() / 10.0,
        distance_km,
        rate_per_km: (rng.gen_range(35.0..80.0) * 100.0_f64).round() / 100.0,
        pickup_window_start: now,
        pickup_window_end: now + window_hours * 3600.0,
        delivery_deadline: now + (window_hours + travel_hours + deadline_buffer_hours) * 3600.0,
        assigned_vehicle_id: None,
        posted_at: now,
    }
}

/// Create `count` available loads (ids 1..=count).
pub fn seed_loads(count: usize, rng: &mut FleetRng, now: f64) -> Vec<Load> {
    (0..count)
        .map(|i| make_load(LoadId(i as u32 + 1), rng, now))
        .collect()
}
