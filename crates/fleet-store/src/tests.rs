//! Unit tests for fleet-store.

use fleet_core::{DriverId, FleetRng, LoadId, Location, TripId, VehicleId};

use crate::event::EventKind;
use crate::load::{Load, LoadStatus};
use crate::seed::{seed_loads, seed_vehicles};
use crate::store::FleetStore;
use crate::trip::{Trip, TripPhase};
use crate::vehicle::{Vehicle, VehicleStatus};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn vehicle(id: u32) -> Vehicle {
    Vehicle {
        id: VehicleId(id),
        driver_id: DriverId(id),
        status: VehicleStatus::Idle,
        current_location: Location::named(28.6139, 77.2090, "Delhi"),
        capacity_tons: 20.0,
        current_load_tons: 0.0,
        fuel_level_percent: 90.0,
        hours_remaining: 9.0,
        total_km_today: 0.0,
        loaded_km_today: 0.0,
        last_activity_at: 1_000.0,
        home_depot: None,
    }
}

fn load(id: u32, now: f64) -> Load {
    Load {
        id: LoadId(id),
        status: LoadStatus::Available,
        origin: Location::named(26.9124, 75.7873, "Jaipur"),
        destination: Location::named(19.0760, 72.8777, "Mumbai"),
        weight_tons: 12.0,
        distance_km: 1_100.0,
        rate_per_km: 50.0,
        pickup_window_start: now,
        pickup_window_end: now + 4.0 * 3600.0,
        delivery_deadline: now + 30.0 * 3600.0,
        assigned_vehicle_id: None,
        posted_at: now,
    }
}

fn trip(id: u32, vehicle: u32, load: u32, now: f64) -> Trip {
    Trip {
        id: TripId(id),
        vehicle_id: VehicleId(vehicle),
        load_id: LoadId(load),
        phase: TripPhase::Planning,
        route: None,
        progress_pct: 0.0,
        route_base_pct: 0.0,
        pickup_leg_km: 240.0,
        loaded_leg_km: 1_100.0,
        estimated_revenue: 55_000.0,
        estimated_cost: 3_685.0,
        estimated_profit: 51_315.0,
        delay_minutes: 0.0,
        followup_load_id: None,
        ticks: 0,
        started_at: now,
        completed_at: None,
    }
}

fn seeded_store(now: f64) -> FleetStore {
    let store = FleetStore::new(500);
    store.insert_vehicle(vehicle(1)).unwrap();
    store.insert_vehicle(vehicle(2)).unwrap();
    store.insert_load(load(1, now)).unwrap();
    store.insert_load(load(2, now)).unwrap();
    store
}

// ── Snapshot semantics ────────────────────────────────────────────────────────

mod snapshot {
    use super::*;

    #[test]
    fn snapshots_are_isolated_from_later_writes() {
        let store = seeded_store(1_000.0);
        let before = store.snapshot(1_000.0);

        store
            .update_vehicle(VehicleId(1), |v| v.fuel_level_percent = 10.0)
            .unwrap();

        let after = store.snapshot(1_001.0);
        assert_eq!(before.vehicle(VehicleId(1)).unwrap().fuel_level_percent, 90.0);
        assert_eq!(after.vehicle(VehicleId(1)).unwrap().fuel_level_percent, 10.0);
    }

    #[test]
    fn serde_round_trip_is_lossless() {
        let store = seeded_store(1_000.0);
        store.apply_events(
            1_000.0,
            vec![EventKind::NewLoadPosted { load_id: LoadId(1) }],
        );
        let snap = store.snapshot(1_000.0);

        let json = serde_json::to_string(&snap).unwrap();
        let back: crate::Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }

    #[test]
    fn available_loads_excludes_expired_and_reserved() {
        let now = 1_000.0;
        let store = seeded_store(now);
        // Reserve load 2 as a follow-up on an active trip.
        let mut t = trip(1, 1, 1, now);
        t.followup_load_id = Some(LoadId(2));
        store.insert_trip(t).unwrap();

        let snap = store.snapshot(now);
        let ids: Vec<_> = snap.available_loads(now).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![LoadId(1)]);

        // Past the pickup window everything is stale.
        let late = now + 10.0 * 3600.0;
        assert!(store.snapshot(late).available_loads(late).is_empty());
    }
}

// ── Event ring ────────────────────────────────────────────────────────────────

mod events {
    use super::*;

    #[test]
    fn ring_drops_oldest_on_overflow() {
        let store = FleetStore::new(3);
        for i in 0..5u32 {
            store.apply_events(
                1_000.0 + i as f64,
                vec![EventKind::NewLoadPosted { load_id: LoadId(i) }],
            );
        }
        let snap = store.snapshot(1_005.0);
        assert_eq!(snap.recent_events.len(), 3);
        let seqs: Vec<_> = snap.recent_events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![2, 3, 4]);
    }

    #[test]
    fn timestamps_never_regress() {
        let store = FleetStore::new(10);
        store.apply_events(2_000.0, vec![EventKind::NewLoadPosted { load_id: LoadId(1) }]);
        // A caller with a stale clock cannot push time backwards.
        store.apply_events(1_500.0, vec![EventKind::NewLoadPosted { load_id: LoadId(2) }]);
        let snap = store.snapshot(2_000.0);
        let ts: Vec<_> = snap.recent_events.iter().map(|e| e.timestamp).collect();
        assert_eq!(ts, vec![2_000.0, 2_000.0]);
        let seqs: Vec<_> = snap.recent_events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }
}

// ── Write conflicts ───────────────────────────────────────────────────────────

mod writes {
    use super::*;

    #[test]
    fn unknown_ids_are_not_found() {
        let store = seeded_store(1_000.0);
        assert!(store.update_vehicle(VehicleId(99), |_| {}).is_err());
        assert!(store.update_load(LoadId(99), |_| {}).is_err());
        assert!(store.update_trip(TripId(99), |_| {}).is_err());
        assert!(store.remove_trip(TripId(99)).is_err());
    }

    #[test]
    fn duplicate_inserts_conflict() {
        let store = seeded_store(1_000.0);
        assert!(store.insert_vehicle(vehicle(1)).is_err());
        assert!(store.insert_load(load(1, 1_000.0)).is_err());
    }

    #[test]
    fn trip_insert_rejects_busy_vehicle_or_load() {
        let store = seeded_store(1_000.0);
        store.insert_trip(trip(1, 1, 1, 1_000.0)).unwrap();
        // Same vehicle, different load.
        assert!(store.insert_trip(trip(2, 1, 2, 1_000.0)).is_err());
        // Same load, different vehicle.
        assert!(store.insert_trip(trip(3, 2, 1, 1_000.0)).is_err());
        // Disjoint pair is fine.
        store.insert_trip(trip(4, 2, 2, 1_000.0)).unwrap();
    }

    #[test]
    fn load_transitions_are_monotone() {
        let store = seeded_store(1_000.0);
        // available → in_transit skips matched.
        assert!(store.transition_load(LoadId(1), LoadStatus::InTransit).is_err());
        store.transition_load(LoadId(1), LoadStatus::Matched).unwrap();
        store.transition_load(LoadId(1), LoadStatus::InTransit).unwrap();
        store.transition_load(LoadId(1), LoadStatus::Delivered).unwrap();
        // Terminal states accept nothing.
        assert!(store.transition_load(LoadId(1), LoadStatus::Available).is_err());
    }
}

// ── commit_match ──────────────────────────────────────────────────────────────

mod commit {
    use super::*;

    #[test]
    fn match_commit_applies_everything_at_once() {
        let now = 1_000.0;
        let store = seeded_store(now);
        store.commit_match(trip(1, 1, 1, now), now).unwrap();

        let snap = store.snapshot(now);
        let l = snap.load(LoadId(1)).unwrap();
        assert_eq!(l.status, LoadStatus::Matched);
        assert_eq!(l.assigned_vehicle_id, Some(VehicleId(1)));
        assert_eq!(snap.vehicle(VehicleId(1)).unwrap().status, VehicleStatus::EnRouteEmpty);

        let kinds: Vec<_> = snap
            .recent_events
            .iter()
            .map(|e| e.kind.type_name())
            .collect();
        assert_eq!(kinds, vec!["load_matched", "trip_started"]);
    }

    #[test]
    fn zero_length_pickup_leg_goes_straight_to_loaded() {
        let now = 1_000.0;
        let store = seeded_store(now);
        let mut t = trip(1, 1, 1, now);
        t.pickup_leg_km = 0.0;
        store.commit_match(t, now).unwrap();
        assert_eq!(
            store.snapshot(now).vehicle(VehicleId(1)).unwrap().status,
            VehicleStatus::EnRouteLoaded
        );
    }

    #[test]
    fn overweight_match_is_rejected_whole() {
        let now = 1_000.0;
        let store = seeded_store(now);
        store
            .update_load(LoadId(1), |l| l.weight_tons = 25.0)
            .unwrap();
        assert!(store.commit_match(trip(1, 1, 1, now), now).is_err());

        // Nothing partial leaked out.
        let snap = store.snapshot(now);
        assert_eq!(snap.load(LoadId(1)).unwrap().status, LoadStatus::Available);
        assert_eq!(snap.vehicle(VehicleId(1)).unwrap().status, VehicleStatus::Idle);
        assert!(snap.trips.is_empty());
        assert!(snap.recent_events.is_empty());
    }

    #[test]
    fn double_match_on_same_vehicle_conflicts() {
        let now = 1_000.0;
        let store = seeded_store(now);
        store.commit_match(trip(1, 1, 1, now), now).unwrap();
        assert!(store.commit_match(trip(2, 1, 2, now), now).is_err());
    }
}

// ── cancel_load ───────────────────────────────────────────────────────────────

mod cancel {
    use super::*;

    #[test]
    fn cancelling_matched_load_releases_the_vehicle() {
        let now = 1_000.0;
        let store = seeded_store(now);
        store.commit_match(trip(1, 1, 1, now), now).unwrap();

        store.cancel_load(LoadId(1), now + 60.0).unwrap();
        let snap = store.snapshot(now + 60.0);
        assert_eq!(snap.load(LoadId(1)).unwrap().status, LoadStatus::Cancelled);
        assert_eq!(snap.load(LoadId(1)).unwrap().assigned_vehicle_id, None);
        assert_eq!(snap.vehicle(VehicleId(1)).unwrap().status, VehicleStatus::Idle);
        assert!(snap.active_trips().is_empty());
    }

    #[test]
    fn in_transit_load_cannot_be_cancelled() {
        let now = 1_000.0;
        let store = seeded_store(now);
        store.commit_match(trip(1, 1, 1, now), now).unwrap();
        store.transition_load(LoadId(1), LoadStatus::InTransit).unwrap();
        assert!(store.cancel_load(LoadId(1), now).is_err());
    }
}

// ── Seeding ───────────────────────────────────────────────────────────────────

mod seeding {
    use super::*;

    #[test]
    fn seeding_is_deterministic_per_seed() {
        let now = 1_000.0;
        let a = seed_vehicles(5, &mut FleetRng::new(42), now);
        let b = seed_vehicles(5, &mut FleetRng::new(42), now);
        assert_eq!(a, b);
        let c = seed_vehicles(5, &mut FleetRng::new(43), now);
        assert_ne!(a, c);
    }

    #[test]
    fn seeded_entities_are_well_formed() {
        let now = 1_000.0;
        let mut rng = FleetRng::new(7);
        let vehicles = seed_vehicles(12, &mut rng, now);
        assert_eq!(vehicles.len(), 12);
        for v in &vehicles {
            assert_eq!(v.status, VehicleStatus::Idle);
            assert!(v.capacity_tons >= 10.0 && v.capacity_tons < 25.0);
            assert!(v.current_location.name.is_some());
        }

        let loads = seed_loads(8, &mut rng, now);
        assert_eq!(loads.len(), 8);
        for l in &loads {
            assert_eq!(l.status, LoadStatus::Available);
            assert_ne!(l.origin.name, l.destination.name);
            assert!(l.pickup_window_end > now);
            assert!(l.delivery_deadline > l.pickup_window_end);
            assert!(l.distance_km > 0.0);
        }
    }
}

// ── Phase order ───────────────────────────────────────────────────────────────

mod phases {
    use super::*;

    #[test]
    fn phases_only_move_forward() {
        use TripPhase::*;
        assert!(Planning.can_advance_to(EnRouteToPickup));
        assert!(Planning.can_advance_to(Loading)); // zero-length pickup leg
        assert!(Loading.can_advance_to(InTransit));
        assert!(InTransit.can_advance_to(Unloading));
        assert!(Unloading.can_advance_to(Completed));
        assert!(!InTransit.can_advance_to(Loading));
        assert!(!Completed.can_advance_to(Cancelled));
        assert!(InTransit.can_advance_to(Cancelled));
    }
}
