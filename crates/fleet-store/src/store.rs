//! `FleetStore` — the single authoritative copy of world state.
//!
//! # Read/write protocol
//!
//! Writes serialize under one `RwLock`; readers take a [`Snapshot`], a
//! point-in-time consistent view that shares entity values via `Arc` (a
//! snapshot is a handful of pointer bumps, not a deep copy).  Mutation is
//! copy-on-write through [`Arc::make_mut`], so entities already handed out
//! in snapshots are never modified in place.
//!
//! # Event ring
//!
//! Events are append-only and bounded: on overflow the oldest is dropped.
//! The store stamps each event with a monotone `seq` and a timestamp
//! clamped non-decreasing, giving the `(timestamp, seq)` total order the
//! rest of the system relies on.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use fleet_core::{LoadId, TripId, VehicleId};

use crate::error::{StoreError, StoreResult};
use crate::event::{Event, EventKind};
use crate::load::{Load, LoadStatus};
use crate::trip::{Trip, TripPhase};
use crate::vehicle::{Vehicle, VehicleStatus};

use serde::{Deserialize, Serialize};

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// A read-only, internally consistent view of the store at an instant.
///
/// Cheap to clone and safe to retain: all entities are immutable behind
/// `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_at: f64,
    pub vehicles: BTreeMap<VehicleId, Arc<Vehicle>>,
    pub loads: BTreeMap<LoadId, Arc<Load>>,
    pub trips: BTreeMap<TripId, Arc<Trip>>,
    /// Tail of the event ring, oldest first.
    pub recent_events: Vec<Arc<Event>>,
}

impl Snapshot {
    pub fn vehicle(&self, id: VehicleId) -> Option<&Arc<Vehicle>> {
        self.vehicles.get(&id)
    }

    pub fn load(&self, id: LoadId) -> Option<&Arc<Load>> {
        self.loads.get(&id)
    }

    pub fn trip(&self, id: TripId) -> Option<&Arc<Trip>> {
        self.trips.get(&id)
    }

    /// Vehicles that can take a new load right now.
    pub fn available_vehicles(&self) -> Vec<&Arc<Vehicle>> {
        self.vehicles.values().filter(|v| v.is_available()).collect()
    }

    /// Loads that are posted, unexpired, and not reserved as a follow-up
    /// by any active trip.
    pub fn available_loads(&self, now: f64) -> Vec<&Arc<Load>> {
        let reserved = self.reserved_followups();
        self.loads
            .values()
            .filter(|l| {
                l.status == LoadStatus::Available
                    && !l.is_expired(now)
                    && !reserved.contains(&l.id)
            })
            .collect()
    }

    /// Trips whose phase is neither completed nor cancelled, in id order.
    pub fn active_trips(&self) -> Vec<&Arc<Trip>> {
        self.trips.values().filter(|t| t.is_active()).collect()
    }

    /// The active trip executing on `vehicle`, if any.
    pub fn trip_for_vehicle(&self, vehicle: VehicleId) -> Option<&Arc<Trip>> {
        self.trips
            .values()
            .find(|t| t.is_active() && t.vehicle_id == vehicle)
    }

    /// Load ids annotated as follow-ups on active trips.  The matcher must
    /// not hand these to another vehicle.
    pub fn reserved_followups(&self) -> BTreeSet<LoadId> {
        self.trips
            .values()
            .filter(|t| t.is_active())
            .filter_map(|t| t.followup_load_id)
            .collect()
    }
}

// ── Store internals ───────────────────────────────────────────────────────────

struct Inner {
    vehicles: BTreeMap<VehicleId, Arc<Vehicle>>,
    loads: BTreeMap<LoadId, Arc<Load>>,
    trips: BTreeMap<TripId, Arc<Trip>>,
    events: VecDeque<Arc<Event>>,
    ring_size: usize,
    next_seq: u64,
    last_event_ts: f64,
    next_trip: u32,
}

impl Inner {
    fn stamp_and_push(&mut self, now: f64, kind: EventKind) -> Arc<Event> {
        self.last_event_ts = self.last_event_ts.max(now);
        let event = Arc::new(Event {
            seq: self.next_seq,
            timestamp: self.last_event_ts,
            kind,
        });
        self.next_seq += 1;
        if self.events.len() == self.ring_size {
            self.events.pop_front();
        }
        self.events.push_back(Arc::clone(&event));
        event
    }

    /// Any active trip already referencing this vehicle or load?
    fn active_trip_conflict(&self, vehicle: VehicleId, load: LoadId) -> Option<&Arc<Trip>> {
        self.trips
            .values()
            .find(|t| t.is_active() && (t.vehicle_id == vehicle || t.load_id == load))
    }
}

// ── FleetStore ────────────────────────────────────────────────────────────────

/// The authoritative in-memory state store.  Share via `Arc`.
pub struct FleetStore {
    inner: RwLock<Inner>,
}

impl FleetStore {
    pub fn new(ring_size: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                vehicles: BTreeMap::new(),
                loads: BTreeMap::new(),
                trips: BTreeMap::new(),
                events: VecDeque::new(),
                ring_size: ring_size.max(1),
                next_seq: 0,
                last_event_ts: 0.0,
                next_trip: 1,
            }),
        }
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Point-in-time consistent view.  Never fails.
    pub fn snapshot(&self, now: f64) -> Snapshot {
        let inner = self.read();
        Snapshot {
            snapshot_at: now,
            vehicles: inner.vehicles.clone(),
            loads: inner.loads.clone(),
            trips: inner.trips.clone(),
            recent_events: inner.events.iter().cloned().collect(),
        }
    }

    // ── Event writes ──────────────────────────────────────────────────────

    /// Stamp and append events; returns them as stored.
    pub fn apply_events(&self, now: f64, kinds: Vec<EventKind>) -> Vec<Arc<Event>> {
        let mut inner = self.write();
        kinds
            .into_iter()
            .map(|k| inner.stamp_and_push(now, k))
            .collect()
    }

    // ── Entity inserts ────────────────────────────────────────────────────

    pub fn insert_vehicle(&self, vehicle: Vehicle) -> StoreResult<()> {
        let mut inner = self.write();
        if inner.vehicles.contains_key(&vehicle.id) {
            return Err(StoreError::Conflict(format!("{} already exists", vehicle.id)));
        }
        inner.vehicles.insert(vehicle.id, Arc::new(vehicle));
        Ok(())
    }

    pub fn insert_load(&self, load: Load) -> StoreResult<()> {
        let mut inner = self.write();
        if inner.loads.contains_key(&load.id) {
            return Err(StoreError::Conflict(format!("{} already exists", load.id)));
        }
        inner.loads.insert(load.id, Arc::new(load));
        Ok(())
    }

    // ── Entity mutators ───────────────────────────────────────────────────

    pub fn update_vehicle(
        &self,
        id: VehicleId,
        mutate: impl FnOnce(&mut Vehicle),
    ) -> StoreResult<()> {
        let mut inner = self.write();
        let slot = inner
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        mutate(Arc::make_mut(slot));
        Ok(())
    }

    pub fn update_load(&self, id: LoadId, mutate: impl FnOnce(&mut Load)) -> StoreResult<()> {
        let mut inner = self.write();
        let slot = inner
            .loads
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        mutate(Arc::make_mut(slot));
        Ok(())
    }

    pub fn update_trip(&self, id: TripId, mutate: impl FnOnce(&mut Trip)) -> StoreResult<()> {
        let mut inner = self.write();
        let slot = inner
            .trips
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        mutate(Arc::make_mut(slot));
        Ok(())
    }

    /// Move a load along its lifecycle, enforcing monotone transitions.
    ///
    /// The assignment field is cleared when the load leaves the
    /// matched/in-transit pair of states.
    pub fn transition_load(&self, id: LoadId, to: LoadStatus) -> StoreResult<()> {
        let mut inner = self.write();
        let slot = inner
            .loads
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !slot.status.can_transition(to) {
            return Err(StoreError::Conflict(format!(
                "{id}: illegal transition {:?} → {to:?}",
                slot.status
            )));
        }
        let load = Arc::make_mut(slot);
        load.status = to;
        if !matches!(to, LoadStatus::Matched | LoadStatus::InTransit) {
            load.assigned_vehicle_id = None;
        }
        Ok(())
    }

    // ── Trips ─────────────────────────────────────────────────────────────

    /// Reserve the next trip id.
    pub fn allocate_trip_id(&self) -> TripId {
        let mut inner = self.write();
        let id = TripId(inner.next_trip);
        inner.next_trip += 1;
        id
    }

    /// Insert a trip.  Conflict if its id is taken or its vehicle or load
    /// is already referenced by another active trip.
    pub fn insert_trip(&self, trip: Trip) -> StoreResult<()> {
        let mut inner = self.write();
        if inner.trips.contains_key(&trip.id) {
            return Err(StoreError::Conflict(format!("{} already exists", trip.id)));
        }
        if let Some(existing) = inner.active_trip_conflict(trip.vehicle_id, trip.load_id) {
            return Err(StoreError::Conflict(format!(
                "{} or {} already active on {}",
                trip.vehicle_id, trip.load_id, existing.id
            )));
        }
        inner.trips.insert(trip.id, Arc::new(trip));
        Ok(())
    }

    /// Remove a trip (completion or cancellation), returning it.
    pub fn remove_trip(&self, id: TripId) -> StoreResult<Arc<Trip>> {
        let mut inner = self.write();
        inner
            .trips
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    // ── Composite writes ──────────────────────────────────────────────────

    /// Atomically commit one matcher decision: insert the trip, mark the
    /// load matched, put the vehicle on the road, and emit the
    /// `load_matched` / `trip_started` pair.  Either everything applies or
    /// nothing does.
    pub fn commit_match(&self, trip: Trip, now: f64) -> StoreResult<TripId> {
        let mut inner = self.write();

        let vehicle = inner
            .vehicles
            .get(&trip.vehicle_id)
            .ok_or_else(|| StoreError::NotFound(trip.vehicle_id.to_string()))?;
        let load = inner
            .loads
            .get(&trip.load_id)
            .ok_or_else(|| StoreError::NotFound(trip.load_id.to_string()))?;

        if vehicle.status != VehicleStatus::Idle {
            return Err(StoreError::Conflict(format!(
                "{} is {:?}, not idle",
                trip.vehicle_id, vehicle.status
            )));
        }
        if load.status != LoadStatus::Available {
            return Err(StoreError::Conflict(format!(
                "{} is {:?}, not available",
                trip.load_id, load.status
            )));
        }
        if load.weight_tons > vehicle.capacity_tons {
            return Err(StoreError::Conflict(format!(
                "{} ({} t) exceeds {} capacity ({} t)",
                trip.load_id, load.weight_tons, trip.vehicle_id, vehicle.capacity_tons
            )));
        }
        if let Some(existing) = inner.active_trip_conflict(trip.vehicle_id, trip.load_id) {
            return Err(StoreError::Conflict(format!(
                "{} or {} already active on {}",
                trip.vehicle_id, trip.load_id, existing.id
            )));
        }

        let trip_id = trip.id;
        let vehicle_id = trip.vehicle_id;
        let load_id = trip.load_id;
        // Zero-length pickup leg means the truck is already at the origin.
        let next_status = if trip.pickup_leg_km > 0.0 {
            VehicleStatus::EnRouteEmpty
        } else {
            VehicleStatus::EnRouteLoaded
        };

        inner.trips.insert(trip_id, Arc::new(trip));

        if let Some(slot) = inner.loads.get_mut(&load_id) {
            let load = Arc::make_mut(slot);
            load.status = LoadStatus::Matched;
            load.assigned_vehicle_id = Some(vehicle_id);
        }
        if let Some(slot) = inner.vehicles.get_mut(&vehicle_id) {
            let vehicle = Arc::make_mut(slot);
            vehicle.status = next_status;
            vehicle.last_activity_at = now;
        }

        inner.stamp_and_push(now, EventKind::LoadMatched { load_id, vehicle_id });
        inner.stamp_and_push(now, EventKind::TripStarted { trip_id, vehicle_id, load_id });

        Ok(trip_id)
    }

    /// Cancel a load that no longer needs transport.
    ///
    /// Allowed from `available` (simple status flip) and from `matched`
    /// (the trip is cancelled and the vehicle returns to idle at its
    /// current position).  A load already on the truck cannot be
    /// cancelled.
    pub fn cancel_load(&self, id: LoadId, now: f64) -> StoreResult<()> {
        let mut inner = self.write();

        let load = inner
            .loads
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !load.status.can_transition(LoadStatus::Cancelled) {
            return Err(StoreError::Conflict(format!(
                "{id}: cannot cancel a {:?} load",
                load.status
            )));
        }

        let trip_id = inner
            .trips
            .values()
            .find(|t| t.is_active() && t.load_id == id)
            .map(|t| t.id);

        // The trip dies with its load; the vehicle stays where it is.
        if let Some(trip_id) = trip_id {
            if let Some(mut trip) = inner.trips.remove(&trip_id) {
                let trip = Arc::make_mut(&mut trip);
                trip.phase = TripPhase::Cancelled;
                trip.completed_at = Some(now);
                trip.followup_load_id = None;
                let vehicle_id = trip.vehicle_id;
                if let Some(slot) = inner.vehicles.get_mut(&vehicle_id) {
                    let vehicle = Arc::make_mut(slot);
                    vehicle.status = VehicleStatus::Idle;
                    vehicle.current_load_tons = 0.0;
                    vehicle.last_activity_at = now;
                }
            }
        }

        if let Some(slot) = inner.loads.get_mut(&id) {
            let load = Arc::make_mut(slot);
            load.status = LoadStatus::Cancelled;
            load.assigned_vehicle_id = None;
        }

        Ok(())
    }

    // ── Counters ──────────────────────────────────────────────────────────

    pub fn vehicle_count(&self) -> usize {
        self.read().vehicles.len()
    }

    pub fn load_count(&self) -> usize {
        self.read().loads.len()
    }

    pub fn event_count(&self) -> usize {
        self.read().events.len()
    }

    // ── Lock helpers ──────────────────────────────────────────────────────

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
