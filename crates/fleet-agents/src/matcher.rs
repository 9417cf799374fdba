//! The matcher: pair idle vehicles with available loads.
//!
//! Enumerate feasible pairs, score them, ask the advisor to rank the top
//! slice, parse its answer against the documented line grammar, enforce
//! one-trip-per-vehicle-and-load, and commit each survivor atomically.
//! Advisor trouble (error, timeout, empty text) degrades to a rule that
//! approves only pairs meeting both quantitative targets.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use fleet_advisor::{parse_match_pairs, Advisor};
use fleet_core::config::MatcherConfig;
use fleet_core::{LoadId, TripId, VehicleId};
use fleet_route::{RouteCache, RouteSource};
use fleet_store::{FleetStore, Load, Snapshot, Trip, TripPhase, Vehicle, VehicleStatus};
use serde::Serialize;

// ── Feasibility record ────────────────────────────────────────────────────────

/// Financial and operational metrics for one candidate pairing.
#[derive(Clone, Debug, Serialize)]
pub struct PairMetrics {
    pub vehicle_id: VehicleId,
    pub load_id: LoadId,
    pub pickup_km: f64,
    pub loaded_km: f64,
    pub total_km: f64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub profit_margin: f64,
    /// loaded / total distance.
    pub utilization: f64,
    pub est_hours: f64,
}

impl PairMetrics {
    fn compute(vehicle: &Vehicle, load: &Load, config: &MatcherConfig) -> Self {
        let pickup_km = vehicle.current_location.distance_km(&load.origin);
        let loaded_km = load.distance_km;
        let total_km = pickup_km + loaded_km;

        let revenue = load.total_revenue();
        let est_hours = total_km / config.assumed_speed_kmh;
        let cost = total_km * config.cost_per_km + est_hours * config.driver_cost_per_hour;
        let profit = revenue - cost;

        Self {
            vehicle_id: vehicle.id,
            load_id: load.id,
            pickup_km,
            loaded_km,
            total_km,
            revenue,
            cost,
            profit,
            profit_margin: if revenue > 0.0 { profit / revenue } else { 0.0 },
            utilization: if total_km > 0.0 { loaded_km / total_km } else { 0.0 },
            est_hours,
        }
    }

    /// Does this pair meet both quantitative targets on its own?
    fn meets_targets(&self, config: &MatcherConfig) -> bool {
        self.profit_margin >= config.profit_margin_min && self.utilization >= config.utilization_min
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// What one matcher run did.
#[derive(Debug, Default)]
pub struct MatchReport {
    pub opportunities_analyzed: usize,
    /// Pairs the advisor (or the fallback rule) approved, pre-uniqueness.
    pub approved: Vec<(VehicleId, LoadId)>,
    /// Trips actually committed to the store.
    pub trips_created: Vec<TripId>,
    pub reasoning: String,
    pub used_fallback: bool,
}

impl MatchReport {
    pub fn matches_created(&self) -> usize {
        self.trips_created.len()
    }
}

// ── MatcherAgent ──────────────────────────────────────────────────────────────

pub struct MatcherAgent<A: Advisor> {
    advisor: Arc<A>,
    config: MatcherConfig,
}

impl<A: Advisor> MatcherAgent<A> {
    pub fn new(advisor: Arc<A>, config: MatcherConfig) -> Self {
        Self { advisor, config }
    }

    /// One matching round: at most one new trip per idle vehicle and per
    /// available load.
    pub fn run<S: RouteSource>(
        &self,
        store: &FleetStore,
        routes: &RouteCache<S>,
        now: f64,
    ) -> MatchReport {
        let snapshot = store.snapshot(now);
        let pairs = self.enumerate(&snapshot, now);

        let mut report = MatchReport {
            opportunities_analyzed: pairs.len(),
            ..MatchReport::default()
        };
        if pairs.is_empty() {
            report.reasoning = "no matching opportunities available".to_owned();
            return report;
        }

        // Descending profit margin; the advisor sees only the top K.
        let mut ranked = pairs;
        ranked.sort_by(|a, b| {
            b.profit_margin
                .partial_cmp(&a.profit_margin)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.vehicle_id.cmp(&b.vehicle_id))
                .then(a.load_id.cmp(&b.load_id))
        });
        let shortlist = &ranked[..ranked.len().min(self.config.top_k)];

        let approved = match self.solicit(shortlist, &snapshot) {
            Ok(text) if !text.trim().is_empty() => {
                let parsed = parse_match_pairs(&text);
                report.reasoning = text;
                parsed.pairs
            }
            Ok(_) => {
                report.reasoning = "advisor returned empty text; rule-based fallback".to_owned();
                report.used_fallback = true;
                self.fallback(&ranked)
            }
            Err(e) => {
                tracing::warn!(error = %e, "advisor unavailable, rule-based fallback");
                report.reasoning = format!("advisor unavailable ({e}); rule-based fallback");
                report.used_fallback = true;
                self.fallback(&ranked)
            }
        };
        report.approved.clone_from(&approved);

        // Uniqueness pass + commit.  Approved pairs must exist in the
        // enumerated set — the advisor cannot invent feasibility.
        let by_pair: HashMap<(VehicleId, LoadId), &PairMetrics> =
            ranked.iter().map(|m| ((m.vehicle_id, m.load_id), m)).collect();
        let mut used_vehicles = Vec::new();
        let mut used_loads = Vec::new();

        for (vehicle_id, load_id) in approved {
            if used_vehicles.contains(&vehicle_id) || used_loads.contains(&load_id) {
                continue;
            }
            let Some(metrics) = by_pair.get(&(vehicle_id, load_id)) else {
                tracing::debug!(%vehicle_id, %load_id, "approved pair not in feasible set, skipped");
                continue;
            };
            match self.instantiate(store, routes, &snapshot, metrics, now) {
                Ok(trip_id) => {
                    used_vehicles.push(vehicle_id);
                    used_loads.push(load_id);
                    report.trips_created.push(trip_id);
                }
                Err(e) => {
                    // Raced with another writer; skip the pair, keep going.
                    tracing::debug!(%vehicle_id, %load_id, error = %e, "match commit skipped");
                }
            }
        }
        report
    }

    // ── Enumeration ───────────────────────────────────────────────────────

    fn enumerate(&self, snapshot: &Snapshot, now: f64) -> Vec<PairMetrics> {
        // The feasibility gate is idleness alone; a low tank or thin hours
        // shows up in the metrics the advisor weighs, not as a hard filter.
        let vehicles: Vec<&Arc<Vehicle>> = snapshot
            .vehicles
            .values()
            .filter(|v| v.status == VehicleStatus::Idle)
            .collect();
        let loads = snapshot.available_loads(now);

        let candidates: Vec<(&Arc<Vehicle>, &Arc<Load>)> = vehicles
            .iter()
            .flat_map(|v| loads.iter().map(move |l| (*v, *l)))
            .filter(|(v, l)| l.weight_tons <= v.capacity_tons && now <= l.pickup_window_end)
            .collect();

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            candidates
                .par_iter()
                .map(|(v, l)| PairMetrics::compute(v, l, &self.config))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            candidates
                .iter()
                .map(|(v, l)| PairMetrics::compute(v, l, &self.config))
                .collect()
        }
    }

    // ── Advisor round ─────────────────────────────────────────────────────

    fn solicit(
        &self,
        shortlist: &[PairMetrics],
        snapshot: &Snapshot,
    ) -> fleet_advisor::AdvisorResult<String> {
        let system = build_system_prompt(&self.config);
        let user = build_user_prompt(shortlist, snapshot, &self.config);
        self.advisor.advise(
            &system,
            &user,
            Duration::from_secs_f64(self.config.advisor_timeout_secs),
        )
    }

    /// Rule-based stand-in for the advisor: the best pairs that meet both
    /// targets outright, capped at the configured fan-out.
    fn fallback(&self, ranked: &[PairMetrics]) -> Vec<(VehicleId, LoadId)> {
        ranked
            .iter()
            .filter(|m| m.meets_targets(&self.config))
            .take(self.config.fallback_fanout)
            .map(|m| (m.vehicle_id, m.load_id))
            .collect()
    }

    // ── Trip instantiation ────────────────────────────────────────────────

    /// Fetch both legs, build the trip, and commit it atomically.
    fn instantiate<S: RouteSource>(
        &self,
        store: &FleetStore,
        routes: &RouteCache<S>,
        snapshot: &Snapshot,
        metrics: &PairMetrics,
        now: f64,
    ) -> Result<TripId, String> {
        let vehicle = snapshot
            .vehicle(metrics.vehicle_id)
            .ok_or_else(|| format!("{} vanished", metrics.vehicle_id))?;
        let load = snapshot
            .load(metrics.load_id)
            .ok_or_else(|| format!("{} vanished", metrics.load_id))?;

        let start = vehicle.current_location.point();
        let origin = load.origin.point();
        let destination = load.destination.point();

        let loaded_leg = routes.route(origin, destination);
        let (path, pickup_km) = if metrics.pickup_km <= 0.0 {
            ((*loaded_leg).clone(), 0.0)
        } else {
            let pickup_leg = routes.route(start, origin);
            let pickup_km = pickup_leg.total_km;
            ((*pickup_leg).clone().then((*loaded_leg).clone()), pickup_km)
        };
        let loaded_km = loaded_leg.total_km;

        let trip = Trip {
            id: store.allocate_trip_id(),
            vehicle_id: metrics.vehicle_id,
            load_id: metrics.load_id,
            phase: TripPhase::Planning,
            route: Some(Arc::new(path)),
            progress_pct: 0.0,
            route_base_pct: 0.0,
            pickup_leg_km: pickup_km,
            loaded_leg_km: loaded_km,
            estimated_revenue: metrics.revenue,
            estimated_cost: metrics.cost,
            estimated_profit: metrics.profit,
            delay_minutes: 0.0,
            followup_load_id: None,
            ticks: 0,
            started_at: now,
            completed_at: None,
        };

        store.commit_match(trip, now).map_err(|e| e.to_string())
    }
}

// ── Prompt construction (pure, unit-testable) ─────────────────────────────────

fn build_system_prompt(config: &MatcherConfig) -> String {
    format!(
        "You are an expert logistics dispatcher managing a fleet of trucks.\n\
         \n\
         Your goal is to maximize:\n\
         1. Profitability (profit margin > {:.0}%)\n\
         2. Fleet utilization (loaded km / total km > {:.0}%)\n\
         3. Minimize empty repositioning (pickup distance should be reasonable)\n\
         4. Meet delivery deadlines\n\
         \n\
         CRITICAL RULES:\n\
         - Each vehicle can only be matched to ONE load\n\
         - Each load can only be matched to ONE vehicle\n\
         - Prioritize profitability but balance with utilization",
        config.profit_margin_min * 100.0,
        config.utilization_min * 100.0,
    )
}

fn build_user_prompt(
    shortlist: &[PairMetrics],
    snapshot: &Snapshot,
    config: &MatcherConfig,
) -> String {
    let mut text = format!("MATCHING OPPORTUNITIES (top {}):\n\n", shortlist.len());
    for (i, m) in shortlist.iter().enumerate() {
        let _ = writeln!(
            text,
            "Opportunity {}:\n  Vehicle: {}\n  Load: {} ({:.0} km loaded, {:.0} km pickup leg)\n  \
             Metrics: profit {:.0} (margin {:.0}%), utilization {:.0}%, {:.1} h",
            i + 1,
            m.vehicle_id,
            m.load_id,
            m.loaded_km,
            m.pickup_km,
            m.profit,
            m.profit_margin * 100.0,
            m.utilization * 100.0,
            m.est_hours,
        );
    }
    let _ = write!(
        text,
        "\nFleet: {} vehicles, {} idle\n\
         \n\
         TASK: Select the BEST matches meeting margin ≥ {:.0}% and utilization ≥ {:.0}%.\n\
         \n\
         Respond EXACTLY like this:\n\
         \n\
         APPROVED MATCHES:\n\
         - Vehicle truck_001 → Load load_003: [one sentence why]\n\
         \n\
         REASONING:\n\
         [2-3 sentences on strategy]\n\
         \n\
         If no good matches: say \"APPROVED MATCHES: None\" and explain why.",
        snapshot.vehicles.len(),
        snapshot
            .vehicles
            .values()
            .filter(|v| v.status == VehicleStatus::Idle)
            .count(),
        config.profit_margin_min * 100.0,
        config.utilization_min * 100.0,
    );
    text
}
