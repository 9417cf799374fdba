//! The adapter: amend trips already on the road.
//!
//! For each in-flight trip it assembles a disturbance picture from recent
//! events, searches for profitable loads near the destination, asks the
//! advisor to choose among `CONTINUE`, `ADJUST_ROUTE`, and
//! `FOLLOW_UP_LOAD`, and applies the decision.  Every failure path
//! defaults to `CONTINUE` — a trip is never left in an inconsistent
//! phase.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use fleet_advisor::{parse_decision, Advisor, Decision};
use fleet_core::config::{AdapterConfig, MatcherConfig};
use fleet_core::{LoadId, TripId, VehicleId};
use fleet_store::{EventKind, FleetStore, Snapshot, Trip, TripPhase};
use serde::Serialize;

// ── Situation & opportunities ─────────────────────────────────────────────────

/// Disturbances observed for one vehicle since its events entered the ring.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Situation {
    pub traffic_delay_minutes: f64,
    pub fuel_low: bool,
    pub hours_low: bool,
}

/// A candidate follow-up load near the current destination.
#[derive(Clone, Debug, Serialize)]
pub struct Opportunity {
    pub load_id: LoadId,
    /// Destination → new origin, km.
    pub detour_km: f64,
    pub loaded_km: f64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub profit_margin: f64,
}

/// What the adapter decided for one trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdapterAction {
    Continue,
    AdjustRoute,
    FollowUpLoad { load_id: LoadId },
}

#[derive(Clone, Debug, Serialize)]
pub struct TripDecision {
    pub trip_id: TripId,
    pub vehicle_id: VehicleId,
    pub action: AdapterAction,
    pub delay_minutes: f64,
    pub opportunities_found: usize,
    pub reasoning: String,
    pub used_fallback: bool,
}

// ── AdapterAgent ──────────────────────────────────────────────────────────────

pub struct AdapterAgent<A: Advisor> {
    advisor: Arc<A>,
    config: AdapterConfig,
    /// Cost coefficients shared with the matcher's pricing model.
    economics: MatcherConfig,
}

impl<A: Advisor> AdapterAgent<A> {
    pub fn new(advisor: Arc<A>, config: AdapterConfig, economics: MatcherConfig) -> Self {
        Self { advisor, config, economics }
    }

    /// One adaptation round over every trip in a driving phase.
    pub fn run(&self, store: &FleetStore, now: f64) -> Vec<TripDecision> {
        let snapshot = store.snapshot(now);
        let in_flight: Vec<&Arc<Trip>> = snapshot
            .active_trips()
            .into_iter()
            .filter(|t| {
                matches!(t.phase, TripPhase::EnRouteToPickup | TripPhase::InTransit)
            })
            .collect();

        in_flight
            .into_iter()
            .map(|trip| self.decide_trip(store, &snapshot, trip, now))
            .collect()
    }

    fn decide_trip(
        &self,
        store: &FleetStore,
        snapshot: &Snapshot,
        trip: &Trip,
        now: f64,
    ) -> TripDecision {
        let situation = self.situation_for(snapshot, trip);
        let opportunities = self.opportunities_for(snapshot, trip, now);

        let mut decision = TripDecision {
            trip_id: trip.id,
            vehicle_id: trip.vehicle_id,
            action: AdapterAction::Continue,
            delay_minutes: situation.traffic_delay_minutes,
            opportunities_found: opportunities.len(),
            reasoning: String::new(),
            used_fallback: false,
        };

        let advised = self
            .solicit(snapshot, trip, &situation, &opportunities)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                let parsed = parse_decision(&text).map_err(|f| format!("{f:?}"));
                decision.reasoning = text;
                parsed
            });

        let chosen = match advised {
            Ok(d) => d,
            Err(why) => {
                tracing::debug!(trip = %trip.id, %why, "advisor decision unusable, rule fallback");
                decision.used_fallback = true;
                if decision.reasoning.is_empty() {
                    decision.reasoning = format!("rule-based fallback ({why})");
                }
                self.fallback_rule(&situation, &opportunities)
            }
        };

        decision.action = self.apply(store, snapshot, trip, chosen, &situation, &opportunities);
        decision
    }

    // ── Situation & opportunity assembly ──────────────────────────────────

    /// Sum of traffic delays plus condition flags for the trip's vehicle.
    fn situation_for(&self, snapshot: &Snapshot, trip: &Trip) -> Situation {
        let mut situation = Situation::default();
        for event in &snapshot.recent_events {
            if let EventKind::TrafficAlert { vehicle_id, delay_minutes, .. } = &event.kind {
                if *vehicle_id == trip.vehicle_id {
                    situation.traffic_delay_minutes += delay_minutes;
                }
            }
        }
        if let Some(vehicle) = snapshot.vehicle(trip.vehicle_id) {
            situation.fuel_low = vehicle.fuel_level_percent < 20.0;
            situation.hours_low = vehicle.hours_remaining < 2.0;
        }
        situation
    }

    /// Positive-profit loads whose origin is within the detour budget of
    /// the current destination, best first, capped at top M.
    fn opportunities_for(&self, snapshot: &Snapshot, trip: &Trip, now: f64) -> Vec<Opportunity> {
        let Some(current_load) = snapshot.load(trip.load_id) else {
            return vec![];
        };
        let vehicle_capacity = snapshot
            .vehicle(trip.vehicle_id)
            .map(|v| v.capacity_tons)
            .unwrap_or(0.0);

        let mut opportunities: Vec<Opportunity> = snapshot
            .available_loads(now)
            .into_iter()
            .filter(|l| l.id != trip.load_id && l.weight_tons <= vehicle_capacity)
            .filter_map(|l| {
                let detour_km = current_load.destination.distance_km(&l.origin);
                if detour_km > self.config.detour_budget_km {
                    return None;
                }
                let revenue = l.total_revenue();
                let cost = (detour_km + l.distance_km) * self.economics.cost_per_km;
                let profit = revenue - cost;
                (profit > 0.0).then(|| Opportunity {
                    load_id: l.id,
                    detour_km,
                    loaded_km: l.distance_km,
                    revenue,
                    cost,
                    profit,
                    profit_margin: if revenue > 0.0 { profit / revenue } else { 0.0 },
                })
            })
            .collect();

        opportunities.sort_by(|a, b| {
            b.profit
                .partial_cmp(&a.profit)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.load_id.cmp(&b.load_id))
        });
        opportunities.truncate(self.config.top_m);
        opportunities
    }

    // ── Advisor round ─────────────────────────────────────────────────────

    fn solicit(
        &self,
        snapshot: &Snapshot,
        trip: &Trip,
        situation: &Situation,
        opportunities: &[Opportunity],
    ) -> fleet_advisor::AdvisorResult<String> {
        let system = SYSTEM_PROMPT;
        let user = build_user_prompt(snapshot, trip, situation, opportunities);
        self.advisor.advise(
            system,
            &user,
            Duration::from_secs_f64(self.config.advisor_timeout_secs),
        )
    }

    /// Rule when the advisor cannot be consulted: chase the top
    /// opportunity only under heavy delay and a fat margin; otherwise
    /// adjust for any delay at all; otherwise stay the course.
    fn fallback_rule(&self, situation: &Situation, opportunities: &[Opportunity]) -> Decision {
        let top_is_worth_it = opportunities
            .first()
            .is_some_and(|o| o.profit_margin >= self.config.followup_margin_min);
        if situation.traffic_delay_minutes >= self.config.delay_threshold_minutes && top_is_worth_it
        {
            Decision::FollowUpLoad {
                load_id: opportunities.first().map(|o| o.load_id),
            }
        } else if situation.traffic_delay_minutes > 0.0 {
            Decision::AdjustRoute
        } else {
            Decision::Continue
        }
    }

    // ── Application ───────────────────────────────────────────────────────

    fn apply(
        &self,
        store: &FleetStore,
        snapshot: &Snapshot,
        trip: &Trip,
        chosen: Decision,
        situation: &Situation,
        opportunities: &[Opportunity],
    ) -> AdapterAction {
        match chosen {
            Decision::Continue => AdapterAction::Continue,

            Decision::AdjustRoute => {
                let delay = situation.traffic_delay_minutes;
                let applied = store.update_trip(trip.id, |t| {
                    // Re-scanning the ring next round must not double-count
                    // the same alerts, so the accumulator is a high-water
                    // mark, not a running sum.
                    t.delay_minutes = t.delay_minutes.max(delay);
                    t.route = None;
                });
                match applied {
                    Ok(()) => AdapterAction::AdjustRoute,
                    Err(e) => {
                        tracing::warn!(trip = %trip.id, error = %e, "adjust failed, continuing");
                        AdapterAction::Continue
                    }
                }
            }

            Decision::FollowUpLoad { load_id } => {
                // An unnamed follow-up means "take the best one".  The
                // advisor cannot pick a load outside the vetted list (that
                // list already excludes reserved and expired loads).
                let chosen_id = load_id.or_else(|| opportunities.first().map(|o| o.load_id));
                let valid = chosen_id
                    .filter(|id| opportunities.iter().any(|o| o.load_id == *id))
                    .filter(|id| !snapshot.reserved_followups().contains(id));
                match valid {
                    Some(id) => {
                        let applied = store.update_trip(trip.id, |t| {
                            t.followup_load_id = Some(id);
                        });
                        match applied {
                            Ok(()) => AdapterAction::FollowUpLoad { load_id: id },
                            Err(e) => {
                                tracing::warn!(trip = %trip.id, error = %e, "follow-up failed");
                                AdapterAction::Continue
                            }
                        }
                    }
                    None => AdapterAction::Continue,
                }
            }
        }
    }
}

// ── Prompts (pure, unit-testable) ─────────────────────────────────────────────

const SYSTEM_PROMPT: &str = "\
You are an expert logistics operations manager making real-time decisions \
for trucks already on the road.

Your goals, in order:
1. Ensure current delivery commitments are met
2. Minimize delays and customer impact
3. Maximize fleet utilization
4. Seize profitable new opportunities when feasible
5. Respect driver constraints (hours, fuel)";

fn build_user_prompt(
    snapshot: &Snapshot,
    trip: &Trip,
    situation: &Situation,
    opportunities: &[Opportunity],
) -> String {
    let route = snapshot
        .load(trip.load_id)
        .map(|l| format!("{} → {}", l.origin.label(), l.destination.label()))
        .unwrap_or_default();

    let mut text = format!(
        "TRUCK IN MOTION - REAL-TIME DECISION NEEDED\n\n\
         Current trip:\n  Vehicle: {}\n  Load: {} ({route})\n  Phase: {:?}\n  Progress: {:.0}%\n",
        trip.vehicle_id, trip.load_id, trip.phase, trip.progress_pct,
    );

    if situation.traffic_delay_minutes > 0.0 {
        let _ = writeln!(
            text,
            "  Traffic delay reported: {:.0} minutes",
            situation.traffic_delay_minutes
        );
    }
    if situation.fuel_low {
        text.push_str("  ALERT: fuel is low\n");
    }
    if situation.hours_low {
        text.push_str("  ALERT: driver hours nearly exhausted\n");
    }

    if opportunities.is_empty() {
        text.push_str("\nNo new load opportunities nearby.\n");
    } else {
        let _ = writeln!(text, "\nNEW LOAD OPPORTUNITIES ({}):", opportunities.len());
        for (i, o) in opportunities.iter().enumerate() {
            let _ = writeln!(
                text,
                "  Opportunity {}: {} — detour {:.0} km, delivery {:.0} km, \
                 profit {:.0} (margin {:.1}%)",
                i + 1,
                o.load_id,
                o.detour_km,
                o.loaded_km,
                o.profit,
                o.profit_margin * 100.0,
            );
        }
    }

    text.push_str(
        "\nRespond in this format:\n\n\
         DECISION: [CONTINUE / ADJUST_ROUTE / FOLLOW_UP_LOAD]\n\n\
         IF FOLLOW_UP_LOAD:\n  Selected Load: [load_id]\n\n\
         REASONING:\n  [your analysis]\n",
    );
    text
}
