//! smallfleet — smallest end-to-end run of the dispatch engine.
//!
//! Seeds a five-truck fleet and eight loads over the city table, then
//! drives the command surface through eight simulated hours: observe,
//! match, move, adapt.  Runs fully offline by default (synthetic routes,
//! rule-based matching); set `GROQ_API_KEY` to use a live advisor and
//! `SMALLFLEET_LIVE_ROUTES=1` to hit the public OSRM instance.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use fleet_advisor::{Advisor, AdvisorResult, ChatAdvisor, FailingAdvisor};
use fleet_core::{Clock, EngineConfig, ManualClock};
use fleet_engine::EngineBuilder;
use fleet_export::{CsvExporter, EventExporter, KpiRow};
use fleet_route::{OsrmClient, RouteResult, RouteSource, SyntheticSource};

// ── Constants ─────────────────────────────────────────────────────────────────

const NUM_VEHICLES: usize = 5;
const NUM_LOADS: usize = 8;
const SEED: u64 = 42;
const TICK_SECS: f64 = 600.0; // 10 simulated minutes per motion tick
const TOTAL_TICKS: u64 = 48; // 8 simulated hours
const START_EPOCH: f64 = 1_700_000_000.0; // fixed reference instant

// ── Pluggable externals ───────────────────────────────────────────────────────

enum DemoRoutes {
    Live(OsrmClient),
    Offline(SyntheticSource),
}

impl RouteSource for DemoRoutes {
    fn fetch(
        &self,
        start: fleet_core::GeoPoint,
        end: fleet_core::GeoPoint,
    ) -> RouteResult<fleet_route::Polyline> {
        match self {
            DemoRoutes::Live(client) => client.fetch(start, end),
            DemoRoutes::Offline(synthetic) => synthetic.fetch(start, end),
        }
    }
}

enum DemoAdvisor {
    Live(ChatAdvisor),
    /// No key configured: every call fails fast and the agents use their
    /// rule-based fallbacks.
    Offline(FailingAdvisor),
}

impl Advisor for DemoAdvisor {
    fn advise(&self, system: &str, user: &str, timeout: Duration) -> AdvisorResult<String> {
        match self {
            DemoAdvisor::Live(client) => client.advise(system, user, timeout),
            DemoAdvisor::Offline(failing) => failing.advise(system, user, timeout),
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    println!("=== smallfleet — adaptive dispatch demo ===");
    println!("Vehicles: {NUM_VEHICLES}  |  Loads: {NUM_LOADS}  |  Seed: {SEED}");
    println!();

    // 1. Configuration: longer motion ticks so progress is visible.
    let mut config = EngineConfig::default();
    config.ticks.motion_secs = TICK_SECS;

    // 2. External integrations, live or offline.
    let routes = if std::env::var("SMALLFLEET_LIVE_ROUTES").is_ok() {
        println!("Routing: live OSRM");
        DemoRoutes::Live(OsrmClient::new(&config.route))
    } else {
        println!("Routing: offline synthetic");
        DemoRoutes::Offline(SyntheticSource)
    };
    let advisor = match std::env::var("GROQ_API_KEY") {
        Ok(key) if !key.is_empty() => {
            println!("Advisor: live ({})", config.advisor.model);
            config.advisor.api_key = Some(key);
            DemoAdvisor::Live(ChatAdvisor::new(&config.advisor))
        }
        _ => {
            println!("Advisor: offline (rule-based fallbacks)");
            DemoAdvisor::Offline(FailingAdvisor)
        }
    };
    println!();

    // 3. Engine over a manual clock: simulated time, reproducible runs.
    let clock = Arc::new(ManualClock::new(START_EPOCH));
    let engine = EngineBuilder::new(config, routes, advisor)
        .clock(clock.clone() as Arc<dyn Clock>)
        .seed(SEED)
        .build();

    // 4. Seed the world.
    let init = engine.initialize(NUM_VEHICLES, NUM_LOADS)?;
    println!("{} ({} vehicles, {} loads)", init.message, init.num_vehicles, init.num_loads);

    // 5. Export sink for the event stream.
    std::fs::create_dir_all("output/smallfleet")?;
    let mut exporter = EventExporter::new(CsvExporter::new(Path::new("output/smallfleet"))?);

    // 6. Drive the cadences by hand: observer every 2 ticks, matcher every
    //    5, adapter every 10, motion every tick.
    for tick in 0..TOTAL_TICKS {
        clock.advance(TICK_SECS);

        if tick % 2 == 0 {
            let (cycle, triggers) = engine.cycle();
            if cycle.loads_posted > 0 || !triggers.is_empty() {
                println!(
                    "[t+{:>3}m] observer: {} new loads, {} triggers",
                    tick * 10,
                    cycle.loads_posted,
                    triggers.len()
                );
            }
        }
        if tick % 5 == 0 {
            let matched = engine.match_loads();
            if matched.matches_created > 0 {
                println!(
                    "[t+{:>3}m] matcher: {} of {} opportunities dispatched",
                    tick * 10,
                    matched.matches_created,
                    matched.opportunities_analyzed
                );
            }
        }

        let moved = engine.simulate_movement();
        if moved.trips_completed > 0 {
            println!("[t+{:>3}m] motion: {} trip(s) completed", tick * 10, moved.trips_completed);
        }

        if tick % 10 == 5 {
            let managed = engine.manage_routes();
            for decision in &managed.decisions {
                println!(
                    "[t+{:>3}m] adapter: {} → {:?}",
                    tick * 10,
                    decision.trip_id,
                    decision.action
                );
            }
        }

        exporter.export_new(&engine.state())?;
    }

    // 7. Final KPI sample and summary.
    let dash = engine.dashboard();
    exporter.export_kpis(&KpiRow {
        timestamp: clock.now(),
        total_vehicles: dash.kpis.total_vehicles as u64,
        idle_vehicles: dash.kpis.idle_vehicles as u64,
        en_route_vehicles: dash.kpis.en_route_vehicles as u64,
        available_loads: dash.kpis.available_loads as u64,
        active_trips: dash.active_trips as u64,
        avg_utilization: dash.kpis.avg_utilization,
        total_km_today: dash.kpis.total_km_today,
    })?;
    exporter.finish()?;

    println!();
    println!("After {TOTAL_TICKS} ticks ({} simulated hours):", TOTAL_TICKS * 10 / 60);
    println!("  active trips     : {}", dash.active_trips);
    println!("  loads available  : {}", dash.kpis.available_loads);
    println!("  loads in transit : {}", dash.kpis.in_transit_loads);
    println!("  fleet km today   : {:.1}", dash.kpis.total_km_today);
    println!("  avg utilization  : {:.1}%", dash.kpis.avg_utilization);
    println!("  revenue per km   : {:.2}", dash.revenue_per_km);

    let cache = engine.routes().stats();
    println!(
        "  route cache      : {} hits / {} misses / {} fallbacks",
        cache.hits, cache.misses, cache.fallbacks
    );
    println!();

    // 8. Per-vehicle table.
    println!("{:<12} {:<18} {:>8} {:>10} {:>8}", "Vehicle", "Status", "Fuel %", "Km today", "Hours");
    println!("{}", "-".repeat(60));
    for vehicle in engine.vehicles(None) {
        println!(
            "{:<12} {:<18} {:>8.1} {:>10.1} {:>8.1}",
            vehicle.id.to_string(),
            format!("{:?}", vehicle.status),
            vehicle.fuel_level_percent,
            vehicle.total_km_today,
            vehicle.hours_remaining,
        );
    }
    println!();
    println!("Event log written to output/smallfleet/event_log.csv");

    Ok(())
}
