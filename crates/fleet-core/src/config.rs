//! Engine configuration.
//!
//! One nested struct, loaded once at startup (from JSON, or built in code
//! by tests and the demo) and read-only afterwards.  Every field has the
//! default named in the external-interface contract, so `EngineConfig::
//! default()` is a fully working configuration.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.  Read-only after startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ticks: TickPeriods,
    pub motion: MotionConfig,
    pub observer: ObserverConfig,
    pub matcher: MatcherConfig,
    pub adapter: AdapterConfig,
    pub predictor: PredictorConfig,
    pub route: RouteConfig,
    pub advisor: AdvisorConfig,
    pub events: EventsConfig,
}

// ── Scheduler cadences ────────────────────────────────────────────────────────

/// Periods of the four scheduler tasks, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickPeriods {
    pub motion_secs: f64,
    pub observer_secs: f64,
    pub matcher_secs: f64,
    pub adapter_secs: f64,
}

impl Default for TickPeriods {
    fn default() -> Self {
        Self {
            motion_secs: 3.0,
            observer_secs: 10.0,
            matcher_secs: 30.0,
            adapter_secs: 30.0,
        }
    }
}

// ── Motion ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Simulated cruising speed, km/h.
    pub speed_kmh: f64,
    /// Fuel burned per 10 km while carrying cargo, in percent of tank.
    pub fuel_pct_per_10km_loaded: f64,
    /// Fuel burned per 10 km while empty, in percent of tank.
    pub fuel_pct_per_10km_empty: f64,
    /// Emit a position event every Nth tick per trip (phase boundaries
    /// always emit).
    pub position_event_every: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed_kmh: 60.0,
            fuel_pct_per_10km_loaded: 0.4,
            fuel_pct_per_10km_empty: 0.3,
            position_event_every: 5,
        }
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Idle minutes before an `idle_timeout` trigger fires.
    pub idle_timeout_minutes: f64,
    /// Trip progress (percent) at which `near_delivery` fires.
    pub near_delivery_progress: f64,
    /// Offered rate per km above which a new load is high-priority.
    pub high_priority_rate: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 30.0,
            near_delivery_progress: 90.0,
            high_priority_rate: 70.0,
        }
    }
}

// ── Matcher ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Feasible pairs submitted to the advisor, descending profit margin.
    pub top_k: usize,
    /// Max pairs the rule-based fallback may commit.
    pub fallback_fanout: usize,
    /// Quantitative target: minimum profit margin (fraction).
    pub profit_margin_min: f64,
    /// Quantitative target: minimum utilization (fraction).
    pub utilization_min: f64,
    /// Operating cost per kilometre (fuel, wear).
    pub cost_per_km: f64,
    /// Driver cost per hour.
    pub driver_cost_per_hour: f64,
    /// Speed assumed when estimating trip hours, km/h.
    pub assumed_speed_kmh: f64,
    /// Advisor call deadline for a matching round, seconds.
    pub advisor_timeout_secs: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            fallback_fanout: 3,
            profit_margin_min: 0.12,
            utilization_min: 0.85,
            cost_per_km: 2.5,
            driver_cost_per_hour: 15.0,
            assumed_speed_kmh: 60.0,
            advisor_timeout_secs: 15.0,
        }
    }
}

// ── Adapter ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Max great-circle detour from the current destination to a new
    /// load's origin, km.
    pub detour_budget_km: f64,
    /// Opportunities submitted to the advisor, descending profit.
    pub top_m: usize,
    /// Fallback rule: minimum profit margin to chase a follow-up load.
    pub followup_margin_min: f64,
    /// Fallback rule: accumulated delay that justifies a follow-up, minutes.
    pub delay_threshold_minutes: f64,
    /// Advisor call deadline for a route decision, seconds.
    pub advisor_timeout_secs: f64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            detour_budget_km: 100.0,
            top_m: 5,
            followup_margin_min: 0.20,
            delay_threshold_minutes: 60.0,
            advisor_timeout_secs: 20.0,
        }
    }
}

// ── Predictor ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Weight applied to accumulated traffic delay when shifting ETAs.
    pub traffic_weight: f64,
    /// Fuel-at-arrival percentage below which a refuel advisory fires.
    pub fuel_low_threshold_pct: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            traffic_weight: 1.0,
            fuel_low_threshold_pct: 10.0,
        }
    }
}

// ── Route cache & client ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Routing service base URL.
    pub base_url: String,
    /// Per-attempt deadline, seconds.
    pub timeout_secs: f64,
    /// Total budget across the attempt and its single retry, seconds.
    pub budget_secs: f64,
    /// Max cached polylines before LRU eviction.
    pub cache_size: usize,
    /// Cache entry lifetime, seconds.
    pub cache_ttl_secs: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org/route/v1/driving".to_owned(),
            timeout_secs: 15.0,
            budget_secs: 20.0,
            cache_size: 1024,
            cache_ttl_secs: 3600.0,
        }
    }
}

// ── Advisor client ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Chat-completions endpoint of the reasoning provider.
    pub base_url: String,
    pub model: String,
    /// Bearer token; read from the environment by the binary, never baked
    /// into config files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1/chat/completions".to_owned(),
            model: "llama3-8b-instruct".to_owned(),
            api_key: None,
            max_tokens: 1024,
            temperature: 0.1,
        }
    }
}

// ── Event ring ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Max events retained; the oldest is dropped on overflow.
    pub ring_size: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { ring_size: 500 }
    }
}
