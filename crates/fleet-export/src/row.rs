//! Plain data rows written by export backends.

/// One event, flattened for tabular storage.  `details` holds the typed
/// payload re-encoded as JSON so downstream tools keep the full record.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLogRow {
    pub seq: u64,
    pub timestamp: f64,
    pub event_type: &'static str,
    pub details: String,
}

/// Periodic KPI sample.  Assembled by the caller (the KPI math lives
/// with the engine, not here).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiRow {
    pub timestamp: f64,
    pub total_vehicles: u64,
    pub idle_vehicles: u64,
    pub en_route_vehicles: u64,
    pub available_loads: u64,
    pub active_trips: u64,
    /// 0–100.
    pub avg_utilization: f64,
    pub total_km_today: f64,
}
