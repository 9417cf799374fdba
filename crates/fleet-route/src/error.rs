//! Routing error type.

use thiserror::Error;

/// Failures of the external routing integration.
///
/// These never escape [`RouteCache::route`](crate::RouteCache::route) — the
/// cache substitutes a fallback polyline — but sources report them so the
/// cache can log and count what happened.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("routing call timed out after {budget_secs} s")]
    Timeout { budget_secs: f64 },

    #[error("routing service unavailable: {0}")]
    Unavailable(String),

    #[error("malformed routing response: {0}")]
    Malformed(String),
}

pub type RouteResult<T> = Result<T, RouteError>;

impl From<RouteError> for fleet_core::FleetError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::Timeout { budget_secs } => {
                fleet_core::FleetError::Timeout { what: "routing call", budget_secs }
            }
            RouteError::Unavailable(msg) => fleet_core::FleetError::Unavailable(msg),
            RouteError::Malformed(msg) => fleet_core::FleetError::Malformed(msg),
        }
    }
}
