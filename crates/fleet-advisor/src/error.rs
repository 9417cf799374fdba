//! Advisor error type.

use thiserror::Error;

/// Failures of the external advisor call.
///
/// None of these escape the agent that made the call — each agent has an
/// explicit rule-based fallback — but the buckets matter for logging and
/// for operators deciding whether to rotate a key or wait out a limit.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor call timed out after {budget_secs} s")]
    Timeout { budget_secs: f64 },

    #[error("advisor rate limit exceeded")]
    RateLimited,

    #[error("advisor authentication failed")]
    Auth,

    #[error("advisor connection failed: {0}")]
    Connection(String),

    #[error("advisor API error: {0}")]
    Api(String),
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;

impl From<AdvisorError> for fleet_core::FleetError {
    fn from(e: AdvisorError) -> Self {
        match e {
            AdvisorError::Timeout { budget_secs } => {
                fleet_core::FleetError::Timeout { what: "advisor call", budget_secs }
            }
            other => fleet_core::FleetError::Unavailable(other.to_string()),
        }
    }
}
