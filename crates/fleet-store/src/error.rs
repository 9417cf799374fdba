//! Store error type.

use thiserror::Error;

/// Failures of store write operations.
///
/// Reads never fail: a snapshot always succeeds once initialization has
/// run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// The requested write would violate a lifecycle invariant
    /// (double-match, illegal status transition, duplicate id).
    #[error("conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for fleet_core::FleetError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => fleet_core::FleetError::NotFound(what),
            StoreError::Conflict(what) => fleet_core::FleetError::Conflict(what),
        }
    }
}
