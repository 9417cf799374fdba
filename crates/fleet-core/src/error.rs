//! Engine-wide error taxonomy.
//!
//! Sub-crates define their own error enums (`RouteError`, `AdvisorError`,
//! `StoreError`, …) and convert into `FleetError` at the boundary where a
//! caller needs the unified taxonomy.  The variants mirror the propagation
//! policy: external-call failures (`Timeout`, `Unavailable`, `Malformed`)
//! never travel past the agent that made the call; `NotFound` and
//! `Conflict` surface to the command layer; `Invariant` aborts the current
//! tick and is logged, never returned to external readers.

use thiserror::Error;

/// The top-level error type shared by all `fleet-*` crates.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{what} timed out after {budget_secs} s")]
    Timeout { what: &'static str, budget_secs: f64 },

    #[error("external dependency unavailable: {0}")]
    Unavailable(String),

    #[error("malformed external input: {0}")]
    Malformed(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Shorthand result type for all `fleet-*` crates.
pub type FleetResult<T> = Result<T, FleetError>;
