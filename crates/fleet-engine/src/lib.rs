//! `fleet-engine` — the assembled dispatch engine.
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`engine`]    | `Engine` composite + `EngineBuilder`                   |
//! | [`commands`]  | the command surface consumed by the REST boundary      |
//! | [`metrics`]   | KPI aggregation over a snapshot                        |
//! | [`scheduler`] | `DispatchLoop` — four cadences, triggers, cancellation |
//!
//! The `Engine` owns the store, the route cache, the advisor client, and
//! the four periodic workers.  It is constructed once at startup and
//! threaded through the boundary handlers — there are no globals.

pub mod commands;
pub mod engine;
pub mod metrics;
pub mod scheduler;


pub use commands::{
    CycleResponse, InitializeResponse, ManageRoutesResponse, MatchLoadsResponse,
    SimulateMovementResponse,
};
pub use engine::{Engine, EngineBuilder};
pub use metrics::{FleetDashboard, KpiSummary};
pub use scheduler::{DispatchLoop, LoopHandle, LoopStats};
