//! `fleet-agents` — the decision agents that drive the dispatch engine.
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`signals`]   | `SignalSource` trait + `SimulatedSignals`               |
//! | [`observer`]  | `ObserverAgent` — ingests signals, surfaces triggers    |
//! | [`matcher`]   | `MatcherAgent` — pairs idle vehicles with loads         |
//! | [`adapter`]   | `AdapterAgent` — amends in-flight trips                 |
//! | [`predictor`] | pure per-trip ETA / fuel / on-time readout              |
//!
//! Each agent is an operation `(store, externals, now) → typed report`;
//! the scheduler in `fleet-engine` composes them.  Agents never hold
//! mutable store references across invocations, and every external call
//! they make is bounded by a deadline with an explicit fallback.

pub mod adapter;
pub mod matcher;
pub mod observer;
pub mod predictor;
pub mod signals;


pub use adapter::{AdapterAction, AdapterAgent, TripDecision};
pub use matcher::{MatchReport, MatcherAgent, PairMetrics};
pub use observer::{ObserverAgent, ObserverReport, Trigger};
pub use predictor::{predict, OnTimeStatus, Recommendation, TripPrediction};
pub use signals::{NoSignals, Signal, SignalError, SignalSource, SimulatedSignals};
