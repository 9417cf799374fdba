//! `fleet-advisor` — the external reasoning advisor integration.
//!
//! The matcher and adapter solicit free-text rankings and decisions from
//! an external language-model provider.  This crate owns that seam:
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`client`] | `Advisor` trait, `ChatAdvisor` (HTTP), `ScriptedAdvisor`   |
//! | [`parse`]  | the two documented response grammars                       |
//! | [`error`]  | `AdvisorError`, `AdvisorResult<T>`                         |
//!
//! Parsing is deliberately dumb: one grammar per call site, scanning for
//! `vehicle → load` lines or a leading `DECISION:` token.  Anything the
//! grammar cannot read is a value (`ParseFailure`), not an exception —
//! the agents pick their fallback by inspecting it.

pub mod client;
pub mod error;
pub mod parse;

#[cfg(test)]
mod tests;

pub use client::{Advisor, ChatAdvisor, FailingAdvisor, ScriptedAdvisor};
pub use error::{AdvisorError, AdvisorResult};
pub use parse::{parse_decision, parse_match_pairs, Decision, MatchResponse, ParseFailure};
