//! The two documented response grammars.
//!
//! # Match lines
//!
//! A pair is approved iff a vehicle id and a load id occur on the same
//! line joined by a directional separator (`→` or `->`), e.g.
//!
//! ```text
//! - Vehicle truck_001 → Load load_003: short pickup leg, 28% margin
//! ```
//!
//! # Decisions
//!
//! The adapter looks for a line whose first token is `DECISION:` followed
//! by one of `CONTINUE`, `ADJUST_ROUTE`, or `FOLLOW_UP_LOAD` (the legacy
//! `DETOUR_FOR_LOAD` spelling is accepted).  For follow-ups, the first
//! load id found after the decision names the chosen load.
//!
//! Parse outcomes are values, never exceptions: callers inspect
//! [`ParseFailure`] to pick their fallback.

use fleet_core::{LoadId, VehicleId};

// ── Failure reasons ───────────────────────────────────────────────────────────

/// Why a response could not be read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParseFailure {
    /// The advisor returned nothing (or whitespace).
    EmptyResponse,
    /// Text present, but no line matched the grammar.
    NoPairsFound,
    /// No `DECISION:` token anywhere.
    MissingDecision,
    /// A `DECISION:` token with an unknown verb.
    UnknownDecision,
}

// ── Match grammar ─────────────────────────────────────────────────────────────

/// Result of scanning a matching response.
///
/// `pairs` may legitimately be empty ("APPROVED MATCHES: None") — that is
/// an answer, not a failure, and must not trigger the rule fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResponse {
    pub pairs: Vec<(VehicleId, LoadId)>,
    pub failure: Option<ParseFailure>,
}

/// Scan `text` for approved `vehicle → load` pairs, in order of
/// appearance.
pub fn parse_match_pairs(text: &str) -> MatchResponse {
    if text.trim().is_empty() {
        return MatchResponse { pairs: vec![], failure: Some(ParseFailure::EmptyResponse) };
    }

    let mut pairs = Vec::new();
    for line in text.lines() {
        let (left, right) = match split_on_arrow(line) {
            Some(parts) => parts,
            None => continue,
        };
        // Drop the free-text justification after the colon, if any.
        let right = right.split(':').next().unwrap_or(right);

        // Closest-to-the-arrow wins on the left; first id wins on the right.
        let vehicle = tokens(left).rev().find_map(|t| t.parse::<VehicleId>().ok());
        let load = tokens(right).find_map(|t| t.parse::<LoadId>().ok());

        if let (Some(v), Some(l)) = (vehicle, load) {
            pairs.push((v, l));
        }
    }

    let failure = pairs.is_empty().then_some(ParseFailure::NoPairsFound);
    MatchResponse { pairs, failure }
}

// ── Decision grammar ──────────────────────────────────────────────────────────

/// A route-management decision read from advisor text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Continue,
    AdjustRoute,
    FollowUpLoad {
        /// The load named after the decision, if the advisor identified one.
        load_id: Option<LoadId>,
    },
}

/// Find the leading `DECISION:` token and read its verb.
pub fn parse_decision(text: &str) -> Result<Decision, ParseFailure> {
    if text.trim().is_empty() {
        return Err(ParseFailure::EmptyResponse);
    }

    let mut after_decision = None;
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = strip_prefix_ci(trimmed, "DECISION:") {
            after_decision = Some(rest.trim().to_ascii_uppercase());
            break;
        }
    }
    let verb = after_decision.ok_or(ParseFailure::MissingDecision)?;

    if verb.contains("FOLLOW_UP_LOAD") || verb.contains("DETOUR") {
        // The chosen load is usually named below the decision line; scan
        // the whole response for the first load id.
        let load_id = text
            .lines()
            .flat_map(tokens)
            .find_map(|t| t.parse::<LoadId>().ok());
        Ok(Decision::FollowUpLoad { load_id })
    } else if verb.contains("ADJUST") {
        Ok(Decision::AdjustRoute)
    } else if verb.contains("CONTINUE") {
        Ok(Decision::Continue)
    } else {
        Err(ParseFailure::UnknownDecision)
    }
}

// ── Scanning helpers ──────────────────────────────────────────────────────────

/// Split a line at the first directional separator.
fn split_on_arrow(line: &str) -> Option<(&str, &str)> {
    if let Some(idx) = line.find('→') {
        Some((&line[..idx], &line[idx + '→'.len_utf8()..]))
    } else {
        line.find("->").map(|idx| (&line[..idx], &line[idx + 2..]))
    }
}

/// Identifier-shaped tokens of a line (alphanumerics and underscores).
fn tokens(s: &str) -> impl DoubleEndedIterator<Item = &str> {
    s.split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
}

/// Case-insensitive ASCII prefix strip.  Byte-based so a multibyte char
/// early in the line cannot put the cut on a non-boundary.
fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len()
        && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
