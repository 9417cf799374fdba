//! Unit tests for fleet-advisor.

use std::time::Duration;

use fleet_core::{LoadId, VehicleId};

use crate::client::{Advisor, FailingAdvisor, ScriptedAdvisor};
use crate::parse::{parse_decision, parse_match_pairs, Decision, ParseFailure};

// ── Match grammar ─────────────────────────────────────────────────────────────

mod match_grammar {
    use super::*;

    #[test]
    fn reads_canonical_approved_lines() {
        let text = "\
APPROVED MATCHES:
- Vehicle truck_001 → Load load_003: strong margin, short deadhead
- Vehicle truck_002 → Load load_005: best utilization

REASONING:
Prioritized margin over raw revenue.
";
        let parsed = parse_match_pairs(text);
        assert_eq!(
            parsed.pairs,
            vec![(VehicleId(1), LoadId(3)), (VehicleId(2), LoadId(5))]
        );
        assert_eq!(parsed.failure, None);
    }

    #[test]
    fn accepts_ascii_arrows_and_short_aliases() {
        let parsed = parse_match_pairs("v1 -> l2: fine\nv3 -> load_4");
        assert_eq!(
            parsed.pairs,
            vec![(VehicleId(1), LoadId(2)), (VehicleId(3), LoadId(4))]
        );
    }

    #[test]
    fn justification_text_cannot_smuggle_ids() {
        // The reason mentions another load; only the id before the colon counts.
        let parsed = parse_match_pairs("truck_001 → load_002: better than load_009");
        assert_eq!(parsed.pairs, vec![(VehicleId(1), LoadId(2))]);
    }

    #[test]
    fn none_answer_is_empty_but_not_a_failure_of_the_advisor() {
        let parsed = parse_match_pairs("APPROVED MATCHES: None\nNo pair meets both targets.");
        assert!(parsed.pairs.is_empty());
        assert_eq!(parsed.failure, Some(ParseFailure::NoPairsFound));
    }

    #[test]
    fn empty_response_is_distinguished() {
        assert_eq!(
            parse_match_pairs("   \n ").failure,
            Some(ParseFailure::EmptyResponse)
        );
    }

    #[test]
    fn lines_missing_either_side_are_skipped() {
        let parsed = parse_match_pairs("truck_001 → nothing here\n??? -> load_004");
        assert!(parsed.pairs.is_empty());
    }
}

// ── Decision grammar ──────────────────────────────────────────────────────────

mod decision_grammar {
    use super::*;

    #[test]
    fn reads_all_three_verbs() {
        assert_eq!(parse_decision("DECISION: CONTINUE\nall clear"), Ok(Decision::Continue));
        assert_eq!(
            parse_decision("DECISION: ADJUST_ROUTE\ntraffic ahead"),
            Ok(Decision::AdjustRoute)
        );
        assert_eq!(
            parse_decision("DECISION: FOLLOW_UP_LOAD\nSelected Load: load_007"),
            Ok(Decision::FollowUpLoad { load_id: Some(LoadId(7)) })
        );
    }

    #[test]
    fn accepts_legacy_detour_spelling() {
        assert_eq!(
            parse_decision("DECISION: DETOUR_FOR_LOAD\n  Selected Load: load_002"),
            Ok(Decision::FollowUpLoad { load_id: Some(LoadId(2)) })
        );
    }

    #[test]
    fn follow_up_without_a_named_load_still_parses() {
        assert_eq!(
            parse_decision("DECISION: FOLLOW_UP_LOAD\nno specifics"),
            Ok(Decision::FollowUpLoad { load_id: None })
        );
    }

    #[test]
    fn decision_token_may_be_indented_or_lowercased() {
        assert_eq!(parse_decision("  decision: continue"), Ok(Decision::Continue));
    }

    #[test]
    fn failure_reasons_are_precise() {
        assert_eq!(parse_decision(""), Err(ParseFailure::EmptyResponse));
        assert_eq!(
            parse_decision("I think you should keep going."),
            Err(ParseFailure::MissingDecision)
        );
        assert_eq!(
            parse_decision("DECISION: PANIC"),
            Err(ParseFailure::UnknownDecision)
        );
    }
}

// ── Clients ───────────────────────────────────────────────────────────────────

mod clients {
    use super::*;

    #[test]
    fn scripted_advisor_replays_then_repeats_last() {
        let advisor = ScriptedAdvisor::new(["first", "second"]);
        let t = Duration::from_secs(1);
        assert_eq!(advisor.advise("s", "u", t).unwrap(), "first");
        assert_eq!(advisor.advise("s", "u", t).unwrap(), "second");
        assert_eq!(advisor.advise("s", "u", t).unwrap(), "second");
    }

    #[test]
    fn failing_advisor_times_out() {
        let err = FailingAdvisor
            .advise("s", "u", Duration::from_secs(5))
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
