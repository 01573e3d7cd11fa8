// crates/civic-comments-core/tests/proptest_alignment.rs
// ============================================================================
// Module: Alignment Property-Based Tests
// Description: Property tests for alignment parsing and form validation.
// Purpose: Ensure only -1, 0, and 1 are ever accepted as alignments.
// ============================================================================

//! Property-based tests for alignment invariants.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use civic_comments_core::Alignment;
use civic_comments_core::runtime::AlignmentInput;
use civic_comments_core::runtime::CommentForm;
use civic_comments_core::runtime::FormError;
use civic_comments_core::runtime::FormLimits;
use proptest::prelude::*;

const LIMITS: FormLimits = FormLimits {
    max_length: 1_000,
    parent_depth: None,
};

fn form_with(alignment: AlignmentInput) -> CommentForm {
    CommentForm {
        commentable_gid: "gid".to_string(),
        body: Some("This is a new comment".to_string()),
        alignment: Some(alignment),
    }
}

proptest! {
    #[test]
    fn integer_alignment_accepted_iff_in_range(value in any::<i64>()) {
        let result = form_with(AlignmentInput::Integer(value)).validate(LIMITS);
        if (-1 ..= 1).contains(&value) {
            let validated = result.unwrap();
            prop_assert_eq!(validated.alignment.value(), value);
        } else {
            prop_assert_eq!(result.unwrap_err(), vec![FormError::AlignmentInvalid {
                value: value.to_string(),
            }]);
        }
    }

    #[test]
    fn text_alignment_matches_integer_parsing(text in "[-+ ]?[0-9]{0,3}") {
        let expected = text.trim().parse::<i64>().ok().and_then(Alignment::from_value);
        prop_assert_eq!(Alignment::parse(&text), expected);
        let result = form_with(AlignmentInput::Text(text)).validate(LIMITS);
        prop_assert_eq!(result.ok().map(|validated| validated.alignment), expected);
    }

    #[test]
    fn serde_round_trip_only_for_valid_values(value in -5_i64 ..= 5) {
        let parsed: Result<Alignment, _> = serde_json::from_str(&value.to_string());
        prop_assert_eq!(parsed.is_ok(), (-1 ..= 1).contains(&value));
        if let Ok(alignment) = parsed {
            prop_assert_eq!(serde_json::to_string(&alignment).unwrap(), value.to_string());
        }
    }
}
