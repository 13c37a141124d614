//! Model-reply parsing.
//!
//! The output contract asks for `XY: Title` on a line of its own, but
//! replies frequently carry extra prose around it. We scan for the first
//! line matching the two-digit prefix and fall back to the whole trimmed
//! reply when none does.

use snaptask_core::types::duration_prefixed;
use snaptask_core::{AnalysisResult, TokenUsage};
use tracing::warn;

/// Scan the reply for the first line whose first two characters are
/// ASCII digits immediately followed by `": "`. That line, trimmed,
/// becomes the parsed task line. No range validation on the digits.
pub fn parse_reply(raw: String, usage: Option<TokenUsage>) -> AnalysisResult {
    let parsed_line = raw
        .lines()
        .find(|line| duration_prefixed(line))
        .map(|line| line.trim().to_string());

    if parsed_line.is_none() {
        warn!("vision reply did not match expected format: {}", raw.trim());
    }

    AnalysisResult { raw, parsed_line, usage }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> AnalysisResult {
        parse_reply(raw.to_string(), None)
    }

    #[test]
    fn single_well_formed_line() {
        let r = parse("02: Buy groceries");
        assert_eq!(r.content(), "02: Buy groceries");
        assert_eq!(r.title(), "Buy groceries");
        assert!(r.format_matched());
    }

    #[test]
    fn picks_matching_line_out_of_surrounding_prose() {
        let r = parse("Here is the task.\n05: Fix the sink\nLet me know if needed.");
        assert_eq!(r.content(), "05: Fix the sink");
        assert_eq!(r.title(), "Fix the sink");
        assert_eq!(r.duration_code(), Some("05"));
    }

    #[test]
    fn first_matching_line_wins() {
        let r = parse("03: First task\n12: Second task");
        assert_eq!(r.content(), "03: First task");
    }

    #[test]
    fn no_match_falls_back_to_whole_reply() {
        let r = parse("I could not determine a clear task.");
        assert!(!r.format_matched());
        assert_eq!(r.content(), "I could not determine a clear task.");
        assert_eq!(r.title(), "I could not determine a clear task.");
        assert_eq!(r.duration_code(), None);
    }

    #[test]
    fn multi_line_fallback_is_trimmed() {
        let r = parse("\nSorry, the image is blank.\nNothing to extract.\n");
        assert!(!r.format_matched());
        assert_eq!(r.content(), "Sorry, the image is blank.\nNothing to extract.");
    }

    #[test]
    fn matched_line_is_trimmed_but_indented_lines_do_not_match() {
        // The digit check runs on the raw line, so indentation disqualifies it.
        let r = parse("  02: Indented task\n07: Flush line\t");
        assert_eq!(r.content(), "07: Flush line");
    }

    #[test]
    fn any_digit_pair_is_accepted_without_range_check() {
        let r = parse("99: Marathon refactor");
        assert_eq!(r.duration_code(), Some("99"));
        assert_eq!(r.title(), "Marathon refactor");
    }
}
