//! Deterministic token-overlap matching
//!
//! Scores search candidates against the transaction's combined token set,
//! without calling the AI backend.

use std::collections::HashSet;

use super::normalize::normalize;
use super::placeholder::is_placeholder;
use super::types::AccountCandidate;

/// What to do when no candidate reaches the overlap threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Return the best-scoring candidate if it shares at least one token
    #[default]
    Lenient,
    /// Return nothing; the caller escalates to AI
    Strict,
}

/// Token overlap a candidate needs for a confident match.
///
/// Rich token sets (more than 10) need a quarter of the tokens, sparse
/// ones need a majority. Never below 1.
pub fn minimum_matches(target_len: usize) -> usize {
    if target_len > 10 {
        (target_len / 4).max(1)
    } else {
        target_len.div_ceil(2).max(1)
    }
}

/// Pick a candidate by token overlap, or `None` when nothing is confident enough.
///
/// Candidates are assumed pre-ranked by the search backend: the first one
/// reaching the threshold wins, not the highest-scoring one.
pub fn match_candidate<'a>(
    candidates: &'a [AccountCandidate],
    description_tokens: &[String],
    destination_tokens: &[String],
    policy: FallbackPolicy,
) -> Option<&'a AccountCandidate> {
    match candidates {
        [] => return None,
        [only] => return (!is_placeholder(&only.name)).then_some(only),
        _ => {}
    }

    let target: HashSet<&str> = description_tokens
        .iter()
        .chain(destination_tokens.iter())
        .map(String::as_str)
        .collect();
    let required = minimum_matches(target.len());

    let mut best: Option<(&AccountCandidate, usize)> = None;

    for candidate in candidates {
        let score = normalize(&candidate.name)
            .tokens
            .iter()
            .filter(|t| target.contains(t.as_str()))
            .count();

        if score >= required {
            return Some(candidate);
        }

        if score > best.map(|(_, s)| s).unwrap_or(0) {
            best = Some((candidate, score));
        }
    }

    match policy {
        FallbackPolicy::Lenient => best.map(|(c, _)| c),
        FallbackPolicy::Strict => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn candidate(id: &str, name: &str) -> AccountCandidate {
        AccountCandidate::new(id, name)
    }

    #[test]
    fn test_minimum_matches() {
        assert_eq!(minimum_matches(0), 1);
        assert_eq!(minimum_matches(1), 1);
        assert_eq!(minimum_matches(3), 2);
        assert_eq!(minimum_matches(4), 2);
        assert_eq!(minimum_matches(10), 5);
        assert_eq!(minimum_matches(11), 2);
        assert_eq!(minimum_matches(20), 5);
    }

    #[test]
    fn test_empty_candidates() {
        let result = match_candidate(&[], &tokens(&["a"]), &[], FallbackPolicy::Lenient);
        assert!(result.is_none());
    }

    #[test]
    fn test_single_candidate_short_circuit() {
        let candidates = vec![candidate("9", "Starbucks Coffee")];
        let result = match_candidate(
            &candidates,
            &tokens(&["unrelated"]),
            &[],
            FallbackPolicy::Strict,
        );
        assert_eq!(result.map(|c| c.id.as_str()), Some("9"));
    }

    #[test]
    fn test_single_placeholder_candidate_rejected() {
        let candidates = vec![candidate("1", "Unknown")];
        let result = match_candidate(&candidates, &tokens(&["x"]), &[], FallbackPolicy::Lenient);
        assert!(result.is_none());
    }

    #[test]
    fn test_loose_threshold_for_rich_token_sets() {
        let target = tokens(&[
            "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india",
            "juliet", "kilo",
        ]);
        let candidates = vec![
            candidate("1", "Zulu Yankee"),
            candidate("2", "Alpha Bravo Store"),
        ];
        let result = match_candidate(&candidates, &target, &[], FallbackPolicy::Strict);
        assert_eq!(result.map(|c| c.id.as_str()), Some("2"));
    }

    #[test]
    fn test_strict_threshold_for_sparse_token_sets() {
        let target = tokens(&["alpha", "bravo", "charlie"]);
        let candidates = vec![candidate("1", "Zulu"), candidate("2", "Alpha Store")];

        let strict = match_candidate(&candidates, &target, &[], FallbackPolicy::Strict);
        assert!(strict.is_none());

        let lenient = match_candidate(&candidates, &target, &[], FallbackPolicy::Lenient);
        assert_eq!(lenient.map(|c| c.id.as_str()), Some("2"));
    }

    #[test]
    fn test_first_candidate_over_threshold_wins() {
        let target = tokens(&["shell", "station"]);
        let candidates = vec![
            candidate("1", "Shell"),
            candidate("2", "Shell Station"),
        ];
        // threshold is 1: the first candidate already qualifies
        let result = match_candidate(&candidates, &target, &[], FallbackPolicy::Strict);
        assert_eq!(result.map(|c| c.id.as_str()), Some("1"));
    }

    #[test]
    fn test_destination_tokens_count_toward_overlap() {
        let candidates = vec![candidate("1", "Repsol"), candidate("2", "Cepsa Estacion")];
        let result = match_candidate(
            &candidates,
            &tokens(&["gasolinera"]),
            &tokens(&["cepsa"]),
            FallbackPolicy::Strict,
        );
        assert_eq!(result.map(|c| c.id.as_str()), Some("2"));
    }

    #[test]
    fn test_no_overlap_returns_none_even_when_lenient() {
        let candidates = vec![candidate("1", "Zulu"), candidate("2", "Yankee")];
        let result = match_candidate(
            &candidates,
            &tokens(&["alpha", "bravo"]),
            &[],
            FallbackPolicy::Lenient,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_lenient_prefers_highest_score_then_order() {
        let target = tokens(&[
            "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel",
        ]);
        // threshold 4
        let candidates = vec![
            candidate("1", "Alpha Zulu"),
            candidate("2", "Alpha Bravo Charlie"),
            candidate("3", "Delta Echo Foxtrot"),
        ];
        let result = match_candidate(&candidates, &target, &[], FallbackPolicy::Lenient);
        assert_eq!(result.map(|c| c.id.as_str()), Some("2"));
    }
}
