//! Approximate string matching.
//!
//! A query matches a candidate when its characters appear in order, possibly
//! with gaps, case-insensitively. Scoring prefers contiguous hits in short
//! candidates and is fully deterministic, so ranked results have a stable
//! order.

/// True when `query` is an ordered, possibly non-contiguous, case-insensitive
/// subsequence of `candidate`. The empty query matches everything.
pub fn fuzzy_match(query: &str, candidate: &str) -> bool {
    let candidate = candidate.to_lowercase();
    let mut chars = candidate.chars();
    query
        .to_lowercase()
        .chars()
        .all(|q| chars.any(|c| c == q))
}

/// Match score in (0.0, 1.0], or None when `query` does not match.
///
/// Contiguous containment scores 0.8-1.0, shorter candidates higher; a
/// gapped subsequence scores below 0.8, scaled by how tightly the matched
/// characters cluster.
pub fn fuzzy_score(query: &str, candidate: &str) -> Option<f64> {
    if query.is_empty() {
        return Some(1.0);
    }

    let q = query.to_lowercase();
    let c = candidate.to_lowercase();
    let q_len = q.chars().count() as f64;
    let c_len = c.chars().count() as f64;
    if c_len == 0.0 {
        return None;
    }

    if c.contains(&q) {
        return Some((0.8 + 0.2 * (q_len / c_len)).clamp(0.0, 1.0));
    }

    // Greedy leftmost subsequence walk, tracking the span it covers
    let mut q_chars = q.chars();
    let mut needle = q_chars.next()?;
    let mut first_hit = None;
    let mut last_hit = 0usize;
    for (idx, ch) in c.chars().enumerate() {
        if ch == needle {
            first_hit.get_or_insert(idx);
            last_hit = idx;
            match q_chars.next() {
                Some(next) => needle = next,
                None => {
                    let span = (last_hit - first_hit.unwrap_or(0) + 1) as f64;
                    return Some((0.8 * (q_len / span)).clamp(0.0, 0.8));
                }
            }
        }
    }
    None
}

/// Candidates matching `query`, ordered by descending score; ties keep the
/// input order.
pub fn rank_matches(query: &str, candidates: &[String]) -> Vec<String> {
    let mut scored: Vec<(usize, f64, &String)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(idx, c)| fuzzy_score(query, c).map(|s| (idx, s, c)))
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.into_iter().map(|(_, _, c)| c.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_query_matches_anything() {
        assert!(fuzzy_match("", "db1"));
        assert!(fuzzy_match("", ""));
        assert_eq!(fuzzy_score("", "anything"), Some(1.0));
    }

    #[test]
    fn test_contiguous_match() {
        assert!(fuzzy_match("db", "db1"));
        assert!(fuzzy_match("prod", "infra-prod"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(fuzzy_match("RUNNING", "running"));
        assert!(fuzzy_match("db1", "DB1"));
    }

    #[test]
    fn test_gapped_subsequence_matches() {
        // d..b..1 appear in order with gaps
        assert!(fuzzy_match("db1", "dash-bar-1"));
        assert!(fuzzy_match("ip", "infra-prod"));
    }

    #[test]
    fn test_out_of_order_does_not_match() {
        assert!(!fuzzy_match("1bd", "db1"));
        assert!(!fuzzy_match("xyz", "db1"));
    }

    #[test]
    fn test_query_longer_than_candidate() {
        assert!(!fuzzy_match("database-primary", "db1"));
    }

    #[test]
    fn test_contiguous_outscores_gapped() {
        let tight = fuzzy_score("db", "db1").unwrap();
        let loose = fuzzy_score("db", "d-x-b").unwrap();
        assert!(tight > loose);
    }

    #[test]
    fn test_shorter_candidate_outscores_longer_on_containment() {
        let short = fuzzy_score("infra", "infra-dev").unwrap();
        let long = fuzzy_score("infra", "infra-production-eu").unwrap();
        assert!(short > long);
    }

    #[test]
    fn test_rank_is_score_descending() {
        let candidates = vec![
            "analytics".to_string(),
            "infra-production-eu".to_string(),
            "infra-dev".to_string(),
            "infra-prod".to_string(),
        ];
        let ranked = rank_matches("infra", &candidates);
        assert_eq!(ranked, vec!["infra-dev", "infra-prod", "infra-production-eu"]);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let candidates = vec!["infra-yy".to_string(), "infra-xx".to_string()];
        assert_eq!(rank_matches("infra", &candidates), candidates);
    }

    #[test]
    fn test_rank_no_matches_is_empty() {
        let candidates = vec!["analytics".to_string()];
        assert!(rank_matches("zzz", &candidates).is_empty());
    }

    proptest! {
        #[test]
        fn prop_empty_query_always_matches(candidate in ".*") {
            prop_assert!(fuzzy_match("", &candidate));
        }

        #[test]
        fn prop_candidate_matches_itself(s in "[a-z0-9-]{1,20}") {
            prop_assert!(fuzzy_match(&s, &s));
            prop_assert_eq!(fuzzy_score(&s, &s), Some(1.0));
        }

        #[test]
        fn prop_score_implies_match(q in "[a-z]{0,6}", c in "[a-z-]{0,12}") {
            prop_assert_eq!(fuzzy_score(&q, &c).is_some(), fuzzy_match(&q, &c));
        }
    }
}
