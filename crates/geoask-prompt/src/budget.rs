// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token budgeting for context sections.

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Returns the longest prefix of `snippets` whose combined estimate stays
/// within `max_tokens`.
///
/// Stops at the first snippet that would overflow, even if a later, shorter
/// one would still fit. Priority order is the caller's order.
pub fn within_budget<S: AsRef<str>>(snippets: &[S], max_tokens: usize) -> &[S] {
    let mut used = 0usize;
    for (i, snippet) in snippets.iter().enumerate() {
        let cost = estimate_tokens(snippet.as_ref());
        if used + cost > max_tokens {
            return &snippets[..i];
        }
        used += cost;
    }
    snippets
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn estimate_counts_chars_not_bytes() {
        // 4 chars, 8 bytes
        assert_eq!(estimate_tokens("àèòí"), 1);
    }

    #[test]
    fn stops_at_first_overflow() {
        let snippets = vec!["a".repeat(40), "b".repeat(40), "c".repeat(4)];
        // 10 + 10 > 15, so the short third snippet is dropped too.
        let kept = within_budget(&snippets, 15);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn exact_fit_is_kept() {
        let snippets = vec!["a".repeat(40), "b".repeat(40)];
        assert_eq!(within_budget(&snippets, 20).len(), 2);
    }

    #[test]
    fn zero_budget_keeps_only_empty_snippets() {
        let snippets = vec![String::new(), "x".to_string()];
        assert_eq!(within_budget(&snippets, 0).len(), 1);
        let empty: Vec<String> = Vec::new();
        assert!(within_budget(&empty, 100).is_empty());
    }

    proptest! {
        #[test]
        fn kept_prefix_respects_budget(
            snippets in proptest::collection::vec(".{0,80}", 0..12),
            max in 0usize..120,
        ) {
            let kept = within_budget(&snippets, max);
            prop_assert!(kept.len() <= snippets.len());
            prop_assert_eq!(kept, &snippets[..kept.len()]);
            let total: usize = kept.iter().map(|s| estimate_tokens(s)).sum();
            prop_assert!(total <= max);
            if kept.len() < snippets.len() {
                prop_assert!(total + estimate_tokens(&snippets[kept.len()]) > max);
            }
        }

        #[test]
        fn appending_a_snippet_grows_retained_count_by_at_most_one(
            snippets in proptest::collection::vec(".{0,80}", 0..12),
            extra in ".{0,80}",
            max in 0usize..120,
        ) {
            let before = within_budget(&snippets, max).len();
            let mut longer = snippets.clone();
            longer.push(extra);
            let after = within_budget(&longer, max).len();
            prop_assert!(after == before || (after == before + 1 && before == snippets.len()));
        }
    }
}
