//! Ranking helpers: order-preserving dedup and the empty-ranking fallback.

use std::collections::HashSet;

/// Outcome of applying a ranker's answer to the queued tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked {
    pub tasks: Vec<String>,
    /// True when the ranker returned nothing and the original order was kept.
    pub fell_back: bool,
}

/// Drop repeated literal strings, keeping the first occurrence.
pub fn dedup_preserving_order<I>(tasks: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    tasks
        .into_iter()
        .filter(|task| seen.insert(task.clone()))
        .collect()
}

/// Replace `original` with `ranked`, unless the ranking is empty.
///
/// An empty ranking of a non-empty queue must never destroy queued work.
pub fn ranked_or_original(original: &[String], ranked: Vec<String>) -> Ranked {
    if ranked.is_empty() && !original.is_empty() {
        return Ranked {
            tasks: original.to_vec(),
            fell_back: true,
        };
    }
    Ranked {
        tasks: ranked,
        fell_back: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let out = dedup_preserving_order(strings(&["b", "a", "b", "c", "a"]));
        assert_eq!(out, strings(&["b", "a", "c"]));
    }

    #[test]
    fn empty_ranking_falls_back_to_original() {
        let original = strings(&["one", "two"]);
        let ranked = ranked_or_original(&original, Vec::new());
        assert!(ranked.fell_back);
        assert_eq!(ranked.tasks, original);
    }

    #[test]
    fn non_empty_ranking_replaces_queue() {
        let original = strings(&["one", "two", "two"]);
        let ranked = ranked_or_original(&original, strings(&["two", "one"]));
        assert!(!ranked.fell_back);
        assert_eq!(ranked.tasks, strings(&["two", "one"]));
    }
}
