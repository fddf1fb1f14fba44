//! Parsing of generated text into tasks, rankings, insights and goal verdicts.

use std::sync::LazyLock;

use regex::Regex;

use super::ranking::dedup_preserving_order;

/// Sentinel a task generator answers with when nothing is left to do.
pub const NO_TASKS_SENTINEL: &str = "NO TASKS REQUIRED";
/// Sentinel an insight extractor answers with when the result taught nothing.
pub const NO_INSIGHTS_SENTINEL: &str = "NO NEW INSIGHTS";
/// Result reported when execution produced no text.
pub const NO_RESULT: &str = "No result.";

static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*\u{2022}]|\d{1,2}[.)])\s+").expect("list marker regex should be valid")
});

/// Non-empty, trimmed lines of a response.
fn lines(response: &str) -> impl Iterator<Item = &str> {
    response.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Strip a leading bullet or numbering (`- `, `* `, `1. `, `2) `).
pub fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER_RE.find(line) {
        Some(marker) => line[marker.end()..].trim_start(),
        None => line,
    }
}

/// Parse a task generator response, one task per line.
///
/// A `NO TASKS REQUIRED` line ends the batch with no tasks at all.
pub fn parse_task_lines(response: &str) -> Vec<String> {
    let mut tasks = Vec::new();
    for line in lines(response) {
        if line.eq_ignore_ascii_case(NO_TASKS_SENTINEL) {
            return Vec::new();
        }
        let task = strip_list_marker(line);
        if !task.is_empty() {
            tasks.push(task.to_string());
        }
    }
    tasks
}

/// Parse a ranker response into a deduplicated ordered list.
pub fn parse_ranked(response: &str) -> Vec<String> {
    dedup_preserving_order(
        lines(response)
            .map(strip_list_marker)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
    )
}

/// Resolve an insight block: `None` when empty or when any line reports no new insights.
pub fn resolve_insight(text: &str) -> Option<String> {
    let mut kept = Vec::new();
    for line in lines(text) {
        if line.to_uppercase().contains(NO_INSIGHTS_SENTINEL) {
            return None;
        }
        kept.push(line);
    }
    if kept.is_empty() {
        return None;
    }
    Some(kept.join("\n"))
}

/// Whether a goal evaluation answer declares the objective met.
pub fn parse_goal_verdict(response: &str) -> bool {
    response.trim().to_uppercase().starts_with("YES")
}

/// Normalize an execution answer, substituting [`NO_RESULT`] for empty text.
pub fn execution_result(response: &str) -> String {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return NO_RESULT.to_string();
    }
    trimmed.to_string()
}

/// First non-empty line of a response, or empty.
pub fn first_line(response: &str) -> &str {
    lines(response).next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_lines_strip_markers_and_blanks() {
        let response = "\n- Create a file 'hello.txt'\n2. WEB#rust sync_channel\n\n* FILE#read#hello.txt\n";
        assert_eq!(
            parse_task_lines(response),
            vec![
                "Create a file 'hello.txt'",
                "WEB#rust sync_channel",
                "FILE#read#hello.txt"
            ]
        );
    }

    #[test]
    fn no_tasks_sentinel_discards_batch() {
        assert!(parse_task_lines("do a thing\nno tasks required\n").is_empty());
    }

    #[test]
    fn structured_tasks_keep_their_hashes() {
        assert_eq!(
            parse_task_lines("FILE#create#a.md## Title"),
            vec!["FILE#create#a.md## Title"]
        );
    }

    #[test]
    fn ranked_lines_are_deduplicated() {
        assert_eq!(
            parse_ranked("1. b\n2. a\n3. b\n"),
            vec!["b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn insights_resolve_to_none_on_sentinel_or_blank() {
        assert_eq!(resolve_insight(""), None);
        assert_eq!(resolve_insight("  \n "), None);
        assert_eq!(resolve_insight("- learned x\nNo new insights."), None);
        assert_eq!(
            resolve_insight("NO NEW INSIGHTS resolved to empty upstream"),
            None
        );
        assert_eq!(
            resolve_insight("  - learned x \n\n - and y"),
            Some("- learned x\n- and y".to_string())
        );
    }

    #[test]
    fn goal_verdict_requires_yes_prefix() {
        assert!(parse_goal_verdict(" yes, it is done"));
        assert!(parse_goal_verdict("YES"));
        assert!(!parse_goal_verdict("NO"));
        assert!(!parse_goal_verdict("maybe yes"));
    }

    #[test]
    fn execution_result_defaults_when_empty() {
        assert_eq!(execution_result("  "), NO_RESULT);
        assert_eq!(execution_result(" done \n"), "done");
        assert_eq!(first_line("\n first \nsecond"), "first");
    }
}
