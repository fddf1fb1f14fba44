//! Operator line classification and `USERINPUT#` memory entries.

use chrono::NaiveDateTime;

/// Prefix of operator-memory entries kept alongside tasks in the queue store.
pub const MEMORY_PREFIX: &str = "USERINPUT#";
/// Timestamp layout used inside memory entries.
pub const MEMORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CONTROL_TOKENS: [&str; 2] = ["quit", "exit"];

/// A line typed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorLine<'a> {
    /// `quit` / `exit` in any case: stop the run.
    Control,
    /// Anything else: a task submission.
    Task(&'a str),
}

/// Classify an already trimmed operator line.
pub fn classify_line(line: &str) -> OperatorLine<'_> {
    let trimmed = line.trim();
    if CONTROL_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
    {
        return OperatorLine::Control;
    }
    OperatorLine::Task(trimmed)
}

/// Render `USERINPUT#<YYYY-MM-DD HH:MM:SS>#=<text>`.
pub fn memory_entry(text: &str, at: NaiveDateTime) -> String {
    format!(
        "{MEMORY_PREFIX}{}#={}",
        at.format(MEMORY_TIMESTAMP_FORMAT),
        text.trim()
    )
}

/// Whether a persisted line is an operator-memory entry rather than a task.
pub fn is_memory_entry(line: &str) -> bool {
    line.starts_with(MEMORY_PREFIX)
}
