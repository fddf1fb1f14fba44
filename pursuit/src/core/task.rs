//! Task grammar: plain free-text tasks and `FILE#` / `WEB#` structured tasks.

use crate::core::operator::is_memory_entry;

/// Field delimiter inside structured tasks.
pub const DELIMITER: char = '#';
/// Prefix of file tasks (`FILE#<action>#<filename>#<content…>`).
pub const FILE_PREFIX: &str = "FILE#";
/// Prefix of web search tasks (`WEB#<query>`).
pub const WEB_PREFIX: &str = "WEB#";

/// Routed action encoded in a task string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction<'a> {
    /// Free text handed to the generic execution capability.
    Plain(&'a str),
    /// `FILE#create#<filename>#<content>`; content keeps any further delimiters.
    FileCreate { filename: &'a str, content: &'a str },
    /// `FILE#read#<filename>`.
    FileRead { filename: &'a str },
    /// `FILE#<action>#…` with an action other than `create`/`read`.
    FileUnknown { action: &'a str },
    /// `FILE#…` without the action and filename fields.
    FileMalformed,
    /// `WEB#<query>`; the query is everything after the first delimiter.
    Web { query: &'a str },
}

/// Classify a task by its case-sensitive prefix.
///
/// Only the first two delimiters after `FILE` are structural, so content such as
/// `a#b#c` survives intact.
pub fn classify(task: &str) -> TaskAction<'_> {
    if let Some(rest) = task.strip_prefix(FILE_PREFIX) {
        let mut fields = rest.splitn(3, DELIMITER);
        let action = fields.next().unwrap_or_default();
        let Some(filename) = fields.next() else {
            return TaskAction::FileMalformed;
        };
        let content = fields.next().unwrap_or_default();
        return match action {
            "create" => TaskAction::FileCreate { filename, content },
            "read" => TaskAction::FileRead { filename },
            other => TaskAction::FileUnknown { action: other },
        };
    }
    if let Some(query) = task.strip_prefix(WEB_PREFIX) {
        return TaskAction::Web { query };
    }
    TaskAction::Plain(task)
}

/// Flatten `text` onto one line.
///
/// Embedded CR/LF become spaces and surrounding whitespace is trimmed. Returns
/// `None` when nothing is left.
pub fn single_line(text: &str) -> Option<String> {
    let line: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(line.to_string())
}

/// Normalize a candidate task into a single persisted line.
///
/// Like [`single_line`], but text starting with the operator-memory prefix is
/// dropped too: the queue store would never hand it back as a task.
pub fn sanitize(task: &str) -> Option<String> {
    single_line(task).filter(|line| !is_memory_entry(line))
}

/// Sanitize a batch, dropping entries that end up empty. Order is preserved.
pub fn sanitize_all<I, S>(tasks: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tasks
        .into_iter()
        .filter_map(|task| sanitize(task.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_create_rejoins_content_delimiters() {
        assert_eq!(
            classify("FILE#create#notes.txt#a#b#c"),
            TaskAction::FileCreate {
                filename: "notes.txt",
                content: "a#b#c"
            }
        );
    }

    #[test]
    fn file_create_without_content_is_empty_file() {
        assert_eq!(
            classify("FILE#create#empty.txt"),
            TaskAction::FileCreate {
                filename: "empty.txt",
                content: ""
            }
        );
    }

    #[test]
    fn file_read_ignores_trailing_fields() {
        assert_eq!(
            classify("FILE#read#hello.txt#ignored"),
            TaskAction::FileRead {
                filename: "hello.txt"
            }
        );
    }

    #[test]
    fn unknown_and_malformed_file_actions() {
        assert_eq!(
            classify("FILE#delete#x.txt"),
            TaskAction::FileUnknown { action: "delete" }
        );
        assert_eq!(classify("FILE#create"), TaskAction::FileMalformed);
        assert_eq!(classify("FILE#"), TaskAction::FileMalformed);
    }

    #[test]
    fn web_query_keeps_everything_after_first_delimiter() {
        assert_eq!(
            classify("WEB#climate change 2024#impact"),
            TaskAction::Web {
                query: "climate change 2024#impact"
            }
        );
    }

    #[test]
    fn prefixes_are_case_sensitive() {
        assert_eq!(classify("file#read#x"), TaskAction::Plain("file#read#x"));
        assert_eq!(classify("Web#query"), TaskAction::Plain("Web#query"));
        assert_eq!(
            classify("Write a poem"),
            TaskAction::Plain("Write a poem")
        );
    }

    #[test]
    fn sanitize_flattens_newlines_and_drops_blank() {
        assert_eq!(
            sanitize("  first\nsecond\r\n").as_deref(),
            Some("first second")
        );
        assert_eq!(sanitize(" \n\t "), None);
        assert_eq!(sanitize_all(["a", "", "b\nc"]), vec!["a", "b c"]);
    }

    #[test]
    fn sanitize_drops_memory_prefixed_lines() {
        assert_eq!(sanitize("USERINPUT#look this up"), None);
        assert_eq!(
            single_line(" USERINPUT#look\nthis up ").as_deref(),
            Some("USERINPUT#look this up")
        );
        assert_eq!(
            sanitize_all(["USERINPUT#2025-01-01 00:00:00#=note", "real task"]),
            vec!["real task"]
        );
        assert_eq!(sanitize("userinput#lowercase").as_deref(), Some("userinput#lowercase"));
    }
}
