//! Summary of the most recent run (`.pursuit/last_run.json`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::atomic::write_atomic;
use crate::looping::LoopOutcome;

/// Persisted record of how a run ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub objective: String,
    /// Terminal state (`operator_quit`, `goal_satisfied`, `exhausted`, `budget_exhausted`).
    pub stop: String,
    pub tasks_completed: u32,
    pub iterations: u32,
    pub max_iterations: u32,
    pub started_at: String,
    pub ended_at: String,
}

impl RunSummary {
    pub fn from_outcome(
        objective: &str,
        outcome: &LoopOutcome,
        started_at: String,
        ended_at: String,
    ) -> Self {
        Self {
            objective: objective.to_string(),
            stop: outcome.stop.as_str().to_string(),
            tasks_completed: outcome.tasks_completed,
            iterations: outcome.iterations,
            max_iterations: outcome.max_iterations,
            started_at,
            ended_at,
        }
    }
}

/// Load the last run summary from disk.
pub fn load_run_summary(path: &Path) -> Result<RunSummary> {
    debug!(path = %path.display(), "loading run summary");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read run summary {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parse run summary {}", path.display()))
}

/// Atomically write the run summary to disk (temp file + rename).
pub fn write_run_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    debug!(path = %path.display(), stop = %summary.stop, "writing run summary");
    let mut buf = serde_json::to_string_pretty(summary)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::looping::LoopStop;

    #[test]
    fn summary_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("last_run.json");
        let outcome = LoopOutcome {
            stop: LoopStop::GoalSatisfied,
            tasks_completed: 3,
            iterations: 4,
            max_iterations: 40,
        };
        let summary = RunSummary::from_outcome(
            "write hello world",
            &outcome,
            "2025-01-01 00:00:00".to_string(),
            "2025-01-01 00:01:00".to_string(),
        );

        write_run_summary(&path, &summary).expect("write");
        let loaded = load_run_summary(&path).expect("load");

        assert_eq!(loaded, summary);
        assert_eq!(loaded.stop, "goal_satisfied");
        assert_eq!(loaded.max_iterations, 40);
    }
}
