//! Run context: paths plus the stores the loop owns for one run.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use super::init::PursuitPaths;
use super::insight_log::InsightLog;
use super::queue_store::QueueStore;
use super::run_log::RunLog;

/// Everything file-backed that a run touches, constructed once per run.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub paths: PursuitPaths,
    pub queue: QueueStore,
    pub insights: InsightLog,
    pub run_log: RunLog,
}

impl Workspace {
    /// Open the stores under `<root>/.pursuit/`, creating the queue file if missing.
    pub fn open(root: &Path) -> Result<Self> {
        let paths = PursuitPaths::new(root);
        debug!(state_dir = %paths.state_dir.display(), "opening workspace");
        let queue = QueueStore::open(&paths.queue_path)?;
        let insights = InsightLog::new(&paths.insights_path);
        let run_log = RunLog::new(&paths.run_log_path);
        Ok(Self {
            paths,
            queue,
            insights,
            run_log,
        })
    }

    /// Clear the queue store, recording what was dropped in the run log first.
    pub fn reset_queue(&self) -> Result<()> {
        let current = self.queue.snapshot()?;
        if !current.trim().is_empty() {
            self.run_log.record("=== Clearing Short-Term Memory ===");
            self.run_log.record("Content before clearing:");
            for line in current.lines() {
                self.run_log.record(line);
            }
            self.run_log.record("=================================");
        }
        self.queue.clear()
    }
}
