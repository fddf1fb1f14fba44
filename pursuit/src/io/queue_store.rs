//! File-backed task queue with a side-channel of operator-memory entries.
//!
//! The store is a flat text file, one entry per line. Lines starting with
//! `USERINPUT#` are operator-memory entries: they are kept verbatim across every
//! rewrite but never surface as executable tasks. Everything else is a task, in
//! execution order (head runs next).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDateTime;
use tracing::debug;

use super::atomic::write_atomic;
use crate::core::operator::{MEMORY_PREFIX, is_memory_entry, memory_entry};

/// Ordered task persistence. Performs no dedup or reordering on `save`/`load`.
#[derive(Debug, Clone)]
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    /// Open the store at `path`, creating an empty file when it is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create directory {}", parent.display()))?;
            }
            fs::write(&path, "").with_context(|| format!("create queue {}", path.display()))?;
            debug!(path = %path.display(), "created empty queue store");
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Executable tasks in order; memory entries are excluded.
    pub fn load(&self) -> Result<Vec<String>> {
        Ok(self
            .read_lines()?
            .into_iter()
            .filter(|line| !is_memory_entry(line))
            .collect())
    }

    /// Operator-memory entries in the order they were recorded.
    pub fn memory_entries(&self) -> Result<Vec<String>> {
        Ok(self
            .read_lines()?
            .into_iter()
            .filter(|line| is_memory_entry(line))
            .collect())
    }

    /// Raw store content (memory entries and tasks) used as collaborator context.
    pub fn snapshot(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err).with_context(|| format!("read queue {}", self.path.display())),
        }
    }

    /// Atomically replace the task list, keeping memory entries ahead of it.
    ///
    /// Fails without writing when a task starts with the memory-entry prefix,
    /// since `load` would never return it as a task.
    pub fn save(&self, tasks: &[String]) -> Result<()> {
        if let Some(reserved) = tasks.iter().find(|task| is_memory_entry(task)) {
            return Err(anyhow!(
                "task '{reserved}' starts with the reserved {MEMORY_PREFIX} prefix"
            ));
        }
        let memory = self.memory_entries()?;
        self.write_entries(&memory, tasks)
    }

    /// Append one task. With `dedup`, an identical queued task makes this a no-op.
    ///
    /// Returns whether the task was added.
    pub fn push_task(&self, task: &str, dedup: bool) -> Result<bool> {
        let mut tasks = self.load()?;
        if dedup && tasks.iter().any(|queued| queued == task) {
            debug!(task, "skipping duplicate task");
            return Ok(false);
        }
        tasks.push(task.to_string());
        self.save(&tasks)?;
        Ok(true)
    }

    /// Append a batch of tasks without deduplication.
    pub fn extend_tasks(&self, new_tasks: &[String]) -> Result<()> {
        let mut tasks = self.load()?;
        tasks.extend_from_slice(new_tasks);
        self.save(&tasks)
    }

    /// Remove and return the head task, persisting the removal.
    pub fn pop_next(&self) -> Result<Option<String>> {
        let mut tasks = self.load()?;
        if tasks.is_empty() {
            return Ok(None);
        }
        let next = tasks.remove(0);
        self.save(&tasks)?;
        Ok(Some(next))
    }

    /// Record an operator line as a timestamped memory entry. Returns the entry.
    pub fn record_operator_input(&self, text: &str, at: NaiveDateTime) -> Result<String> {
        let entry = memory_entry(text, at);
        let mut memory = self.memory_entries()?;
        memory.push(entry.clone());
        let tasks = self.load()?;
        self.write_entries(&memory, &tasks)?;
        Ok(entry)
    }

    /// Truncate the store: tasks and memory entries alike.
    pub fn clear(&self) -> Result<()> {
        write_atomic(&self.path, "")
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        let contents = self.snapshot()?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn write_entries(&self, memory: &[String], tasks: &[String]) -> Result<()> {
        let mut buf = String::new();
        for line in memory.iter().chain(tasks) {
            buf.push_str(line);
            buf.push('\n');
        }
        debug!(
            path = %self.path.display(),
            memory = memory.len(),
            tasks = tasks.len(),
            "writing queue store"
        );
        write_atomic(&self.path, &buf)
    }
}
