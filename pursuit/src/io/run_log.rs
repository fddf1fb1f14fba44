//! Timestamped product log of runs (`.pursuit/logs.txt`).
//!
//! Unlike tracing, this log is always written and is meant for the operator. It
//! rotates by size: `logs.txt` → `logs.txt.1` → `logs.txt.2`, oldest dropped.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::warn;

const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_BACKUPS: u32 = 2;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    max_bytes: u64,
    backups: u32,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_rotation(path, DEFAULT_MAX_BYTES, DEFAULT_BACKUPS)
    }

    pub fn with_rotation(path: impl Into<PathBuf>, max_bytes: u64, backups: u32) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            backups,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `[timestamp] message`, rotating first when the log is full.
    pub fn write(&self, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        self.rotate_if_full()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open run log {}", self.path.display()))?;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        writeln!(file, "[{timestamp}] {message}")
            .with_context(|| format!("append run log {}", self.path.display()))
    }

    /// Like [`RunLog::write`], but a failure only warns: logging never stops a run.
    pub fn record(&self, message: &str) {
        if let Err(err) = self.write(message) {
            warn!(err = %format!("{err:#}"), "failed to write run log");
        }
    }

    fn rotate_if_full(&self) -> Result<()> {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(()),
        };
        if size < self.max_bytes {
            return Ok(());
        }
        if self.backups == 0 {
            return fs::remove_file(&self.path)
                .with_context(|| format!("truncate run log {}", self.path.display()));
        }
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                let to = self.backup_path(index + 1);
                fs::rename(&from, &to)
                    .with_context(|| format!("rotate {} to {}", from.display(), to.display()))?;
            }
        }
        let first = self.backup_path(1);
        fs::rename(&self.path, &first)
            .with_context(|| format!("rotate {} to {}", self.path.display(), first.display()))
    }

    fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }
}
