//! Append-only long-term memory of insights.
//!
//! Blocks are separated by one blank line. Nothing in the loop ever truncates it.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::response::resolve_insight;

#[derive(Debug, Clone)]
pub struct InsightLog {
    path: PathBuf,
}

impl InsightLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an insight block followed by a blank line.
    ///
    /// Blank text and blocks reporting no new insights are ignored. Returns whether
    /// anything was written.
    pub fn append(&self, text: &str) -> Result<bool> {
        let Some(block) = resolve_insight(text) else {
            debug!("no insight to append");
            return Ok(false);
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open insight log {}", self.path.display()))?;
        write!(file, "{block}\n\n")
            .with_context(|| format!("append insight log {}", self.path.display()))?;
        debug!(path = %self.path.display(), bytes = block.len(), "insight appended");
        Ok(true)
    }

    /// Full log content, or empty when the log does not exist yet.
    pub fn read(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(err) => {
                Err(err).with_context(|| format!("read insight log {}", self.path.display()))
            }
        }
    }
}
