//! Side-effect handlers behind structured tasks: local files and web search.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::io::config::SearchConfig;
use crate::io::process::{command_from_args, render_args, run_command};

/// Handlers for `FILE#` and `WEB#` tasks.
pub trait Actuators {
    /// Run a web search and return its textual results.
    fn search(&self, query: &str) -> Result<String>;
    /// Create or overwrite `name` with `content`, returning a status message.
    fn write_file(&self, name: &str, content: &str) -> Result<String>;
    /// Return the content of `name`, or a not-found message.
    fn read_file(&self, name: &str) -> Result<String>;
}

/// Actuators confined to a workspace directory, with a command-backed search.
#[derive(Debug, Clone)]
pub struct LocalActuators {
    workspace_dir: PathBuf,
    searcher: CommandSearcher,
}

impl LocalActuators {
    pub fn new(workspace_dir: impl Into<PathBuf>, searcher: CommandSearcher) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
            searcher,
        }
    }

    /// Resolve a task-supplied file name inside the workspace.
    ///
    /// Absolute paths and `..` components are rejected.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("file name must not be empty"));
        }
        let relative = Path::new(name);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(anyhow!(
                        "file name '{name}' must stay inside the workspace"
                    ));
                }
            }
        }
        Ok(self.workspace_dir.join(relative))
    }
}

impl Actuators for LocalActuators {
    fn search(&self, query: &str) -> Result<String> {
        self.searcher.search(query)
    }

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    fn write_file(&self, name: &str, content: &str) -> Result<String> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("create file '{name}'"))?;
        debug!(path = %path.display(), "file written");
        Ok(format!("File '{name}' created/updated successfully."))
    }

    #[instrument(skip(self))]
    fn read_file(&self, name: &str) -> Result<String> {
        let path = self.resolve(name)?;
        if !path.exists() {
            return Ok(format!("File '{name}' does not exist."));
        }
        let data = fs::read_to_string(&path).with_context(|| format!("read file '{name}'"))?;
        debug!(path = %path.display(), len = data.len(), "file read");
        Ok(data)
    }
}

/// Web search through an external command (`{query}` placeholder in argv).
#[derive(Debug, Clone)]
pub struct CommandSearcher {
    command: Vec<String>,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl CommandSearcher {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
            output_limit_bytes: config.output_limit_bytes,
        }
    }

    #[instrument(skip(self))]
    pub fn search(&self, query: &str) -> Result<String> {
        if self.command.is_empty() {
            return Ok(format!(
                "Web search unavailable (no search command configured); query was: {query}"
            ));
        }
        let argv = render_args(&self.command, &[("query", query)]);
        let cmd = command_from_args(&argv)?;
        let output = run_command(cmd, None, self.timeout, self.output_limit_bytes)
            .context("run search command")?;
        if output.timed_out {
            return Err(anyhow!("search timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "search command failed");
            return Err(anyhow!(
                "search command failed with status {:?}: {}",
                output.status.code(),
                output.stderr_tail(5)
            ));
        }
        let results = output.stdout_lossy().trim().to_string();
        if results.is_empty() {
            return Ok(format!("No results for '{query}'."));
        }
        Ok(results)
    }
}
