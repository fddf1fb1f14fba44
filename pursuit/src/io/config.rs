//! Pursuit configuration stored under `.pursuit/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::atomic::write_atomic;

/// What happens to the persisted queue when a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuePolicy {
    /// Clear tasks and memory entries (logging what was dropped).
    Reset,
    /// Keep whatever a previous run left behind.
    Resume,
}

/// How operator task lines are merged into the queue store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorInputMode {
    /// Append the line as an executable task.
    Task,
    /// Record the line as a timestamped `USERINPUT#` memory entry.
    Memory,
}

/// Pursuit configuration (TOML).
///
/// Missing fields fall back to defaults, so a partial file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PursuitConfig {
    /// Iteration budget per run.
    pub max_iterations: u32,

    pub queue_policy: QueuePolicy,

    pub operator_input: OperatorInputMode,

    /// Drop operator tasks that are already queued verbatim.
    pub dedup_operator_tasks: bool,

    /// Capacity of the operator input channel.
    pub input_buffer: usize,

    /// Directory `FILE#` tasks read and write in, relative to the project root.
    pub workspace_dir: PathBuf,

    pub model: ModelConfig,

    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Generation command. The prompt is written to stdin; `{model_path}`,
    /// `{max_tokens}`, `{temperature}`, `{top_p}` and `{top_k}` are substituted.
    pub command: Vec<String>,

    /// Kill a generation after this many seconds. Unset waits forever.
    pub timeout_secs: Option<u64>,

    /// Keep at most this many bytes of generated output.
    pub output_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Search command with a `{query}` placeholder. Empty disables web search.
    pub command: Vec<String>,

    pub timeout_secs: Option<u64>,

    pub output_limit_bytes: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            command: [
                "llama-cli",
                "--model",
                "{model_path}",
                "--n-predict",
                "{max_tokens}",
                "--temp",
                "{temperature}",
                "--top-p",
                "{top_p}",
                "--top-k",
                "{top_k}",
                "--ctx-size",
                "2048",
                "--n-gpu-layers",
                "30",
                "--no-display-prompt",
                "--no-conversation",
                "--file",
                "/dev/stdin",
            ]
            .iter()
            .map(|arg| arg.to_string())
            .collect(),
            timeout_secs: None,
            output_limit_bytes: 64_000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: Some(30),
            output_limit_bytes: 16_000,
        }
    }
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 40,
            queue_policy: QueuePolicy::Reset,
            operator_input: OperatorInputMode::Task,
            dedup_operator_tasks: true,
            input_buffer: 64,
            workspace_dir: PathBuf::from("."),
            model: ModelConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl PursuitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be > 0"));
        }
        if self.input_buffer == 0 {
            return Err(anyhow!("input_buffer must be > 0"));
        }
        if self.model.command.is_empty() || self.model.command[0].trim().is_empty() {
            return Err(anyhow!("model.command must be a non-empty array"));
        }
        if self.model.timeout_secs == Some(0) {
            return Err(anyhow!("model.timeout_secs must be > 0 when set"));
        }
        if self.model.output_limit_bytes == 0 {
            return Err(anyhow!("model.output_limit_bytes must be > 0"));
        }
        if let Some(program) = self.search.command.first()
            && program.trim().is_empty()
        {
            return Err(anyhow!("search.command must start with a program"));
        }
        if self.search.timeout_secs == Some(0) {
            return Err(anyhow!("search.timeout_secs must be > 0 when set"));
        }
        if self.search.output_limit_bytes == 0 {
            return Err(anyhow!("search.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PursuitConfig::default()`.
pub fn load_config(path: &Path) -> Result<PursuitConfig> {
    if !path.exists() {
        let cfg = PursuitConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PursuitConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PursuitConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PursuitConfig::default());
        assert_eq!(cfg.max_iterations, 40);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = PursuitConfig {
            queue_policy: QueuePolicy::Resume,
            operator_input: OperatorInputMode::Memory,
            search: SearchConfig {
                command: vec!["ddgr".to_string(), "{query}".to_string()],
                ..SearchConfig::default()
            },
            ..PursuitConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "max_iterations = 5\nqueue_policy = \"resume\"\n\n[model]\ntimeout_secs = 90\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.max_iterations, 5);
        assert_eq!(cfg.queue_policy, QueuePolicy::Resume);
        assert_eq!(cfg.model.timeout_secs, Some(90));
        assert_eq!(cfg.model.command, ModelConfig::default().command);
        assert!(cfg.dedup_operator_tasks);
    }

    #[test]
    fn validate_rejects_zero_budget_and_empty_command() {
        let cfg = PursuitConfig {
            max_iterations: 0,
            ..PursuitConfig::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = PursuitConfig::default();
        cfg.model.command.clear();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("model.command"));
    }
}
