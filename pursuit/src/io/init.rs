//! Canonical `.pursuit/` layout and `pursuit init` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use super::config::{PursuitConfig, write_config};

/// All canonical paths within `.pursuit/` for a project root.
#[derive(Debug, Clone)]
pub struct PursuitPaths {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    /// Short-term memory: queued tasks plus operator-memory entries.
    pub queue_path: PathBuf,
    /// Long-term memory: accumulated insights.
    pub insights_path: PathBuf,
    pub run_log_path: PathBuf,
    pub last_run_path: PathBuf,
}

impl PursuitPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state_dir = root.join(".pursuit");
        Self {
            root: root.clone(),
            state_dir: state_dir.clone(),
            config_path: state_dir.join("config.toml"),
            queue_path: state_dir.join("short_term_memory.txt"),
            insights_path: state_dir.join("long_term_memory.txt"),
            run_log_path: state_dir.join("logs.txt"),
            last_run_path: state_dir.join("last_run.json"),
        }
    }
}

/// Options for `init_workspace`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite the existing config and empty the queue.
    pub force: bool,
}

/// Create `.pursuit/` scaffolding in `root`.
///
/// Fails if `.pursuit/` already exists unless `options.force` is set. The insight
/// log is never truncated, even with `force`.
pub fn init_workspace(root: &Path, options: &InitOptions) -> Result<PursuitPaths> {
    let paths = PursuitPaths::new(root);
    if paths.state_dir.exists() && !paths.state_dir.is_dir() {
        return Err(anyhow!("pursuit init: .pursuit exists but is not a directory"));
    }
    if paths.state_dir.exists() && !options.force {
        return Err(anyhow!(
            "pursuit init: .pursuit already exists (use --force to overwrite)"
        ));
    }

    debug!(root = %root.display(), force = options.force, "initializing workspace");
    fs::create_dir_all(&paths.state_dir)
        .with_context(|| format!("create {}", paths.state_dir.display()))?;
    write_config(&paths.config_path, &PursuitConfig::default())?;
    fs::write(&paths.queue_path, "")
        .with_context(|| format!("write {}", paths.queue_path.display()))?;
    if !paths.insights_path.exists() {
        fs::write(&paths.insights_path, "")
            .with_context(|| format!("write {}", paths.insights_path.display()))?;
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_stable() {
        let paths = PursuitPaths::new("/project");
        assert!(paths.config_path.ends_with(".pursuit/config.toml"));
        assert!(paths.queue_path.ends_with(".pursuit/short_term_memory.txt"));
        assert!(paths.insights_path.ends_with(".pursuit/long_term_memory.txt"));
        assert!(paths.run_log_path.ends_with(".pursuit/logs.txt"));
        assert!(paths.last_run_path.ends_with(".pursuit/last_run.json"));
    }

    #[test]
    fn init_refuses_existing_without_force() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_workspace(temp.path(), &InitOptions { force: false }).expect("first init");

        let err = init_workspace(temp.path(), &InitOptions { force: false }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn forced_init_keeps_insights() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path(), &InitOptions { force: false }).expect("init");
        fs::write(&paths.insights_path, "- kept\n\n").expect("write insights");
        fs::write(&paths.queue_path, "stale task\n").expect("write queue");

        init_workspace(temp.path(), &InitOptions { force: true }).expect("force init");

        assert_eq!(
            fs::read_to_string(&paths.insights_path).expect("read"),
            "- kept\n\n"
        );
        assert_eq!(fs::read_to_string(&paths.queue_path).expect("read"), "");
        assert!(paths.config_path.is_file());
    }
}
