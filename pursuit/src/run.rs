//! Orchestration for `pursuit run`.
//!
//! A run loads configuration, checks that the model is present and answers a
//! one-token prompt, applies the queue
//! policy, then drives the loop with model-backed collaborators and local
//! actuators while a background thread feeds operator lines. Setup failures are
//! returned before the loop starts; once it starts, the run always reaches a
//! terminal state and records it in `.pursuit/last_run.json`.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info};

use crate::agents::Collaborators;
use crate::agents::model::ModelAgents;
use crate::io::actuators::{Actuators, CommandSearcher, LocalActuators};
use crate::io::config::{QueuePolicy, load_config};
use crate::io::init::PursuitPaths;
use crate::io::input::{InputChannel, OperatorInput};
use crate::io::model::{CommandGenerator, ensure_model_present, smoke_test};
use crate::io::run_log::RunLog;
use crate::io::run_state::{RunSummary, write_run_summary};
use crate::io::workspace::Workspace;
use crate::looping::{LoopEvent, LoopSettings, run_loop};

/// Objective used when none is given on the command line.
pub const DEFAULT_OBJECTIVE: &str =
    "understand what you are and your limitations, also how could you be improved.";

/// Inputs of `pursuit run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub objective: String,
    pub model_path: PathBuf,
    /// Overrides `max_iterations` from the config file.
    pub max_iterations: Option<u32>,
}

/// Run a full session in `root`, reading operator lines from `operator`.
pub fn run_session<R, F>(
    root: &Path,
    options: &RunOptions,
    operator: R,
    on_event: F,
) -> Result<RunSummary>
where
    R: BufRead + Send + 'static,
    F: FnMut(&LoopEvent),
{
    let paths = PursuitPaths::new(root);
    let mut config = load_config(&paths.config_path)?;
    if let Some(max_iterations) = options.max_iterations {
        config.max_iterations = max_iterations;
        config.validate().context("invalid --max-iterations")?;
    }
    let generator = CommandGenerator::new(&config.model, &options.model_path);
    if let Err(err) =
        ensure_model_present(&options.model_path).and_then(|()| smoke_test(&generator))
    {
        RunLog::new(&paths.run_log_path).record(&format!("{err:#}"));
        return Err(err);
    }

    let workspace = Workspace::open(root)?;
    let agents = ModelAgents::new(generator)?.with_insight_log(workspace.insights.clone());
    let actuators = LocalActuators::new(
        root.join(&config.workspace_dir),
        CommandSearcher::new(&config.search),
    );
    let settings = LoopSettings::from_config(options.objective.as_str(), &config);

    let mut input = InputChannel::spawn(operator, config.input_buffer)?;
    let summary = pursue(
        &workspace,
        &agents,
        &actuators,
        &mut input,
        &settings,
        config.queue_policy,
        on_event,
    );
    input.cancel();
    summary
}

/// Apply `policy`, run the loop to a terminal state, and persist the run summary.
pub fn pursue<C, A, I, F>(
    workspace: &Workspace,
    collaborators: &C,
    actuators: &A,
    input: &mut I,
    settings: &LoopSettings,
    policy: QueuePolicy,
    on_event: F,
) -> Result<RunSummary>
where
    C: Collaborators + ?Sized,
    A: Actuators + ?Sized,
    I: OperatorInput + ?Sized,
    F: FnMut(&LoopEvent),
{
    let started_at = Local::now().to_rfc3339();
    info!(objective = %settings.objective, "starting run");
    workspace
        .run_log
        .record(&format!("Starting run with objective: {}", settings.objective));

    match policy {
        QueuePolicy::Reset => workspace.reset_queue().context("reset queue")?,
        QueuePolicy::Resume => debug!("resuming queue from previous run"),
    }

    let outcome = run_loop(workspace, collaborators, actuators, input, settings, on_event);

    workspace.run_log.record(&format!(
        "End of run. Tasks completed: {}",
        outcome.tasks_completed
    ));
    let summary = RunSummary::from_outcome(
        &settings.objective,
        &outcome,
        started_at,
        Local::now().to_rfc3339(),
    );
    write_run_summary(&workspace.paths.last_run_path, &summary)?;
    info!(
        stop = %outcome.stop,
        tasks_completed = outcome.tasks_completed,
        iterations = outcome.iterations,
        "run finished"
    );
    Ok(summary)
}
