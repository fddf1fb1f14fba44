//! The objective pursuit loop.
//!
//! Each iteration drains operator input, refills an empty queue, ranks it, pops
//! and dispatches the head task, records an insight, then re-checks the goal.
//! Collaborator failures abandon the current iteration only; the run ends on an
//! operator quit, a satisfied goal, an exhausted task supply, or the iteration
//! budget.

use std::fmt;

use anyhow::Result;
use chrono::Local;
use tracing::{debug, info, instrument, warn};

use crate::agents::Collaborators;
use crate::core::budget::IterationBudget;
use crate::core::operator::{OperatorLine, classify_line};
use crate::core::ranking::ranked_or_original;
use crate::core::task::{sanitize_all, single_line};
use crate::dispatch::dispatch;
use crate::io::actuators::Actuators;
use crate::io::config::{OperatorInputMode, PursuitConfig};
use crate::io::input::OperatorInput;
use crate::io::run_log::RunLog;
use crate::io::workspace::Workspace;

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStop {
    /// The operator typed `quit` or `exit`.
    OperatorQuit,
    /// The goal check reported the objective as met.
    GoalSatisfied,
    /// No tasks were left, none could be created, and the goal is unmet.
    Exhausted,
    /// The iteration budget ran out first.
    BudgetExhausted,
}

impl LoopStop {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopStop::OperatorQuit => "operator_quit",
            LoopStop::GoalSatisfied => "goal_satisfied",
            LoopStop::Exhausted => "exhausted",
            LoopStop::BudgetExhausted => "budget_exhausted",
        }
    }
}

impl fmt::Display for LoopStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub stop: LoopStop,
    pub tasks_completed: u32,
    pub iterations: u32,
    pub max_iterations: u32,
}

/// Per-run knobs for `run_loop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    pub objective: String,
    pub max_iterations: u32,
    pub operator_input: OperatorInputMode,
    pub dedup_operator_tasks: bool,
    /// Ask the generator for initial tasks before the first iteration when the
    /// queue holds none.
    pub seed_initial_tasks: bool,
}

impl LoopSettings {
    pub fn from_config(objective: impl Into<String>, config: &PursuitConfig) -> Self {
        Self {
            objective: objective.into(),
            max_iterations: config.max_iterations,
            operator_input: config.operator_input,
            dedup_operator_tasks: config.dedup_operator_tasks,
            seed_initial_tasks: true,
        }
    }
}

/// Observable progress of a run. Each event is also written to the run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    Seeded { tasks: Vec<String> },
    SeedFailed { error: String },
    IterationStarted { iteration: u32, max_iterations: u32 },
    OperatorTask { task: String, added: bool },
    OperatorMemory { entry: String },
    OperatorInputFailed { line: String, error: String },
    InputClosed,
    OperatorQuit,
    TasksCreated { tasks: Vec<String> },
    NoNewTasks,
    Ranked { tasks: Vec<String>, fell_back: bool },
    TaskStarted { task: String },
    TaskFinished { task: String, result: String },
    InsightStored { insight: String },
    NoInsight,
    InsightFailed { error: String },
    GoalChecked { satisfied: bool },
    IterationFailed { iteration: u32, error: String },
    Stopped { stop: LoopStop, tasks_completed: u32 },
}

impl fmt::Display for LoopEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopEvent::Seeded { tasks } => write!(f, "Initial tasks: {tasks:?}"),
            LoopEvent::SeedFailed { error } => write!(f, "Initial task creation failed: {error}"),
            LoopEvent::IterationStarted {
                iteration,
                max_iterations,
            } => write!(f, "Iteration {iteration}/{max_iterations}"),
            LoopEvent::OperatorTask { task, added: true } => {
                write!(f, "Operator task queued: {task}")
            }
            LoopEvent::OperatorTask { task, added: false } => {
                write!(f, "Operator task already queued: {task}")
            }
            LoopEvent::OperatorMemory { entry } => write!(f, "Logged user input: {entry}"),
            LoopEvent::OperatorInputFailed { line, error } => {
                write!(f, "Could not record operator input '{line}': {error}")
            }
            LoopEvent::InputClosed => write!(f, "Operator input closed; continuing autonomously"),
            LoopEvent::OperatorQuit => write!(f, "Stopping upon operator request"),
            LoopEvent::TasksCreated { tasks } => write!(f, "New tasks created: {tasks:?}"),
            LoopEvent::NoNewTasks => write!(f, "No tasks left and none created"),
            LoopEvent::Ranked {
                tasks,
                fell_back: false,
            } => write!(f, "Prioritized tasks: {tasks:?}"),
            LoopEvent::Ranked {
                tasks,
                fell_back: true,
            } => write!(
                f,
                "Prioritization returned nothing; keeping {} tasks in their current order",
                tasks.len()
            ),
            LoopEvent::TaskStarted { task } => write!(f, "Executing task: {task}"),
            LoopEvent::TaskFinished { result, .. } => write!(f, "Task result: {result}"),
            LoopEvent::InsightStored { insight } => write!(f, "Stored in LTM:\n{insight}"),
            LoopEvent::NoInsight => write!(f, "No new insights to store"),
            LoopEvent::InsightFailed { error } => write!(f, "Insight extraction failed: {error}"),
            LoopEvent::GoalChecked { satisfied: true } => write!(f, "Objective met"),
            LoopEvent::GoalChecked { satisfied: false } => write!(f, "Objective not met yet"),
            LoopEvent::IterationFailed { iteration, error } => {
                write!(f, "Iteration {iteration} abandoned: {error}")
            }
            LoopEvent::Stopped {
                stop,
                tasks_completed,
            } => write!(f, "Run stopped ({stop}). Tasks completed: {tasks_completed}"),
        }
    }
}

/// What the iteration decided about the run.
enum Step {
    Continue,
    Stop(LoopStop),
}

/// Mirrors events into the run log before handing them to the observer.
struct Reporter<'a, F> {
    run_log: &'a RunLog,
    on_event: F,
}

impl<F: FnMut(&LoopEvent)> Reporter<'_, F> {
    fn emit(&mut self, event: LoopEvent) {
        self.run_log.record(&event.to_string());
        (self.on_event)(&event);
    }
}

/// Progress carried across iterations.
#[derive(Debug, Default)]
struct Progress {
    tasks_completed: u32,
    input_closed: bool,
}

/// Drive the pursuit loop until one of the terminal states is reached.
///
/// Never fails: persistence and collaborator errors are logged and the current
/// iteration is abandoned.
#[instrument(skip_all, fields(max_iterations = settings.max_iterations))]
pub fn run_loop<C, A, I, F>(
    workspace: &Workspace,
    collaborators: &C,
    actuators: &A,
    input: &mut I,
    settings: &LoopSettings,
    on_event: F,
) -> LoopOutcome
where
    C: Collaborators + ?Sized,
    A: Actuators + ?Sized,
    I: OperatorInput + ?Sized,
    F: FnMut(&LoopEvent),
{
    let mut reporter = Reporter {
        run_log: &workspace.run_log,
        on_event,
    };
    let mut budget = IterationBudget::new(settings.max_iterations);
    let mut progress = Progress::default();

    if settings.seed_initial_tasks {
        seed_tasks(workspace, collaborators, settings, &mut reporter);
    }

    let stop = loop {
        let Some(iteration) = budget.next_iteration() else {
            info!(max_iterations = budget.max(), "iteration budget exhausted");
            break LoopStop::BudgetExhausted;
        };
        reporter.emit(LoopEvent::IterationStarted {
            iteration,
            max_iterations: budget.max(),
        });

        let step = run_iteration(
            workspace,
            collaborators,
            actuators,
            input,
            settings,
            &mut progress,
            &mut reporter,
        );
        match step {
            Ok(Step::Continue) => {}
            Ok(Step::Stop(stop)) => break stop,
            Err(err) => {
                warn!(iteration, err = %format!("{err:#}"), "iteration abandoned");
                reporter.emit(LoopEvent::IterationFailed {
                    iteration,
                    error: format!("{err:#}"),
                });
            }
        }
    };

    reporter.emit(LoopEvent::Stopped {
        stop,
        tasks_completed: progress.tasks_completed,
    });
    LoopOutcome {
        stop,
        tasks_completed: progress.tasks_completed,
        iterations: budget.used(),
        max_iterations: budget.max(),
    }
}

fn seed_tasks<C, F>(
    workspace: &Workspace,
    collaborators: &C,
    settings: &LoopSettings,
    reporter: &mut Reporter<'_, F>,
) where
    C: Collaborators + ?Sized,
    F: FnMut(&LoopEvent),
{
    if !load_tasks(workspace).is_empty() {
        debug!("queue already holds tasks; skipping seeding");
        return;
    }
    let seeded = collaborators
        .generate_tasks(&settings.objective, &load_context(workspace))
        .map(sanitize_all)
        .and_then(|tasks| {
            workspace.queue.save(&tasks)?;
            Ok(tasks)
        });
    match seeded {
        Ok(tasks) => reporter.emit(LoopEvent::Seeded { tasks }),
        Err(err) => {
            warn!(err = %format!("{err:#}"), "initial task creation failed");
            reporter.emit(LoopEvent::SeedFailed {
                error: format!("{err:#}"),
            });
        }
    }
}

fn run_iteration<C, A, I, F>(
    workspace: &Workspace,
    collaborators: &C,
    actuators: &A,
    input: &mut I,
    settings: &LoopSettings,
    progress: &mut Progress,
    reporter: &mut Reporter<'_, F>,
) -> Result<Step>
where
    C: Collaborators + ?Sized,
    A: Actuators + ?Sized,
    I: OperatorInput + ?Sized,
    F: FnMut(&LoopEvent),
{
    // 1. Operator input.
    if let Some(stop) = drain_input(workspace, input, settings, progress, reporter) {
        return Ok(Step::Stop(stop));
    }

    // 2. Refill.
    let tasks = load_tasks(workspace);
    if tasks.is_empty() {
        let created = sanitize_all(
            collaborators.generate_tasks(&settings.objective, &load_context(workspace))?,
        );
        if created.is_empty() {
            reporter.emit(LoopEvent::NoNewTasks);
            let satisfied = collaborators.check_goal(&settings.objective)?;
            reporter.emit(LoopEvent::GoalChecked { satisfied });
            return Ok(Step::Stop(if satisfied {
                LoopStop::GoalSatisfied
            } else {
                LoopStop::Exhausted
            }));
        }
        workspace.queue.extend_tasks(&created)?;
        reporter.emit(LoopEvent::TasksCreated { tasks: created });
        return Ok(Step::Continue);
    }

    // 3. Rank.
    let ranked = ranked_or_original(&tasks, sanitize_all(collaborators.rank_tasks(&tasks)?));
    workspace.queue.save(&ranked.tasks)?;
    reporter.emit(LoopEvent::Ranked {
        tasks: ranked.tasks,
        fell_back: ranked.fell_back,
    });

    // 4. Pop and dispatch.
    let Some(task) = workspace.queue.pop_next()? else {
        debug!("no task after prioritization");
        return Ok(Step::Continue);
    };
    reporter.emit(LoopEvent::TaskStarted { task: task.clone() });
    let result = dispatch(&task, collaborators, actuators);
    progress.tasks_completed += 1;
    reporter.emit(LoopEvent::TaskFinished {
        task: task.clone(),
        result: result.clone(),
    });

    // 5. Insight.
    if let Err(err) = record_insight(workspace, collaborators, &task, &result, reporter) {
        warn!(err = %format!("{err:#}"), "insight extraction failed");
        reporter.emit(LoopEvent::InsightFailed {
            error: format!("{err:#}"),
        });
        return Ok(Step::Continue);
    }

    // 6. Goal.
    let satisfied = collaborators.check_goal(&settings.objective)?;
    reporter.emit(LoopEvent::GoalChecked { satisfied });
    if satisfied {
        return Ok(Step::Stop(LoopStop::GoalSatisfied));
    }
    Ok(Step::Continue)
}

/// Merge drained operator lines in order. Returns a stop on a control line.
fn drain_input<I, F>(
    workspace: &Workspace,
    input: &mut I,
    settings: &LoopSettings,
    progress: &mut Progress,
    reporter: &mut Reporter<'_, F>,
) -> Option<LoopStop>
where
    I: OperatorInput + ?Sized,
    F: FnMut(&LoopEvent),
{
    let drained = input.drain();
    for line in &drained.lines {
        let text = match classify_line(line) {
            OperatorLine::Control => {
                reporter.emit(LoopEvent::OperatorQuit);
                return Some(LoopStop::OperatorQuit);
            }
            OperatorLine::Task(text) => text,
        };
        let Some(text) = single_line(text) else {
            continue;
        };
        let merged = match settings.operator_input {
            OperatorInputMode::Task => workspace
                .queue
                .push_task(&text, settings.dedup_operator_tasks)
                .map(|added| LoopEvent::OperatorTask {
                    task: text.clone(),
                    added,
                }),
            OperatorInputMode::Memory => workspace
                .queue
                .record_operator_input(&text, Local::now().naive_local())
                .map(|entry| LoopEvent::OperatorMemory { entry }),
        };
        match merged {
            Ok(event) => reporter.emit(event),
            Err(err) => {
                warn!(line = %text, err = %format!("{err:#}"), "failed to record operator input");
                reporter.emit(LoopEvent::OperatorInputFailed {
                    line: text,
                    error: format!("{err:#}"),
                });
            }
        }
    }
    if drained.closed && !progress.input_closed {
        progress.input_closed = true;
        reporter.emit(LoopEvent::InputClosed);
    }
    None
}

fn record_insight<C, F>(
    workspace: &Workspace,
    collaborators: &C,
    task: &str,
    result: &str,
    reporter: &mut Reporter<'_, F>,
) -> Result<()>
where
    C: Collaborators + ?Sized,
    F: FnMut(&LoopEvent),
{
    let insight = collaborators.summarize(task, result)?;
    if workspace.insights.append(&insight)? {
        reporter.emit(LoopEvent::InsightStored {
            insight: insight.trim().to_string(),
        });
    } else {
        reporter.emit(LoopEvent::NoInsight);
    }
    Ok(())
}

/// Queued tasks, treating an unreadable store as empty.
fn load_tasks(workspace: &Workspace) -> Vec<String> {
    workspace.queue.load().unwrap_or_else(|err| {
        warn!(err = %format!("{err:#}"), "queue unreadable; treating as empty");
        Vec::new()
    })
}

/// Raw store content handed to the generator, empty when unreadable.
fn load_context(workspace: &Workspace) -> String {
    workspace.queue.snapshot().unwrap_or_else(|err| {
        warn!(err = %format!("{err:#}"), "queue unreadable; generating without context");
        String::new()
    })
}
