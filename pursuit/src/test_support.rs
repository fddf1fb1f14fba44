//! Scripted collaborators, actuators, and input for tests.
//!
//! Every double answers from a queue of canned responses and records what it was
//! asked. When a queue runs dry the double falls back to a neutral answer so tests
//! only script the calls they care about.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::agents::Collaborators;
use crate::io::actuators::Actuators;
use crate::io::input::{Drained, OperatorInput};
use crate::io::model::{GenerationRequest, TextGenerator};
use crate::io::workspace::Workspace;

type Scripted<T> = RefCell<VecDeque<Result<T, String>>>;

fn next<T>(queue: &Scripted<T>) -> Option<Result<T>> {
    queue
        .borrow_mut()
        .pop_front()
        .map(|scripted| scripted.map_err(|msg| anyhow!(msg)))
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Collaborators answering from per-capability scripts.
///
/// Defaults once a script is spent: no generated tasks, ranking returns its
/// input, the goal is unmet, execution echoes the task, no insight.
#[derive(Debug, Default)]
pub struct ScriptedCollaborators {
    generated: Scripted<Vec<String>>,
    rankings: Scripted<Vec<String>>,
    goals: Scripted<bool>,
    executions: Scripted<String>,
    summaries: Scripted<String>,
    generate_calls: RefCell<Vec<(String, String)>>,
    rank_calls: RefCell<Vec<Vec<String>>>,
    goal_checks: RefCell<u32>,
    executed: RefCell<Vec<String>>,
    summarized: RefCell<Vec<(String, String)>>,
}

impl ScriptedCollaborators {
    /// Queue one batch returned by `generate_tasks`.
    pub fn with_generated(self, tasks: &[&str]) -> Self {
        self.generated.borrow_mut().push_back(Ok(owned(tasks)));
        self
    }

    pub fn with_generation_error(self, msg: &str) -> Self {
        self.generated.borrow_mut().push_back(Err(msg.to_string()));
        self
    }

    /// Queue one answer returned by `rank_tasks`.
    pub fn with_ranking(self, tasks: &[&str]) -> Self {
        self.rankings.borrow_mut().push_back(Ok(owned(tasks)));
        self
    }

    pub fn with_ranking_error(self, msg: &str) -> Self {
        self.rankings.borrow_mut().push_back(Err(msg.to_string()));
        self
    }

    /// Queue successive `check_goal` verdicts.
    pub fn with_goals(self, verdicts: &[bool]) -> Self {
        self.goals
            .borrow_mut()
            .extend(verdicts.iter().map(|verdict| Ok(*verdict)));
        self
    }

    pub fn with_goal_error(self, msg: &str) -> Self {
        self.goals.borrow_mut().push_back(Err(msg.to_string()));
        self
    }

    /// Queue successive `execute` results.
    pub fn with_executions<I, S>(self, results: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.executions
            .borrow_mut()
            .extend(results.into_iter().map(|result| Ok(result.into())));
        self
    }

    pub fn with_execution_error(self, msg: &str) -> Self {
        self.executions.borrow_mut().push_back(Err(msg.to_string()));
        self
    }

    /// Queue successive `summarize` answers.
    pub fn with_summaries<I, S>(self, insights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.summaries
            .borrow_mut()
            .extend(insights.into_iter().map(|insight| Ok(insight.into())));
        self
    }

    pub fn with_summary_error(self, msg: &str) -> Self {
        self.summaries.borrow_mut().push_back(Err(msg.to_string()));
        self
    }

    /// `(objective, context)` pairs passed to `generate_tasks`.
    pub fn generate_calls(&self) -> Vec<(String, String)> {
        self.generate_calls.borrow().clone()
    }

    pub fn rank_calls(&self) -> Vec<Vec<String>> {
        self.rank_calls.borrow().clone()
    }

    pub fn goal_checks(&self) -> u32 {
        *self.goal_checks.borrow()
    }

    /// Plain tasks handed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }

    pub fn summarized(&self) -> Vec<(String, String)> {
        self.summarized.borrow().clone()
    }
}

impl Collaborators for ScriptedCollaborators {
    fn generate_tasks(&self, objective: &str, context: &str) -> Result<Vec<String>> {
        self.generate_calls
            .borrow_mut()
            .push((objective.to_string(), context.to_string()));
        next(&self.generated).unwrap_or_else(|| Ok(Vec::new()))
    }

    fn rank_tasks(&self, tasks: &[String]) -> Result<Vec<String>> {
        self.rank_calls.borrow_mut().push(tasks.to_vec());
        next(&self.rankings).unwrap_or_else(|| Ok(tasks.to_vec()))
    }

    fn check_goal(&self, _objective: &str) -> Result<bool> {
        *self.goal_checks.borrow_mut() += 1;
        next(&self.goals).unwrap_or(Ok(false))
    }

    fn execute(&self, task: &str) -> Result<String> {
        self.executed.borrow_mut().push(task.to_string());
        next(&self.executions).unwrap_or_else(|| Ok(format!("done: {task}")))
    }

    fn summarize(&self, task: &str, result: &str) -> Result<String> {
        self.summarized
            .borrow_mut()
            .push((task.to_string(), result.to_string()));
        next(&self.summaries).unwrap_or_else(|| Ok(String::new()))
    }
}

/// In-memory actuators that record every call.
#[derive(Debug, Default)]
pub struct RecordingActuators {
    files: RefCell<BTreeMap<String, String>>,
    searches: RefCell<Vec<String>>,
    search_error: Option<String>,
}

impl RecordingActuators {
    /// Make every search fail with `msg`.
    pub fn with_search_error(mut self, msg: &str) -> Self {
        self.search_error = Some(msg.to_string());
        self
    }

    pub fn file(&self, name: &str) -> Option<String> {
        self.files.borrow().get(name).cloned()
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.borrow().clone()
    }
}

impl Actuators for RecordingActuators {
    fn search(&self, query: &str) -> Result<String> {
        self.searches.borrow_mut().push(query.to_string());
        match &self.search_error {
            Some(msg) => Err(anyhow!(msg.clone())),
            None => Ok(format!("results for {query}")),
        }
    }

    fn write_file(&self, name: &str, content: &str) -> Result<String> {
        self.files
            .borrow_mut()
            .insert(name.to_string(), content.to_string());
        Ok(format!("File '{name}' created/updated successfully."))
    }

    fn read_file(&self, name: &str) -> Result<String> {
        Ok(self
            .file(name)
            .unwrap_or_else(|| format!("File '{name}' does not exist.")))
    }
}

/// Operator input that yields one scripted batch per drain.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    batches: VecDeque<Vec<String>>,
    close_when_spent: bool,
}

impl ScriptedInput {
    pub fn new<B, L, S>(batches: B) -> Self
    where
        B: IntoIterator<Item = L>,
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            batches: batches
                .into_iter()
                .map(|batch| batch.into_iter().map(Into::into).collect())
                .collect(),
            close_when_spent: false,
        }
    }

    /// An operator who never types anything.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Report the channel as closed once the batches are spent.
    pub fn then_close(mut self) -> Self {
        self.close_when_spent = true;
        self
    }
}

impl OperatorInput for ScriptedInput {
    fn drain(&mut self) -> Drained {
        match self.batches.pop_front() {
            Some(lines) => Drained {
                lines,
                closed: false,
            },
            None => Drained {
                lines: Vec::new(),
                closed: self.close_when_spent,
            },
        }
    }
}

/// Text generator answering from a fixed list of responses.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.borrow().clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted response for {}", request.role.as_str()))
    }
}

/// Workspace rooted in a temporary directory.
pub struct TestWorkspace {
    dir: TempDir,
    workspace: Workspace,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let workspace = Workspace::open(dir.path())?;
        Ok(Self { dir, workspace })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Executable tasks currently in the queue store.
    pub fn tasks(&self) -> Vec<String> {
        self.workspace.queue.load().unwrap_or_default()
    }
}
