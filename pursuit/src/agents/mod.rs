//! Collaborator seams for the pursuit loop.
//!
//! The loop only talks to a [`Collaborators`] implementation; [`model`] provides
//! the prompt-driven one used by the CLI, tests use scripted ones.

use anyhow::Result;

pub mod model;

/// Capabilities the loop consumes. Every call blocks until it has an answer.
pub trait Collaborators {
    /// Propose new tasks (0–3 expected) for `objective` given the current store content.
    fn generate_tasks(&self, objective: &str, context: &str) -> Result<Vec<String>>;
    /// Deduplicate and reorder `tasks` by priority.
    fn rank_tasks(&self, tasks: &[String]) -> Result<Vec<String>>;
    /// Whether `objective` is satisfied.
    fn check_goal(&self, objective: &str) -> Result<bool>;
    /// Carry out a plain task, returning its result.
    fn execute(&self, task: &str) -> Result<String>;
    /// Derive an insight from a task and its result; empty means nothing new.
    fn summarize(&self, task: &str, result: &str) -> Result<String>;
}
