//! Prompt rendering for the collaborator roles.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

const TASK_CREATION_TEMPLATE: &str = include_str!("prompts/task_creation.md");
const PRIORITIZATION_TEMPLATE: &str = include_str!("prompts/prioritization.md");
const EXECUTION_TEMPLATE: &str = include_str!("prompts/execution.md");
const INSIGHT_TEMPLATE: &str = include_str!("prompts/insight.md");
const GOAL_EVALUATION_TEMPLATE: &str = include_str!("prompts/goal_evaluation.md");

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            ("task_creation", TASK_CREATION_TEMPLATE),
            ("prioritization", PRIORITIZATION_TEMPLATE),
            ("execution", EXECUTION_TEMPLATE),
            ("insight", INSIGHT_TEMPLATE),
            ("goal_evaluation", GOAL_EVALUATION_TEMPLATE),
        ] {
            env.add_template(name, source)
                .with_context(|| format!("load {name} template"))?;
        }
        Ok(Self { env })
    }

    pub fn task_creation(&self, objective: &str, context: &str) -> Result<String> {
        self.render(
            "task_creation",
            context! {
                objective => objective.trim(),
                context => (!context.trim().is_empty()).then(|| context.trim()),
            },
        )
    }

    pub fn prioritization(&self, tasks: &[String]) -> Result<String> {
        self.render("prioritization", context! { tasks => tasks })
    }

    pub fn execution(&self, task: &str) -> Result<String> {
        self.render("execution", context! { task => task })
    }

    pub fn insight(&self, task: &str, result: &str) -> Result<String> {
        self.render(
            "insight",
            context! {
                task => task,
                result => result.trim(),
            },
        )
    }

    pub fn goal_evaluation(&self, objective: &str, insights: Option<&str>) -> Result<String> {
        self.render(
            "goal_evaluation",
            context! {
                objective => objective.trim(),
                insights => insights.map(str::trim).filter(|s| !s.is_empty()),
            },
        )
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        template
            .render(ctx)
            .with_context(|| format!("render {name} prompt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_creation_includes_context_only_when_present() {
        let engine = PromptEngine::new().expect("engine");

        let bare = engine.task_creation("ship it", "  ").expect("render");
        assert!(bare.contains("Objective: ship it"));
        assert!(!bare.contains("short-term memory"));

        let with_context = engine
            .task_creation("ship it", "USERINPUT#2025-01-01 00:00:00#=hurry\n")
            .expect("render");
        assert!(with_context.contains("USERINPUT#2025-01-01 00:00:00#=hurry"));
    }

    #[test]
    fn prioritization_lists_every_task() {
        let engine = PromptEngine::new().expect("engine");
        let prompt = engine
            .prioritization(&["alpha".to_string(), "WEB#beta#gamma".to_string()])
            .expect("render");
        assert!(prompt.contains("alpha\n"));
        assert!(prompt.contains("WEB#beta#gamma\n"));
    }

    #[test]
    fn insight_and_goal_prompts_carry_inputs() {
        let engine = PromptEngine::new().expect("engine");
        let insight = engine.insight("t", " r \n").expect("render");
        assert!(insight.contains("Task: t\nResult: r\n"));
        assert!(insight.contains("NO NEW INSIGHTS"));

        let goal = engine
            .goal_evaluation("be done", Some("- did it"))
            .expect("render");
        assert!(goal.contains("Objective: be done"));
        assert!(goal.contains("- did it"));
        let goal = engine.goal_evaluation("be done", None).expect("render");
        assert!(!goal.contains("learned so far"));
    }

    #[test]
    fn execution_prompt_names_task() {
        let engine = PromptEngine::new().expect("engine");
        let prompt = engine.execution("count to three").expect("render");
        assert!(prompt.contains("Task: count to three"));
    }
}
