//! Prompt-driven collaborators built on a [`TextGenerator`].

use anyhow::Result;
use tracing::{debug, instrument};

use super::Collaborators;
use crate::core::response::{
    execution_result, parse_goal_verdict, parse_ranked, parse_task_lines, resolve_insight,
};
use crate::core::types::Role;
use crate::io::insight_log::InsightLog;
use crate::io::model::{GenerationRequest, TextGenerator};
use crate::io::prompt::PromptEngine;

/// Upper bound on insight text quoted back into the goal evaluation prompt.
const GOAL_CONTEXT_BYTES: usize = 4_000;

/// Collaborators answering every call with one generation request.
pub struct ModelAgents<G: TextGenerator> {
    generator: G,
    prompts: PromptEngine,
    insights: Option<InsightLog>,
}

impl<G: TextGenerator> ModelAgents<G> {
    pub fn new(generator: G) -> Result<Self> {
        Ok(Self {
            generator,
            prompts: PromptEngine::new()?,
            insights: None,
        })
    }

    /// Quote recent insights into goal evaluation prompts.
    pub fn with_insight_log(mut self, insights: InsightLog) -> Self {
        self.insights = Some(insights);
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    fn ask(&self, role: Role, prompt: String) -> Result<String> {
        self.generator
            .generate(&GenerationRequest::for_role(role, prompt))
    }

    fn recent_insights(&self) -> Result<Option<String>> {
        let Some(log) = &self.insights else {
            return Ok(None);
        };
        let contents = log.read()?;
        Ok(Some(tail(&contents, GOAL_CONTEXT_BYTES).to_string()))
    }
}

impl<G: TextGenerator> Collaborators for ModelAgents<G> {
    #[instrument(skip_all)]
    fn generate_tasks(&self, objective: &str, context: &str) -> Result<Vec<String>> {
        let prompt = self.prompts.task_creation(objective, context)?;
        let response = self.ask(Role::TaskCreation, prompt)?;
        let tasks = parse_task_lines(&response);
        debug!(count = tasks.len(), "created tasks");
        Ok(tasks)
    }

    #[instrument(skip_all, fields(count = tasks.len()))]
    fn rank_tasks(&self, tasks: &[String]) -> Result<Vec<String>> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = self.prompts.prioritization(tasks)?;
        let response = self.ask(Role::Prioritization, prompt)?;
        let ranked = parse_ranked(&response);
        debug!(count = ranked.len(), "ranked tasks");
        Ok(ranked)
    }

    #[instrument(skip_all)]
    fn check_goal(&self, objective: &str) -> Result<bool> {
        let insights = self.recent_insights()?;
        let prompt = self
            .prompts
            .goal_evaluation(objective, insights.as_deref())?;
        let response = self.ask(Role::GoalEvaluation, prompt)?;
        let met = parse_goal_verdict(&response);
        debug!(answer = %response.trim(), met, "goal evaluated");
        Ok(met)
    }

    #[instrument(skip_all)]
    fn execute(&self, task: &str) -> Result<String> {
        let prompt = self.prompts.execution(task)?;
        let response = self.ask(Role::Execution, prompt)?;
        Ok(execution_result(&response))
    }

    #[instrument(skip_all)]
    fn summarize(&self, task: &str, result: &str) -> Result<String> {
        let prompt = self.prompts.insight(task, result)?;
        let response = self.ask(Role::Insight, prompt)?;
        Ok(resolve_insight(&response).unwrap_or_default())
    }
}

/// Last `max_bytes` of `text`, cut at a char boundary.
fn tail(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;

    #[test]
    fn generate_tasks_parses_lines() {
        let generator = ScriptedGenerator::new(["- FILE#create#hello.txt#hello world!\n- Check it\n"]);
        let agents = ModelAgents::new(generator).expect("agents");

        let tasks = agents.generate_tasks("say hello", "").expect("generate");

        assert_eq!(
            tasks,
            vec!["FILE#create#hello.txt#hello world!", "Check it"]
        );
        let requests = agents.generator().requests();
        assert_eq!(requests[0].role, Role::TaskCreation);
        assert!(requests[0].prompt.contains("Objective: say hello"));
    }

    #[test]
    fn rank_tasks_skips_model_for_empty_batch() {
        let agents = ModelAgents::new(ScriptedGenerator::new(Vec::<String>::new())).expect("agents");
        assert!(agents.rank_tasks(&[]).expect("rank").is_empty());
        assert!(agents.generator().requests().is_empty());
    }

    #[test]
    fn rank_tasks_dedups_model_answer() {
        let agents = ModelAgents::new(ScriptedGenerator::new(["b\na\nb\n"])).expect("agents");
        let ranked = agents
            .rank_tasks(&["a".to_string(), "b".to_string()])
            .expect("rank");
        assert_eq!(ranked, vec!["b", "a"]);
    }

    #[test]
    fn check_goal_quotes_recent_insights() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = InsightLog::new(temp.path().join("ltm.txt"));
        log.append("- hello.txt exists").expect("append");
        let agents = ModelAgents::new(ScriptedGenerator::new(["YES"]))
            .expect("agents")
            .with_insight_log(log);

        assert!(agents.check_goal("write hello").expect("goal"));
        let requests = agents.generator().requests();
        assert_eq!(requests[0].role, Role::GoalEvaluation);
        assert!(requests[0].prompt.contains("- hello.txt exists"));
    }

    #[test]
    fn summarize_maps_sentinel_to_empty() {
        let agents =
            ModelAgents::new(ScriptedGenerator::new(["NO NEW INSIGHTS", "- learned\n"])).expect("agents");
        assert_eq!(agents.summarize("t", "r").expect("summarize"), "");
        assert_eq!(agents.summarize("t", "r").expect("summarize"), "- learned");
    }

    #[test]
    fn execute_defaults_empty_answer() {
        let agents = ModelAgents::new(ScriptedGenerator::new([""])).expect("agents");
        assert_eq!(agents.execute("t").expect("execute"), "No result.");
    }

    #[test]
    fn tail_respects_char_boundaries() {
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("abcdef", 2), "ef");
        assert_eq!(tail("aé", 1), "");
    }
}
