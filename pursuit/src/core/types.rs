//! Collaborator roles and their sampling parameters.

use serde::{Deserialize, Serialize};

/// Collaborator role a generation request is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TaskCreation,
    Prioritization,
    Execution,
    Insight,
    GoalEvaluation,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::TaskCreation => "task_creation",
            Role::Prioritization => "prioritization",
            Role::Execution => "execution",
            Role::Insight => "insight",
            Role::GoalEvaluation => "goal_evaluation",
        }
    }

    /// Sampling parameters tuned per role.
    ///
    /// Goal evaluation is greedy and short; execution and goal answers stop at the
    /// first newline.
    pub fn sampling(self) -> Sampling {
        match self {
            Role::TaskCreation | Role::Prioritization => Sampling {
                temperature: 0.1,
                top_p: 0.7,
                top_k: 20,
                max_tokens: 128,
                stop_at_newline: false,
            },
            Role::Execution => Sampling {
                temperature: 0.15,
                top_p: 0.8,
                top_k: 40,
                max_tokens: 128,
                stop_at_newline: true,
            },
            Role::Insight => Sampling {
                temperature: 0.1,
                top_p: 0.75,
                top_k: 20,
                max_tokens: 128,
                stop_at_newline: false,
            },
            Role::GoalEvaluation => Sampling {
                temperature: 0.0,
                top_p: 0.5,
                top_k: 10,
                max_tokens: 16,
                stop_at_newline: true,
            },
        }
    }
}

/// Sampling parameters passed to the text generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_tokens: u32,
    /// Keep only the first line of the generated text.
    pub stop_at_newline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_evaluation_is_greedy_and_short() {
        let sampling = Role::GoalEvaluation.sampling();
        assert_eq!(sampling.temperature, 0.0);
        assert_eq!(sampling.max_tokens, 16);
        assert!(sampling.stop_at_newline);
    }

    #[test]
    fn list_producing_roles_keep_all_lines() {
        for role in [Role::TaskCreation, Role::Prioritization, Role::Insight] {
            assert!(!role.sampling().stop_at_newline, "{}", role.as_str());
        }
    }
}
