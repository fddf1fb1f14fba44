//! Text generation abstraction.
//!
//! The [`TextGenerator`] trait decouples the collaborator agents from the actual
//! model backend (a local model command). Tests use scripted generators that
//! return canned text without spawning processes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::response::first_line;
use crate::core::types::{Role, Sampling};
use crate::io::config::ModelConfig;
use crate::io::process::{command_from_args, render_args, run_command};

/// One prompt to complete.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub role: Role,
    pub prompt: String,
    pub sampling: Sampling,
}

impl GenerationRequest {
    /// Request with the role's default sampling parameters.
    pub fn for_role(role: Role, prompt: impl Into<String>) -> Self {
        Self {
            role,
            prompt: prompt.into(),
            sampling: role.sampling(),
        }
    }
}

/// Abstraction over text generation backends.
pub trait TextGenerator {
    /// Complete `request.prompt`, returning the generated text.
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Generator that runs a configured local model command.
///
/// The prompt goes to the child's stdin and stdout is the generated text.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: Vec<String>,
    model_path: PathBuf,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl CommandGenerator {
    pub fn new(config: &ModelConfig, model_path: &Path) -> Self {
        Self {
            command: config.command.clone(),
            model_path: model_path.to_path_buf(),
            timeout: config.timeout_secs.map(Duration::from_secs),
            output_limit_bytes: config.output_limit_bytes,
        }
    }

    /// Resolved argv for a request.
    pub fn argv(&self, request: &GenerationRequest) -> Vec<String> {
        let model_path = self.model_path.display().to_string();
        let max_tokens = request.sampling.max_tokens.to_string();
        let temperature = request.sampling.temperature.to_string();
        let top_p = request.sampling.top_p.to_string();
        let top_k = request.sampling.top_k.to_string();
        render_args(
            &self.command,
            &[
                ("model_path", model_path.as_str()),
                ("max_tokens", max_tokens.as_str()),
                ("temperature", temperature.as_str()),
                ("top_p", top_p.as_str()),
                ("top_k", top_k.as_str()),
            ],
        )
    }
}

impl TextGenerator for CommandGenerator {
    #[instrument(skip_all, fields(role = request.role.as_str(), prompt_len = request.prompt.len()))]
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let cmd = command_from_args(&self.argv(request))?;
        let output = run_command(
            cmd,
            Some(request.prompt.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        )
        .context("run model command")?;

        if output.timed_out {
            warn!(role = request.role.as_str(), "model command timed out");
            return Err(anyhow!("model command timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "model command failed");
            return Err(anyhow!(
                "model command failed with status {:?}: {}",
                output.status.code(),
                output.stderr_tail(5)
            ));
        }

        let text = output.stdout_lossy();
        let text = if request.sampling.stop_at_newline {
            first_line(&text).to_string()
        } else {
            text.trim().to_string()
        };
        debug!(response_len = text.len(), "model responded");
        Ok(text)
    }
}

/// Fail unless the model file exists. Runs before the loop starts.
pub fn ensure_model_present(model_path: &Path) -> Result<()> {
    if !model_path.is_file() {
        return Err(anyhow!(
            "model file not found at {}",
            model_path.display()
        ));
    }
    info!(model = %model_path.display(), "model file found");
    Ok(())
}

/// Ask `generator` for a single token so a broken model command fails setup
/// instead of every iteration.
pub fn smoke_test<G: TextGenerator + ?Sized>(generator: &G) -> Result<()> {
    let mut request = GenerationRequest::for_role(Role::Execution, "Test");
    request.sampling.max_tokens = 1;
    generator
        .generate(&request)
        .context("model failed to answer a test prompt")?;
    info!("model answered test prompt");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(command: &[&str]) -> ModelConfig {
        ModelConfig {
            command: command.iter().map(|s| s.to_string()).collect(),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn argv_substitutes_sampling_and_model() {
        let generator = CommandGenerator::new(
            &config(&["gen", "{model_path}", "{max_tokens}", "{temperature}", "{top_k}"]),
            Path::new("/models/m.gguf"),
        );
        let argv = generator.argv(&GenerationRequest::for_role(Role::GoalEvaluation, "p"));
        assert_eq!(argv, vec!["gen", "/models/m.gguf", "16", "0", "10"]);
    }

    #[cfg(unix)]
    #[test]
    fn generate_echoes_prompt_through_command() {
        let generator = CommandGenerator::new(&config(&["cat"]), Path::new("unused"));
        let text = generator
            .generate(&GenerationRequest::for_role(
                Role::TaskCreation,
                "  task one\ntask two\n",
            ))
            .expect("generate");
        assert_eq!(text, "task one\ntask two");
    }

    #[cfg(unix)]
    #[test]
    fn stop_at_newline_keeps_first_line() {
        let generator = CommandGenerator::new(&config(&["cat"]), Path::new("unused"));
        let text = generator
            .generate(&GenerationRequest::for_role(
                Role::GoalEvaluation,
                "\nYES\nextra chatter",
            ))
            .expect("generate");
        assert_eq!(text, "YES");
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_an_error() {
        let generator = CommandGenerator::new(&config(&["false"]), Path::new("unused"));
        let err = generator
            .generate(&GenerationRequest::for_role(Role::Execution, "p"))
            .unwrap_err();
        assert!(err.to_string().contains("model command failed"));
    }

    #[test]
    fn missing_model_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = ensure_model_present(&temp.path().join("absent.gguf")).unwrap_err();
        assert!(err.to_string().contains("model file not found"));

        let present = temp.path().join("m.gguf");
        std::fs::write(&present, b"gguf").expect("write");
        ensure_model_present(&present).expect("present");
    }

    #[cfg(unix)]
    #[test]
    fn smoke_test_reports_unusable_model_command() {
        let working = CommandGenerator::new(&config(&["echo", "ok"]), Path::new("unused"));
        smoke_test(&working).expect("working command");

        let missing = CommandGenerator::new(
            &config(&["/nonexistent/llama-cli", "{model_path}"]),
            Path::new("unused"),
        );
        let err = smoke_test(&missing).expect_err("missing program");
        assert!(format!("{err:#}").contains("model failed to answer a test prompt"));
    }

    #[test]
    fn smoke_test_sends_one_token_request() {
        let generator = crate::test_support::ScriptedGenerator::new(["ok"]);
        smoke_test(&generator).expect("smoke test");
        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].sampling.max_tokens, 1);
    }
}
