//! End-to-end integration tests for hoploop.
//!
//! These drive both loops through a real [`ChatPredictor`]: prompts are
//! rendered, sent to a scripted provider, and the completions parsed back
//! into fields before the built-in tools or a sandbox act on them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hoploop_agent::{ChatPredictor, ProgramOfThought, ReactAgent};
use hoploop_config::{AppConfig, ReactConfig};
use hoploop_core::error::{ProviderError, SandboxError};
use hoploop_core::message::Message;
use hoploop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use hoploop_core::sandbox::{ActionSpace, CodeSandbox};
use hoploop_core::values::{FieldValue, Values};
use hoploop_tools::{PythonSandbox, default_registry};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted completions in sequence.
struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.prompts
            .lock()
            .unwrap()
            .push(request.messages[0].content.clone());
        let text = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider exhausted"));
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "e2e-model".into(),
        })
    }
}

/// A sandbox that answers from a script and records the code it was given.
struct RecordingSandbox {
    results: Mutex<VecDeque<Result<String, SandboxError>>>,
    executed: Mutex<Vec<String>>,
}

impl RecordingSandbox {
    fn new(results: Vec<Result<String, SandboxError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            executed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CodeSandbox for RecordingSandbox {
    async fn execute(
        &self,
        code: &str,
        _import_whitelist: &[String],
        _action_space: &ActionSpace,
    ) -> Result<String, SandboxError> {
        self.executed.lock().unwrap().push(code.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("RecordingSandbox exhausted"))
    }
}

fn predictor(provider: Arc<ScriptedProvider>) -> ChatPredictor {
    ChatPredictor::new(provider, "e2e-model")
}

fn registry_over(passages: &[&str]) -> (tempfile::TempDir, hoploop_core::tool::ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.jsonl");
    let lines: Vec<String> = passages
        .iter()
        .map(|p| serde_json::json!({ "long_text": p }).to_string())
        .collect();
    std::fs::write(&path, lines.join("\n")).unwrap();

    let config = ReactConfig {
        corpus_path: Some(path),
        num_results: 2,
        ..ReactConfig::default()
    };
    (dir, default_registry(&config).unwrap())
}

// ── Tool loop ────────────────────────────────────────────────────────────

#[tokio::test]
async fn react_searches_calculates_then_finishes() {
    let (_dir, tools) = registry_over(&[
        "Paris is the capital of France.",
        "Berlin is the capital of Germany.",
        "The Seine flows through Paris.",
    ]);
    let provider = Arc::new(ScriptedProvider::new(&[
        "I should look up France.\nAction 1: Search[capital of France]",
        "Thought 2: Now some arithmetic.\nAction 2: Calculate[(2 + 3) * 4]",
        "I know the answer.\nAction 3: Finish[Paris]",
    ]));
    let agent = ReactAgent::new("question -> answer".parse().unwrap(), tools).unwrap();

    let result = agent
        .forward(
            &predictor(provider.clone()),
            &Values::new().with("question", "What is the capital of France?"),
        )
        .await
        .unwrap();

    assert!(result.finished);
    assert_eq!(result.hops, 3);
    assert_eq!(result.answer, "Paris");
    assert_eq!(
        result.observations,
        vec![
            FieldValue::Passages(vec![
                "Paris is the capital of France.".into(),
                "Berlin is the capital of Germany.".into(),
            ]),
            FieldValue::Text("20".into()),
        ]
    );

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("(1) Search[query], which"));
    assert!(prompts[0].ends_with("Thought 1:"));
    assert!(prompts[1].contains("Action 1: Search[capital of France]"));
    assert!(prompts[1].contains("Observatie 1: [1] «Paris is the capital of France.»"));
    assert!(prompts[2].contains("Observatie 2: 20"));
    assert!(prompts[2].ends_with("Thought 3:"));
}

#[tokio::test]
async fn react_recovers_from_bad_action_and_exhausts() {
    let (_dir, tools) = registry_over(&["Paris is the capital of France."]);
    let provider = Arc::new(ScriptedProvider::new(&[
        "Let me try.\nAction 1: Lookup[France]",
        "Try arithmetic.\nAction 2: Calculate[1 / 0]",
    ]));
    let agent = ReactAgent::new("question -> answer".parse().unwrap(), tools)
        .unwrap()
        .with_max_iters(2);

    let result = agent
        .forward(
            &predictor(provider.clone()),
            &Values::new().with("question", "?"),
        )
        .await
        .unwrap();

    assert!(!result.finished);
    assert_eq!(result.hops, 2);
    assert_eq!(result.answer, "");
    assert_eq!(result.observations.len(), 2);
    assert!(provider.prompts()[1].contains("Mislukt om de actie te parseren"));
}

#[tokio::test]
async fn react_completion_without_action_becomes_diagnostic() {
    let (_dir, tools) = registry_over(&[]);
    let provider = Arc::new(ScriptedProvider::new(&[
        "I forgot the action line.",
        "Better now.\nAction 2: Finish[done]",
    ]));
    let agent = ReactAgent::new("question -> answer".parse().unwrap(), tools).unwrap();

    let result = agent
        .forward(
            &predictor(provider.clone()),
            &Values::new().with("question", "?"),
        )
        .await
        .unwrap();

    assert!(result.finished);
    assert_eq!(result.answer, "done");
    assert_eq!(
        result.observations,
        vec![FieldValue::from(hoploop_agent::ACTION_DIAGNOSTIC)]
    );
    assert!(provider.prompts()[1].contains("Thought 1: I forgot the action line."));
}

#[tokio::test]
async fn react_output_is_keyed_by_task_field() {
    let (_dir, tools) = registry_over(&[
        "Paris is the capital of France.",
        "France borders Spain.",
    ]);
    let provider = Arc::new(ScriptedProvider::new(&[
        "Look it up.\nAction 1: Search[France capital]",
        "Found it.\nAction 2: Finish[Paris]",
    ]));
    let agent = ReactAgent::new("country -> capital".parse().unwrap(), tools).unwrap();

    let output = agent
        .forward(&predictor(provider), &Values::new().with("country", "France"))
        .await
        .unwrap()
        .into_output();

    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        serde_json::json!({
            "observations": [["Paris is the capital of France.", "France borders Spain."]],
            "capital": "Paris"
        })
    );
}

// ── Code loop ────────────────────────────────────────────────────────────

#[tokio::test]
async fn pot_repairs_code_then_answers() {
    let sandbox = Arc::new(RecordingSandbox::new(vec![
        Err(SandboxError::Execution(
            "NameError: name 'y' is not defined".into(),
        )),
        Ok("42".into()),
    ]));
    let provider = Arc::new(ScriptedProvider::new(&[
        "```python\nx = y * 2\n```",
        "Code: ```python\nx = 21 * 2\n```",
        "42",
    ]));
    let pot = ProgramOfThought::new("question -> answer".parse().unwrap(), sandbox.clone()).unwrap();

    let result = pot
        .forward(
            &predictor(provider.clone()),
            &Values::new().with("question", "What is 21 doubled?"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.answer.get_text("answer"), Some("42"));
    assert_eq!(result.attempts, 2);
    assert_eq!(result.code, "x = 21 * 2\nx");
    assert_eq!(
        *sandbox.executed.lock().unwrap(),
        vec!["x = y * 2\nx".to_string(), "x = 21 * 2\nx".to_string()]
    );

    let prompts = provider.prompts();
    assert!(prompts[1].contains("Previous Code: x = y * 2\nx"));
    assert!(prompts[1].contains("Error: NameError: name 'y' is not defined"));
    assert!(prompts[2].contains("Code Output: 42"));
    assert!(prompts[2].ends_with("Answer:"));
}

#[tokio::test]
async fn pot_gives_up_after_max_iters() {
    let sandbox = Arc::new(RecordingSandbox::new(vec![
        Err(SandboxError::Execution("ZeroDivisionError".into())),
        Err(SandboxError::Execution("ZeroDivisionError".into())),
    ]));
    let provider = Arc::new(ScriptedProvider::new(&["x = 1 / 0\nx", "x = 2 / 0\nx"]));
    let pot = ProgramOfThought::new("question -> answer".parse().unwrap(), sandbox)
        .unwrap()
        .with_max_iters(2);

    let result = pot
        .forward(&predictor(provider.clone()), &Values::new().with("question", "?"))
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(provider.prompts().len(), 2);
}

fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn pot_runs_generated_code_in_python() {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return;
    }

    let provider = Arc::new(ScriptedProvider::new(&[
        "```python\nimport math\nroot = math.sqrt(81) + 1\n```",
        "10",
    ]));
    let pot = ProgramOfThought::new(
        "question -> answer".parse().unwrap(),
        Arc::new(PythonSandbox::default().with_timeout(10)),
    )
    .unwrap()
    .with_import_whitelist(vec!["math".into()]);

    let result = pot
        .forward(
            &predictor(provider.clone()),
            &Values::new().with("question", "What is the square root of 81 plus one?"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.code_output, "10.0");
    assert_eq!(result.answer.get_text("answer"), Some("10"));
}

// ── Config wiring ────────────────────────────────────────────────────────

#[test]
fn default_config_builds_both_loops() {
    let config = AppConfig::default();
    let tools = default_registry(&config.react).unwrap();
    assert_eq!(tools.names(), vec!["Search", "Calculate"]);

    let agent = ReactAgent::new("question -> answer".parse().unwrap(), tools)
        .unwrap()
        .with_max_iters(config.react.max_iters);
    assert_eq!(agent.max_iters(), config.react.max_iters);

    let sandbox = Arc::new(hoploop_tools::sandbox_from_config(
        &config.program_of_thought,
    ));
    let pot = ProgramOfThought::new("question -> answer".parse().unwrap(), sandbox)
        .unwrap()
        .with_max_iters(config.program_of_thought.max_iters);
    assert_eq!(pot.max_iters(), config.program_of_thought.max_iters);
}
