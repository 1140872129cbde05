//! Shared test helpers for the hop loops.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hoploop_core::error::{PredictError, ProviderError, SandboxError, ToolError};
use hoploop_core::message::Message;
use hoploop_core::predictor::Predictor;
use hoploop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use hoploop_core::sandbox::{ActionSpace, CodeSandbox};
use hoploop_core::signature::Schema;
use hoploop_core::tool::{Tool, ToolOutput};
use hoploop_core::values::Values;

/// A predictor that returns a sequence of scripted responses.
///
/// Each call to `predict` returns the next response and records the schema
/// and values it was called with. Panics if more calls are made than
/// responses provided.
pub struct ScriptedPredictor {
    responses: Mutex<VecDeque<Result<Values, PredictError>>>,
    calls: Mutex<Vec<(Schema, Values)>>,
}

impl ScriptedPredictor {
    pub fn new(responses: Vec<Values>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(responses: Vec<Result<Values, PredictError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every `(schema, values)` pair seen so far, in call order.
    pub fn calls(&self) -> Vec<(Schema, Values)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Predictor for ScriptedPredictor {
    async fn predict(&self, schema: &Schema, values: &Values) -> Result<Values, PredictError> {
        let mut calls = self.calls.lock().unwrap();
        let mut responses = self.responses.lock().unwrap();
        calls.push((schema.clone(), values.clone()));

        match responses.pop_front() {
            Some(response) => response,
            None => panic!(
                "ScriptedPredictor: no more responses (call #{})",
                calls.len()
            ),
        }
    }
}

/// A tool-loop hop response: `Thought_{hop}` and `Action_{hop}`.
pub fn hop(hop: usize, thought: &str, action: &str) -> Values {
    Values::new()
        .with(format!("Thought_{hop}"), thought)
        .with(format!("Action_{hop}"), action)
}

/// A code-loop response carrying `generated_code`.
pub fn code(generated: &str) -> Values {
    Values::new().with("generated_code", generated)
}

/// A sandbox that returns scripted results and records what it ran.
pub struct ScriptedSandbox {
    results: Mutex<VecDeque<Result<String, SandboxError>>>,
    executed: Mutex<Vec<String>>,
    whitelists: Mutex<Vec<Vec<String>>>,
}

impl ScriptedSandbox {
    pub fn new(results: Vec<Result<String, SandboxError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            executed: Mutex::new(Vec::new()),
            whitelists: Mutex::new(Vec::new()),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn whitelists(&self) -> Vec<Vec<String>> {
        self.whitelists.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeSandbox for ScriptedSandbox {
    async fn execute(
        &self,
        code: &str,
        import_whitelist: &[String],
        action_space: &ActionSpace,
    ) -> Result<String, SandboxError> {
        assert_eq!(action_space, &ActionSpace::default());
        self.executed.lock().unwrap().push(code.to_string());
        self.whitelists
            .lock()
            .unwrap()
            .push(import_whitelist.to_vec());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedSandbox: no more results for {code:?}"))
    }
}

/// A tool that always returns the same output and records its inputs.
///
/// Clones share the recorded inputs, so a test can keep one clone while the
/// registry owns another.
#[derive(Clone)]
pub struct StaticTool {
    name: String,
    input_variable: String,
    description: String,
    output: ToolOutput,
    inputs: Arc<Mutex<Vec<String>>>,
}

impl StaticTool {
    pub fn new(name: &str, input_variable: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            input_variable: input_variable.into(),
            description: description.into(),
            output: ToolOutput::text(format!("{name} result")),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A `query` tool returning `passages` as a retrieval result.
    pub fn with_passages(name: &str, passages: Vec<String>) -> Self {
        Self {
            output: ToolOutput::Retrieval {
                query: String::new(),
                passages,
            },
            ..Self::new(name, "query", "returns passages")
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_variable(&self) -> &str {
        &self.input_variable
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, input: &str) -> Result<ToolOutput, ToolError> {
        self.inputs.lock().unwrap().push(input.to_string());
        Ok(self.output.clone())
    }
}

/// A tool whose every invocation fails.
pub struct FailingTool {
    name: String,
}

impl FailingTool {
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_variable(&self) -> &str {
        "input"
    }

    fn description(&self) -> &str {
        "always fails"
    }

    async fn invoke(&self, _input: &str) -> Result<ToolOutput, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason: "backend unavailable".into(),
        })
    }
}

/// A mock provider that returns a sequence of scripted completions.
///
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(make_text_response(&text)),
            Some(Err(e)) => Err(e),
            None => panic!("SequentialMockProvider: no more responses"),
        }
    }
}

/// Create a simple text completion.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
