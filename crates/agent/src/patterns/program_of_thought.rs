//! Program of Thought — generate code, run it, repair it, then answer.
//!
//! The loop has three predictor shapes (see [`CodeMode`]):
//!
//! 1. **generate** once from the task inputs;
//! 2. **regenerate** from the failing code and its error, while execution
//!    keeps failing and attempts remain;
//! 3. **answer** once from the final code and its output.
//!
//! Unlike the tool loop, exhausting the attempts is a distinct outcome:
//! `forward` returns `Ok(None)` rather than an empty answer.

use std::sync::Arc;

use hoploop_core::error::Result;
use hoploop_core::predictor::Predictor;
use hoploop_core::sandbox::CodeSandbox;
use hoploop_core::signature::Schema;
use hoploop_core::values::Values;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::action::{ActionInterpreter, ActionOutcome};
use crate::code::CodeExecutor;
use crate::schema::{
    CODE_OUTPUT, CodeMode, ERROR, FINAL_GENERATED_CODE, PREVIOUS_CODE, pot_schema, single_output,
};

/// The code-synthesis loop.
pub struct ProgramOfThought {
    signature: Schema,
    executor: CodeExecutor,
    /// Total execution attempts: one generate plus up to `max_iters - 1`
    /// regenerations.
    max_iters: usize,
}

/// A successful code-loop run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramOfThoughtResult {
    /// The answer-mode prediction, holding the task's output field.
    pub answer: Values,
    /// The code whose output was used.
    pub code: String,
    /// What that code evaluated to.
    pub code_output: String,
    /// Errors of the failed attempts, oldest first.
    pub failures: Vec<String>,
    /// Code attempts made, including the successful one.
    pub attempts: usize,
}

impl ProgramOfThought {
    /// Create a code loop for `signature`, running code in `sandbox`.
    ///
    /// Fails with a configuration error unless the signature has exactly one
    /// output field.
    pub fn new(signature: Schema, sandbox: Arc<dyn CodeSandbox>) -> Result<Self> {
        single_output(&signature, "PoT")?;
        Ok(Self {
            signature,
            executor: CodeExecutor::new(sandbox),
            max_iters: 3,
        })
    }

    pub fn with_max_iters(mut self, max: usize) -> Self {
        self.max_iters = max;
        self
    }

    /// Modules generated code may import.
    pub fn with_import_whitelist(mut self, modules: Vec<String>) -> Self {
        self.executor = self.executor.with_import_whitelist(modules);
        self
    }

    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    pub fn signature(&self) -> &Schema {
        &self.signature
    }

    pub fn schema(&self, mode: CodeMode) -> Result<Schema> {
        pot_schema(&self.signature, mode)
    }

    /// Run the loop on `inputs`.
    ///
    /// Returns `Ok(None)` when every attempt failed. Predictor errors
    /// propagate unchanged.
    pub async fn forward(
        &self,
        predictor: &dyn Predictor,
        inputs: &Values,
    ) -> Result<Option<ProgramOfThoughtResult>> {
        let generate = self.schema(CodeMode::Generate)?;
        let regenerate = self.schema(CodeMode::Regenerate)?;
        let answer_schema = self.schema(CodeMode::Answer)?;

        let mut state: Values = self
            .signature
            .input_fields()
            .filter_map(|field| {
                inputs
                    .get(&field.name)
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect();

        info!(
            max_iters = self.max_iters,
            imports = ?self.executor.import_whitelist(),
            "Starting Program of Thought"
        );

        let output = predictor.predict(&generate, &state).await?;
        let mut attempt = self.executor.interpret(&output, 0).await;
        let mut attempts = 1;
        let mut failures = Vec::new();

        let code_output = loop {
            let error = match attempt.outcome {
                ActionOutcome::ExecutionFailure(error) | ActionOutcome::ParseFailure(error) => {
                    error
                }
                ActionOutcome::Observation(value) => break value.to_string(),
                ActionOutcome::Terminal(value) => break value,
            };
            failures.push(error.clone());

            if attempts >= self.max_iters {
                warn!(attempts, error = %error, "Max attempts reached, error persists");
                return Ok(None);
            }

            debug!(attempt = attempts + 1, "Regenerating code");
            state.insert(PREVIOUS_CODE, attempt.action);
            state.insert(ERROR, error);

            let output = predictor.predict(&regenerate, &state).await?;
            attempt = self.executor.interpret(&output, attempts).await;
            attempts += 1;
        };

        let code = attempt.action;
        state.insert(FINAL_GENERATED_CODE, code.clone());
        state.insert(CODE_OUTPUT, code_output.clone());

        let answer = predictor.predict(&answer_schema, &state).await?;
        info!(attempts, "Program of Thought complete");

        Ok(Some(ProgramOfThoughtResult {
            answer,
            code,
            code_output,
            failures,
            attempts,
        }))
    }
}
