//! ReAct — the Thought → Action → Observation tool loop.
//!
//! Each hop asks the predictor for one Thought and one Action, dispatches the
//! action to a tool, and feeds the observation into the next hop's schema as
//! an input. The loop stops as soon as the model writes `Finish[answer]`, or
//! after `max_iters` hops.
//!
//! Running out of hops is not an error: the result carries an empty answer
//! and every observation collected so far. Failed actions never end the loop
//! either; they are recorded as a fixed diagnostic observation so the model
//! can see its mistake on the next hop. Only predictor errors propagate.

use hoploop_core::error::Result;
use hoploop_core::predictor::Predictor;
use hoploop_core::signature::Schema;
use hoploop_core::tool::ToolRegistry;
use hoploop_core::values::{FieldValue, Values};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::action::{ACTION_DIAGNOSTIC, ActionInterpreter, ActionOutcome, ToolDispatcher};
use crate::schema::{HopSlots, react_schema, single_output};

/// The tool-use loop.
pub struct ReactAgent {
    /// Task signature; must declare exactly one output field.
    signature: Schema,
    /// Name of that output field.
    answer_field: String,
    /// Tool dispatch for `Name[argument]` actions.
    dispatcher: ToolDispatcher,
    /// Maximum predictor calls per `forward`.
    max_iters: usize,
}

/// The result of one tool-loop run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactResult {
    /// Hops actually run (predictor calls made).
    pub hops: usize,
    /// Every observation, in hop order, including diagnostics.
    pub observations: Vec<FieldValue>,
    /// Name of the task's output field.
    pub answer_field: String,
    /// The `Finish` argument, or empty if the loop ran out of hops.
    pub answer: String,
    /// Whether the model selected `Finish`.
    pub finished: bool,
}

impl ReactResult {
    /// The loop's output: the observations and the answer under the task's
    /// output field name.
    pub fn into_output(self) -> ReactOutput {
        ReactOutput {
            observations: self.observations,
            answer_field: self.answer_field,
            answer: self.answer,
        }
    }
}

/// What the tool loop hands back to its caller.
///
/// Serializes as `{"observations": [...], "<answer_field>": "<answer>"}`.
/// Each observation keeps its shape: a tool's passages stay a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactOutput {
    pub observations: Vec<FieldValue>,
    pub answer_field: String,
    pub answer: String,
}

impl ReactOutput {
    /// The answer, looked up by field name.
    pub fn get(&self, field: &str) -> Option<&str> {
        (field == self.answer_field).then_some(self.answer.as_str())
    }
}

impl Serialize for ReactOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("observations", &self.observations)?;
        map.serialize_entry(&self.answer_field, &self.answer)?;
        map.end()
    }
}

impl ReactAgent {
    /// Create a tool loop for `signature`, acting through `tools`.
    ///
    /// Fails with a configuration error unless the signature has exactly one
    /// output field.
    pub fn new(signature: Schema, tools: ToolRegistry) -> Result<Self> {
        let answer_field = single_output(&signature, "ReAct")?.name.clone();
        Ok(Self {
            signature,
            answer_field,
            dispatcher: ToolDispatcher::new(tools),
            max_iters: 5,
        })
    }

    /// Set the hop ceiling.
    pub fn with_max_iters(mut self, max: usize) -> Self {
        self.max_iters = max;
        self
    }

    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    pub fn signature(&self) -> &Schema {
        &self.signature
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.dispatcher.tools()
    }

    /// The schema of hop index `hop` (0-based).
    pub fn schema_for_hop(&self, hop: usize) -> Schema {
        react_schema(&self.signature, self.dispatcher.tools(), hop + 1)
    }

    /// Run the loop on `inputs`. Inputs not named by the signature are
    /// ignored.
    pub async fn forward(&self, predictor: &dyn Predictor, inputs: &Values) -> Result<ReactResult> {
        let mut state: Values = self
            .signature
            .input_fields()
            .filter_map(|field| {
                inputs
                    .get(&field.name)
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect();

        info!(max_iters = self.max_iters, tools = ?self.tools().names(), "Starting ReAct loop");

        let mut observations = Vec::new();
        let mut answer = None;
        let mut hops = 0;

        for hop in 0..self.max_iters {
            let slots = HopSlots::new(hop + 1);
            let schema = self.schema_for_hop(hop);

            let mut output = predictor.predict(&schema, &state).await?;
            hops += 1;

            let interpretation = self.dispatcher.interpret(&output, hop).await;
            debug!(hop = slots.hop, action = %interpretation.action, "Action");
            output.insert(slots.action.as_str(), interpretation.action);

            let observation = match interpretation.outcome {
                ActionOutcome::Terminal(value) => {
                    answer = Some(value);
                    break;
                }
                ActionOutcome::Observation(value) => value,
                ActionOutcome::ParseFailure(_) | ActionOutcome::ExecutionFailure(_) => {
                    FieldValue::from(ACTION_DIAGNOSTIC)
                }
            };

            output.insert(slots.observation.as_str(), observation.clone());
            observations.push(observation);
            state.merge(output);
        }

        let finished = answer.is_some();
        info!(hops, finished, observations = observations.len(), "ReAct loop complete");

        Ok(ReactResult {
            hops,
            observations,
            answer_field: self.answer_field.clone(),
            answer: answer.unwrap_or_default(),
            finished,
        })
    }
}
