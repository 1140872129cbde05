//! Action interpreter — turns one hop's predictor output into an outcome.
//!
//! Two interpreters implement [`ActionInterpreter`]: the [`ToolDispatcher`]
//! here, which parses `Name[argument]` and calls a registered tool, and the
//! code executor in [`crate::code`]. Neither ever returns an error: every
//! failure is an [`ActionOutcome`] variant the hop loop decides how to use.

use async_trait::async_trait;
use hoploop_core::tool::{ActionTarget, ToolRegistry};
use hoploop_core::values::{FieldValue, Values};
use tracing::{debug, warn};

use crate::schema::HopSlots;

/// Observation recorded when an action cannot be parsed, names no known
/// tool, or the tool fails.
pub const ACTION_DIAGNOSTIC: &str =
    "Mislukt om de actie te parseren. Slechte opmaak of onjuiste actienaam.";

/// What one action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The loop is done; carries the final answer.
    Terminal(String),
    /// Tool output or code output to feed into the next hop.
    Observation(FieldValue),
    /// The action text was malformed or named an unknown tool.
    ParseFailure(String),
    /// The tool or the code failed while running.
    ExecutionFailure(String),
}

/// An outcome together with the normalized action that produced it: the
/// first line of a tool action, or the code that was (or would have been)
/// executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub action: String,
    pub outcome: ActionOutcome,
}

#[async_trait]
pub trait ActionInterpreter: Send + Sync {
    /// Interpret the predictor output of hop index `hop` (0-based).
    async fn interpret(&self, output: &Values, hop: usize) -> Interpretation;
}

/// Split `Name[argument]` on the first `[` and the last `]`.
///
/// Only the first line is considered. A missing `]` is tolerated, so
/// `Finish[42` still yields `("Finish", "42")`.
pub fn parse_action(raw: &str) -> Result<(&str, &str), String> {
    let line = raw.trim().lines().next().unwrap_or_default();
    let (name, rest) = line
        .split_once('[')
        .ok_or_else(|| format!("action `{line}` is not of the form Name[argument]"))?;
    let arg = match rest.rsplit_once(']') {
        Some((arg, _)) => arg,
        None => rest,
    };
    Ok((name, arg))
}

/// Dispatches `Name[argument]` actions to the tools of a registry.
pub struct ToolDispatcher {
    tools: ToolRegistry,
}

impl ToolDispatcher {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Parse and run one action line.
    pub async fn dispatch(&self, action: &str) -> ActionOutcome {
        let (name, arg) = match parse_action(action) {
            Ok(parsed) => parsed,
            Err(reason) => return ActionOutcome::ParseFailure(reason),
        };

        match self.tools.resolve(name) {
            Some(ActionTarget::Finish) => ActionOutcome::Terminal(arg.to_string()),
            Some(ActionTarget::Registered(tool)) => {
                debug!(tool = %name, input = %arg, "Invoking tool");
                match tool.invoke(arg).await {
                    Ok(output) => ActionOutcome::Observation(output.into_observation()),
                    Err(e) => ActionOutcome::ExecutionFailure(e.to_string()),
                }
            }
            None => ActionOutcome::ParseFailure(format!("unknown tool `{name}`")),
        }
    }
}

#[async_trait]
impl ActionInterpreter for ToolDispatcher {
    async fn interpret(&self, output: &Values, hop: usize) -> Interpretation {
        let slots = HopSlots::new(hop + 1);
        let raw = output.get(&slots.action).map(ToString::to_string).unwrap_or_default();
        let action = raw.split('\n').next().unwrap_or_default().to_string();

        let outcome = self.dispatch(&action).await;
        if let ActionOutcome::ParseFailure(reason) | ActionOutcome::ExecutionFailure(reason) =
            &outcome
        {
            warn!(hop = hop + 1, action = %action, reason = %reason, "Action failed");
        }

        Interpretation { action, outcome }
    }
}
