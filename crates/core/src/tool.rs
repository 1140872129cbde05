//! Tool trait — the capabilities the tool loop dispatches to.
//!
//! Tools are named, text-in/text-out capabilities. The model selects one by
//! writing `Name[input]` in its action field; the name is used verbatim in
//! prompt text and parsed back from model output, so it is case-sensitive.
//!
//! `Finish` is not a tool. It is the termination signal, and the registry
//! reports it as [`ActionTarget::Finish`] rather than storing an entry for it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::values::FieldValue;

/// Reserved action name that ends the tool loop.
pub const FINISH: &str = "Finish";

/// The result of invoking a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutput {
    Text { text: String },
    List { items: Vec<String> },
    /// A retrieval result; only its passages become the observation.
    Retrieval { query: String, passages: Vec<String> },
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The value recorded as the hop's observation.
    pub fn into_observation(self) -> FieldValue {
        match self {
            Self::Text { text } => FieldValue::Text(text),
            Self::List { items } => FieldValue::Passages(items),
            Self::Retrieval { passages, .. } => FieldValue::Passages(passages),
        }
    }
}

/// The core Tool trait.
///
/// Implementations should report expected failures as `Err`; the tool loop
/// converts any error into an observation and carries on.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "Search").
    fn name(&self) -> &str;

    /// What the bracketed input stands for, e.g. "query". Documentation only.
    fn input_variable(&self) -> &str;

    /// A description of what this tool does (embedded in the instructions).
    fn description(&self) -> &str;

    /// Invoke the tool with the raw text between the brackets.
    async fn invoke(&self, input: &str) -> std::result::Result<ToolOutput, ToolError>;
}

/// What an action name resolves to.
pub enum ActionTarget<'a> {
    Registered(&'a dyn Tool),
    Finish,
}

/// An ordered registry of available tools.
///
/// Registration order is the order tools are listed in prompts.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name,
    /// keeping its position.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        if tool.name() == FINISH {
            return Err(ToolError::ReservedName(FINISH.into()));
        }
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Resolve an action name to a tool or the finish signal.
    pub fn resolve(&self, name: &str) -> Option<ActionTarget<'_>> {
        if name == FINISH {
            return Some(ActionTarget::Finish);
        }
        self.get(name).map(ActionTarget::Registered)
    }

    /// Registered tools in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
