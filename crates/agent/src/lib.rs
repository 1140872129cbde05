//! The hop loops — the heart of hoploop.
//!
//! Both loops follow a **Think → Act → Observe** cycle with a hard hop
//! ceiling:
//!
//! 1. **Build** the hop's schema (prior hops become inputs)
//! 2. **Predict** the hop's output fields
//! 3. **Act** on the output: dispatch a tool, or run generated code
//! 4. **Observe**: feed the result (or the failure) into the next hop
//!
//! [`ReactAgent`] stops when the model writes `Finish[answer]` and degrades
//! to an empty answer when it runs out of hops. [`ProgramOfThought`] repairs
//! failing code until it runs, and reports `None` if it never does.

pub mod action;
pub mod chat;
pub mod code;
pub mod patterns;
pub mod schema;

pub use action::{
    ACTION_DIAGNOSTIC, ActionInterpreter, ActionOutcome, Interpretation, ToolDispatcher,
    parse_action,
};
pub use chat::ChatPredictor;
pub use code::{CodeExecutor, parse_code};
pub use patterns::{
    ProgramOfThought, ProgramOfThoughtResult, ReactAgent, ReactOutput, ReactResult,
};
pub use schema::{CodeMode, HopSlots, pot_schema, react_schema};
