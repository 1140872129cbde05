//! Loop patterns — the hop-bounded act/observe/repair strategies.
//!
//! 1. **ReAct** — Thought → Action → Observation over registered tools
//! 2. **Program of Thought** — generate code, run it, repair it, answer
//!
//! Both build a fresh schema per hop and act through an
//! [`ActionInterpreter`](crate::action::ActionInterpreter).

pub mod program_of_thought;
pub mod react;

pub use program_of_thought::{ProgramOfThought, ProgramOfThoughtResult};
pub use react::{ReactAgent, ReactOutput, ReactResult};

#[cfg(test)]
pub(crate) mod test_helpers;
