//! # hoploop core
//!
//! Domain types, traits, and error definitions for the hoploop agentic
//! control loops. This crate has **zero framework dependencies** — it defines
//! the seams that the loops in `hoploop-agent` drive and that concrete
//! backends implement against.
//!
//! ## Seams
//!
//! - [`Predictor`] — fills the output fields of a [`Schema`] given input values
//! - [`Tool`] — a named capability the tool loop can dispatch to
//! - [`CodeSandbox`] — executes generated code under an import whitelist
//! - [`Provider`] — a chat-completion backend (used by the chat predictor)

pub mod error;
pub mod message;
pub mod predictor;
pub mod provider;
pub mod sandbox;
pub mod signature;
pub mod tool;
pub mod values;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use predictor::Predictor;
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use sandbox::{ActionSpace, CodeSandbox};
pub use signature::{FieldRole, FieldSpec, Formatter, Schema};
pub use tool::{ActionTarget, FINISH, Tool, ToolOutput, ToolRegistry};
pub use values::{FieldValue, Values, passages_to_text};
