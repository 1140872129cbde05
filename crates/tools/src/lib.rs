//! Built-in tools for hoploop.
//!
//! The tool loop acts through `Search[query]` and `Calculate[expression]`;
//! the code loop runs generated programs in a [`PythonSandbox`].

pub mod calculator;
pub mod python_sandbox;
pub mod search;

use hoploop_config::{ProgramOfThoughtConfig, ReactConfig};
use hoploop_core::error::ToolError;
use hoploop_core::tool::ToolRegistry;

pub use calculator::CalculatorTool;
pub use python_sandbox::PythonSandbox;
pub use search::SearchTool;

/// Create the tool registry described by the `[react]` config section.
///
/// `Search` is always registered, over an empty corpus when no
/// `corpus_path` is set. `Calculate` is registered unless disabled.
pub fn default_registry(config: &ReactConfig) -> Result<ToolRegistry, ToolError> {
    let search = match &config.corpus_path {
        Some(path) => SearchTool::from_file(path, config.num_results)?,
        None => SearchTool::new(Vec::new(), config.num_results),
    };

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(search))?;
    if config.calculator {
        registry.register(Box::new(CalculatorTool))?;
    }
    Ok(registry)
}

/// Create the code sandbox described by the `[program_of_thought]` section.
pub fn sandbox_from_config(config: &ProgramOfThoughtConfig) -> PythonSandbox {
    let sandbox = PythonSandbox::new(&config.python_command);
    match config.exec_timeout_secs {
        Some(secs) => sandbox.with_timeout(secs),
        None => sandbox,
    }
}
