//! Error types for the hoploop domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each seam returns its
//! own error; only predictor failures and construction-time configuration
//! problems escape the loops as [`Error`].

use thiserror::Error;

/// The top-level error type for all hoploop operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Predictor errors ---
    #[error("Predictor error: {0}")]
    Predict(#[from] PredictError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of the step predictor. These are never recovered by the loops.
#[derive(Debug, Clone, Error)]
pub enum PredictError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool name `{0}` is reserved")]
    ReservedName(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Error)]
pub enum SandboxError {
    #[error("Import of module `{module}` is not allowed")]
    ImportNotAllowed { module: String },

    #[error("{0}")]
    Execution(String),

    #[error("Failed to start interpreter: {0}")]
    Spawn(String),

    #[error("Execution timed out after {secs}s")]
    Timeout { secs: u64 },
}

#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    #[error("Malformed signature: {0}")]
    Malformed(String),

    #[error("Duplicate field name: {0}")]
    DuplicateField(String),
}
