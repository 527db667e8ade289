//! Error types for the concurrent-iteration engine.

use congraph_store::GraphError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors the engine surfaces to callers.
///
/// Store-level failures (denied mutations, concurrent-modification faults
/// raised by a native iterator, operations on a closed graph) pass through
/// unchanged inside [`EngineError::Graph`]; the engine never swallows them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The underlying graph store signalled an error.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The engine configuration is invalid.
    #[error("invalid engine configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        message: String,
    },
}

impl EngineError {
    /// Creates an invalid-configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
