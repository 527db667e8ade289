//! Error types for graph stores.

use thiserror::Error;

/// Result type for graph store operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors a graph store or its native iterators can signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A native iterator detected a mutation of the graph it was created on.
    ///
    /// Native iterators are only valid as long as the graph is unchanged;
    /// once a triple is added or removed, every iterator opened before the
    /// mutation fails with this error on its next pull.
    #[error("concurrent modification: the graph changed while a native iterator was open")]
    ConcurrentModification,

    /// The store refused to add a triple.
    #[error("add denied: {reason}")]
    AddDenied {
        /// Why the store refused the triple.
        reason: String,
    },

    /// The store refused to delete a triple.
    #[error("delete denied: {reason}")]
    DeleteDenied {
        /// Why the store refused the deletion.
        reason: String,
    },

    /// The graph has been closed and no longer accepts operations.
    #[error("graph is closed")]
    Closed,
}

impl GraphError {
    /// Creates an add-denied error.
    pub fn add_denied(reason: impl Into<String>) -> Self {
        Self::AddDenied {
            reason: reason.into(),
        }
    }

    /// Creates a delete-denied error.
    pub fn delete_denied(reason: impl Into<String>) -> Self {
        Self::DeleteDenied {
            reason: reason.into(),
        }
    }
}
