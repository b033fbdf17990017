//! Automation error types.

use thiserror::Error;

use crate::definition::NodeId;

/// Result type for automation operations.
pub type AutomationResult<T> = Result<T, AutomationError>;

/// Errors that can occur during automation operations.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// The automation graph is structurally invalid.
    #[error("invalid automation graph: {0}")]
    InvalidGraph(String),

    /// An action node's side effect failed.
    #[error("action at node {node_id} failed: {source}")]
    ActionFailed {
        /// ID of the node whose action failed.
        node_id: NodeId,
        /// The collaborator error.
        #[source]
        source: revend_core::Error,
    },

    /// An automation store operation failed.
    #[error("store error: {0}")]
    Store(#[from] revend_core::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}
