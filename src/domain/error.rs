use thiserror::Error;

/// Validation failures raised while checking render configs. The display
/// text is the client-facing detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("No graph provided for rendering")]
    EmptyGraph,
    #[error("Unsupported domain type: {0}")]
    UnsupportedDomainType(String),
    #[error("Edge {edge_id} references unknown node {node_id}")]
    UnknownNode { edge_id: String, node_id: String },
    #[error("{message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
