use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Pin not found: {pin_id} on node {node_id}")]
    PinNotFound { node_id: String, pin_id: String },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Layer cycle detected at {layer_id}: {}", .cycle.join(" -> "))]
    LayerCycle { layer_id: String, cycle: Vec<String> },

    #[error("Layer nesting deeper than {max_depth} at {layer_id}")]
    LayerDepthExceeded { layer_id: String, max_depth: usize },

    #[error("Stale state for {0}: expected snapshot does not match the board")]
    Stale(String),

    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    #[error("Value encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
