use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApplyError>;

/// Why the mutation facility refused a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationErrorKind {
    /// The command was invalid for the current board
    Rejected,
    /// The command was built against an outdated snapshot
    StaleVersion,
    /// A target entity no longer exists
    NotFound,
    /// The facility could not be reached
    Unavailable,
}

impl fmt::Display for MutationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Rejected => "rejected",
            Self::StaleVersion => "stale version",
            Self::NotFound => "not found",
            Self::Unavailable => "unavailable",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone)]
#[error("mutation {kind}: {message}")]
pub struct MutationError {
    pub kind: MutationErrorKind,
    pub message: String,
}

impl MutationError {
    pub fn new(kind: MutationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Failure of a single command; never aborts the batch
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Node type '{node_type}' is not in the catalog ({catalog_size} types available)")]
    UnknownNodeType {
        node_type: String,
        catalog_size: usize,
    },

    #[error("Node '{reference}' not found. Known references: [{}]", .known.join(", "))]
    NodeNotFound {
        reference: String,
        known: Vec<String>,
    },

    #[error(
        "Pin '{pin}' not found on node '{node_ref}' (resolved to {node_id}). Available pins: [{}]",
        .available.join(", ")
    )]
    PinNotFound {
        node_ref: String,
        node_id: String,
        pin: String,
        available: Vec<String>,
    },

    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to encode value for {target}: {source}")]
    Encoding {
        target: String,
        #[source]
        source: flowboard_graph::GraphError,
    },

    #[error("Unexpected {0} response from mutation facility")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}
