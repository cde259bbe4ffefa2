use crate::types::{Comment, Coordinates, Layer, Node, Variable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Id-addressed mutation sent to a board's mutation facility.
///
/// Unlike the reference-based copilot commands, every id here is a real board id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "command_type")]
pub enum GenericCommand {
    AddNode {
        node: Node,
        #[serde(default)]
        current_layer: Option<String>,
    },
    RemoveNode {
        node_id: String,
    },
    ConnectPins {
        from_node: String,
        from_pin: String,
        to_node: String,
        to_pin: String,
    },
    DisconnectPins {
        from_node: String,
        from_pin: String,
        to_node: String,
        to_pin: String,
    },
    /// Full node replacement; `old_node` lets an undo log restore the previous state
    UpdateNode {
        old_node: Option<Node>,
        node: Node,
    },
    MoveNode {
        node_id: String,
        from_coordinates: Option<Coordinates>,
        to_coordinates: Coordinates,
        #[serde(default)]
        current_layer: Option<String>,
    },
    UpsertVariable {
        variable: Variable,
        old_variable: Option<Variable>,
    },
    RemoveVariable {
        variable_id: String,
    },
    UpsertComment {
        comment: Comment,
        old_comment: Option<Comment>,
        #[serde(default)]
        current_layer: Option<String>,
    },
    RemoveComment {
        comment_id: String,
    },
    UpsertLayer {
        layer: Layer,
        #[serde(default)]
        node_ids: Vec<String>,
    },
    AddNodesToLayer {
        layer_id: String,
        node_ids: Vec<String>,
    },
    RemoveNodesFromLayer {
        layer_id: String,
        node_ids: Vec<String>,
    },
    RemoveLayer {
        layer_id: String,
        #[serde(default = "default_preserve_nodes")]
        preserve_nodes: bool,
    },
}

impl GenericCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "AddNode",
            Self::RemoveNode { .. } => "RemoveNode",
            Self::ConnectPins { .. } => "ConnectPins",
            Self::DisconnectPins { .. } => "DisconnectPins",
            Self::UpdateNode { .. } => "UpdateNode",
            Self::MoveNode { .. } => "MoveNode",
            Self::UpsertVariable { .. } => "UpsertVariable",
            Self::RemoveVariable { .. } => "RemoveVariable",
            Self::UpsertComment { .. } => "UpsertComment",
            Self::RemoveComment { .. } => "RemoveComment",
            Self::UpsertLayer { .. } => "UpsertLayer",
            Self::AddNodesToLayer { .. } => "AddNodesToLayer",
            Self::RemoveNodesFromLayer { .. } => "RemoveNodesFromLayer",
            Self::RemoveLayer { .. } => "RemoveLayer",
        }
    }
}

/// Entity produced by a successful mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "value", rename_all = "snake_case")]
pub enum Mutated {
    Node(Node),
    Variable(Variable),
    Comment(Comment),
    Layer(Layer),
    Connection {
        from_pin: String,
        to_pin: String,
    },
    Removed {
        id: String,
    },
}

impl Mutated {
    pub fn into_node(self) -> Option<Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Node(node) => &node.id,
            Self::Variable(variable) => &variable.id,
            Self::Comment(comment) => &comment.id,
            Self::Layer(layer) => &layer.id,
            Self::Connection { to_pin, .. } => to_pin,
            Self::Removed { id } => id,
        }
    }
}

fn default_preserve_nodes() -> bool {
    true
}
