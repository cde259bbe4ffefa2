use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canvas position requested by a command generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// Custom pin requested for a placeholder step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlaceholderPinDef {
    pub name: String,
    pub friendly_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// "Input" or "Output"
    pub pin_type: String,
    /// "String", "Integer", "Float", "Boolean", "Struct", "Generic", "Execution"
    pub data_type: String,
    /// "Normal" when absent
    #[serde(default)]
    pub value_type: Option<String>,
}

/// Board edit proposed by a copilot or any other command generator.
///
/// Nodes and pins are addressed by human-readable references: an explicit
/// `ref_id` from an earlier `AddNode`, a positional `$N` marker, a node type
/// name, or a real board id. Pins may be named by id, name or friendly name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "command_type")]
pub enum BoardCommand {
    AddNode {
        node_type: String,
        #[serde(default)]
        ref_id: Option<String>,
        #[serde(default)]
        position: Option<NodePosition>,
        #[serde(default)]
        friendly_name: Option<String>,
        /// Layer to place the node in; root canvas when absent
        #[serde(default)]
        target_layer: Option<String>,
        #[serde(default)]
        summary: Option<String>,
    },
    /// Process-modeling step with `exec_in`/`exec_out` and optional custom pins
    AddPlaceholder {
        name: String,
        #[serde(default)]
        ref_id: Option<String>,
        #[serde(default)]
        position: Option<NodePosition>,
        #[serde(default)]
        pins: Option<Vec<PlaceholderPinDef>>,
        #[serde(default)]
        target_layer: Option<String>,
        #[serde(default)]
        summary: Option<String>,
    },
    RemoveNode {
        node_id: String,
        #[serde(default)]
        summary: Option<String>,
    },
    ConnectPins {
        from_node: String,
        from_pin: String,
        to_node: String,
        to_pin: String,
        #[serde(default)]
        summary: Option<String>,
    },
    DisconnectPins {
        from_node: String,
        from_pin: String,
        to_node: String,
        to_pin: String,
        #[serde(default)]
        summary: Option<String>,
    },
    UpdateNodePin {
        node_id: String,
        pin_id: String,
        value: serde_json::Value,
        #[serde(default)]
        summary: Option<String>,
    },
    MoveNode {
        node_id: String,
        position: NodePosition,
        #[serde(default)]
        target_layer: Option<String>,
        #[serde(default)]
        summary: Option<String>,
    },
    CreateVariable {
        name: String,
        /// "String", "Integer", "Float", "Boolean", "Struct", ...
        data_type: String,
        /// "Normal", "Array", "HashMap", "HashSet"
        #[serde(default)]
        value_type: Option<String>,
        #[serde(default)]
        default_value: Option<serde_json::Value>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        secret: bool,
        #[serde(default)]
        summary: Option<String>,
    },
    UpdateVariable {
        variable_id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        default_value: Option<serde_json::Value>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        summary: Option<String>,
    },
    DeleteVariable {
        variable_id: String,
        #[serde(default)]
        summary: Option<String>,
    },
    CreateComment {
        content: String,
        position: NodePosition,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        target_layer: Option<String>,
        #[serde(default)]
        summary: Option<String>,
    },
    UpdateComment {
        comment_id: String,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        position: Option<NodePosition>,
        #[serde(default)]
        summary: Option<String>,
    },
    DeleteComment {
        comment_id: String,
        #[serde(default)]
        summary: Option<String>,
    },
    CreateLayer {
        name: String,
        #[serde(default)]
        node_ids: Vec<String>,
        #[serde(default)]
        position: Option<NodePosition>,
        #[serde(default)]
        color: Option<String>,
        /// Parent layer; root when absent
        #[serde(default)]
        target_layer: Option<String>,
        #[serde(default)]
        summary: Option<String>,
    },
    AddNodesToLayer {
        layer_id: String,
        node_ids: Vec<String>,
        #[serde(default)]
        summary: Option<String>,
    },
    RemoveNodesFromLayer {
        layer_id: String,
        node_ids: Vec<String>,
        #[serde(default)]
        summary: Option<String>,
    },
    RemoveLayer {
        layer_id: String,
        #[serde(default)]
        summary: Option<String>,
    },
}

impl BoardCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "AddNode",
            Self::AddPlaceholder { .. } => "AddPlaceholder",
            Self::RemoveNode { .. } => "RemoveNode",
            Self::ConnectPins { .. } => "ConnectPins",
            Self::DisconnectPins { .. } => "DisconnectPins",
            Self::UpdateNodePin { .. } => "UpdateNodePin",
            Self::MoveNode { .. } => "MoveNode",
            Self::CreateVariable { .. } => "CreateVariable",
            Self::UpdateVariable { .. } => "UpdateVariable",
            Self::DeleteVariable { .. } => "DeleteVariable",
            Self::CreateComment { .. } => "CreateComment",
            Self::UpdateComment { .. } => "UpdateComment",
            Self::DeleteComment { .. } => "DeleteComment",
            Self::CreateLayer { .. } => "CreateLayer",
            Self::AddNodesToLayer { .. } => "AddNodesToLayer",
            Self::RemoveNodesFromLayer { .. } => "RemoveNodesFromLayer",
            Self::RemoveLayer { .. } => "RemoveLayer",
        }
    }

    /// Node creation runs in its own pass before everything else
    pub fn is_node_creation(&self) -> bool {
        matches!(self, Self::AddNode { .. } | Self::AddPlaceholder { .. })
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            Self::AddNode { summary, .. }
            | Self::AddPlaceholder { summary, .. }
            | Self::RemoveNode { summary, .. }
            | Self::ConnectPins { summary, .. }
            | Self::DisconnectPins { summary, .. }
            | Self::UpdateNodePin { summary, .. }
            | Self::MoveNode { summary, .. }
            | Self::CreateVariable { summary, .. }
            | Self::UpdateVariable { summary, .. }
            | Self::DeleteVariable { summary, .. }
            | Self::CreateComment { summary, .. }
            | Self::UpdateComment { summary, .. }
            | Self::DeleteComment { summary, .. }
            | Self::CreateLayer { summary, .. }
            | Self::AddNodesToLayer { summary, .. }
            | Self::RemoveNodesFromLayer { summary, .. }
            | Self::RemoveLayer { summary, .. } => summary.as_deref(),
        }
    }
}
