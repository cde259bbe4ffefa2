use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Canvas position (x, y, z)
pub type Coordinates = (f32, f32, f32);

/// Direction of a pin on its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PinType {
    Input,
    Output,
}

impl PinType {
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "input" | "in" => Some(Self::Input),
            "output" | "out" => Some(Self::Output),
            _ => None,
        }
    }
}

/// Data type carried by a pin or variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum VariableType {
    Execution,
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Date,
    PathBuf,
    Generic,
    Struct,
    Byte,
}

impl VariableType {
    /// Parse the loose type names produced by command generators ("string", "Int", ...)
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let parsed = match normalized.as_str() {
            "execution" | "exec" => Self::Execution,
            "string" | "str" | "text" => Self::String,
            "integer" | "int" | "i64" => Self::Integer,
            "float" | "number" | "f64" => Self::Float,
            "boolean" | "bool" => Self::Boolean,
            "date" | "datetime" => Self::Date,
            "pathbuf" | "path" => Self::PathBuf,
            "generic" | "any" => Self::Generic,
            "struct" | "object" | "json" => Self::Struct,
            "byte" | "bytes" => Self::Byte,
            _ => return None,
        };
        Some(parsed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Execution => "Execution",
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::PathBuf => "PathBuf",
            Self::Generic => "Generic",
            Self::Struct => "Struct",
            Self::Byte => "Byte",
        }
    }
}

/// Container shape of a value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum ValueType {
    #[default]
    Normal,
    Array,
    HashMap,
    HashSet,
}

impl ValueType {
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" | "" => Some(Self::Normal),
            "array" | "list" | "vec" => Some(Self::Array),
            "hashmap" | "map" => Some(Self::HashMap),
            "hashset" | "set" => Some(Self::HashSet),
            _ => None,
        }
    }
}

/// Typed port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Pin {
    pub id: String,
    pub name: String,
    pub friendly_name: String,
    #[serde(default)]
    pub description: String,
    pub pin_type: PinType,
    pub data_type: VariableType,
    #[serde(default)]
    pub value_type: ValueType,

    /// JSON-encoded default value (see [`crate::decode_default_value`])
    #[serde(default)]
    pub default_value: Option<Vec<u8>>,

    /// Pin ids this pin feeds into (outputs only)
    #[serde(default)]
    pub connected_to: BTreeSet<String>,

    /// Pin ids this pin reads from (inputs only)
    #[serde(default)]
    pub depends_on: BTreeSet<String>,
}

impl Pin {
    pub fn is_execution(&self) -> bool {
        self.data_type == VariableType::Execution
    }
}

/// Graph node instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    pub id: String,

    /// Node type name (catalog key, e.g. "http_request")
    pub name: String,
    pub friendly_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub pins: HashMap<String, Pin>,
    #[serde(default)]
    pub coordinates: Coordinates,

    /// Owning layer, `None` for the root canvas
    #[serde(default)]
    pub layer: Option<String>,
}

impl Node {
    pub fn pins_of(&self, pin_type: PinType) -> impl Iterator<Item = &Pin> {
        self.pins.values().filter(move |pin| pin.pin_type == pin_type)
    }
}

/// Named grouping of nodes, nested through `parent_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Layer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Nodes directly owned by this layer
    #[serde(default)]
    pub nodes: HashMap<String, Node>,

    /// Exposed boundary pins
    #[serde(default)]
    pub pins: HashMap<String, Pin>,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Variable {
    pub id: String,
    pub name: String,
    pub data_type: VariableType,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_value: Option<Vec<u8>>,
    #[serde(default)]
    pub secret: bool,
    #[serde(default)]
    pub exposed: bool,
    #[serde(default = "default_true")]
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Comment {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub z_index: Option<i32>,
    #[serde(default)]
    pub author: Option<String>,

    /// Unix epoch milliseconds
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub layer: Option<String>,
}

/// The whole workflow document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Board {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,

    /// Every node on the board; `Node::layer` names the owning layer
    #[serde(default)]
    pub nodes: HashMap<String, Node>,
    #[serde(default)]
    pub variables: HashMap<String, Variable>,
    #[serde(default)]
    pub comments: HashMap<String, Comment>,
    #[serde(default)]
    pub layers: HashMap<String, Layer>,
    #[serde(default)]
    pub version: (u32, u32, u32),
}

fn default_true() -> bool {
    true
}
