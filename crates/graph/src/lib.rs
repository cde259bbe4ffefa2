//! # Flowboard Graph
//!
//! The board document a workflow editor operates on, plus the plumbing shared by
//! the copilot command applier and the board search index.
//!
//! ## Features
//!
//! - **Board model** - nodes, pins, layers, variables and comments
//! - **Default-value codec** - JSON bytes stored on pins and variables
//! - **Layer forest** - breadcrumbs and explicit cycle reports for malformed parents
//! - **Mutations** - id-addressed [`GenericCommand`]s and an in-memory executor
//!
//! ## Architecture
//!
//! ```text
//! Board
//!     │
//!     ├──> LayerForest (petgraph)
//!     │      ├─ Nodes: layers
//!     │      ├─ Edges: parent -> child
//!     │      └─ path() / validate()
//!     │
//!     └──> Board::execute(GenericCommand)
//!            ├─ fresh ids for created entities
//!            ├─ connection bookkeeping on both pins
//!            └─ layer mirrors kept in sync
//! ```

mod command;
mod error;
mod execute;
mod graph;
mod layers;
mod types;
mod value;

pub use command::{GenericCommand, Mutated};
pub use error::{GraphError, Result};
pub use layers::{LayerCycle, LayerForest, MAX_LAYER_DEPTH};
pub use types::{
    Board, Comment, Coordinates, Layer, Node, Pin, PinType, ValueType, Variable, VariableType,
};
pub use value::{decode_default_value, display_value, encode_default_value, normalize_literal};
