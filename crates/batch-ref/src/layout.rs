use flowboard_graph::Board;
use flowboard_protocol::NodePosition;

/// Default placement for nodes created without an explicit position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub column_spacing: f64,
    pub row_spacing: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 3,
            column_spacing: 300.0,
            row_spacing: 200.0,
        }
    }
}

impl GridLayout {
    /// Grid origin: one column right of the rightmost node, at its height
    pub fn origin(&self, board: &Board) -> NodePosition {
        match board.rightmost_node() {
            Some(node) => NodePosition {
                x: f64::from(node.coordinates.0) + self.column_spacing,
                y: f64::from(node.coordinates.1),
            },
            None => NodePosition { x: 0.0, y: 0.0 },
        }
    }

    /// Position of the `index`-th created node
    pub fn position(&self, origin: NodePosition, index: usize) -> NodePosition {
        let columns = self.columns.max(1);
        NodePosition {
            x: origin.x + (index % columns) as f64 * self.column_spacing,
            y: origin.y + (index / columns) as f64 * self.row_spacing,
        }
    }
}
