use crate::types::{Board, Layer, Node, Pin};
use std::collections::HashSet;

impl Board {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Find a node by id, falling back to nodes only mirrored inside a layer
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes
            .get(node_id)
            .or_else(|| self.layers.values().find_map(|layer| layer.nodes.get(node_id)))
    }

    /// Every node on the board, board-level first, deduplicated by id
    pub fn nodes_iter(&self) -> impl Iterator<Item = &Node> {
        let mut seen = HashSet::new();
        self.nodes
            .values()
            .chain(self.layers.values().flat_map(|layer| layer.nodes.values()))
            .filter(move |node| seen.insert(node.id.as_str()))
    }

    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.get(layer_id)
    }

    /// Look up a pin on any node, then on layer boundaries
    pub fn pin_by_id(&self, pin_id: &str) -> Option<&Pin> {
        self.nodes_iter()
            .find_map(|node| node.pins.get(pin_id))
            .or_else(|| self.layers.values().find_map(|layer| layer.pins.get(pin_id)))
    }

    /// Node owning the given pin id
    pub fn node_of_pin(&self, pin_id: &str) -> Option<&Node> {
        self.nodes_iter().find(|node| node.pins.contains_key(pin_id))
    }

    /// Node with the largest x coordinate; seeds default placement of new nodes
    pub fn rightmost_node(&self) -> Option<&Node> {
        self.nodes_iter().max_by(|a, b| {
            a.coordinates
                .0
                .partial_cmp(&b.coordinates.0)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes_iter().count()
    }

    /// Apply `update` to the node and to every layer mirror of it
    pub(crate) fn update_node_copies<F>(&mut self, node_id: &str, mut update: F) -> bool
    where
        F: FnMut(&mut Node),
    {
        let mut found = false;
        if let Some(node) = self.nodes.get_mut(node_id) {
            update(node);
            found = true;
        }
        for layer in self.layers.values_mut() {
            if let Some(node) = layer.nodes.get_mut(node_id) {
                update(node);
                found = true;
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PinType, VariableType};
    use std::collections::HashMap;

    fn node(id: &str, x: f32) -> Node {
        let mut pins = HashMap::new();
        pins.insert(
            format!("{id}-in"),
            Pin {
                id: format!("{id}-in"),
                name: "input".to_string(),
                friendly_name: "Input".to_string(),
                description: String::new(),
                pin_type: PinType::Input,
                data_type: VariableType::String,
                value_type: Default::default(),
                default_value: None,
                connected_to: Default::default(),
                depends_on: Default::default(),
            },
        );
        Node {
            id: id.to_string(),
            name: "log".to_string(),
            friendly_name: "Log".to_string(),
            category: String::new(),
            description: String::new(),
            comment: None,
            pins,
            coordinates: (x, 0.0, 0.0),
            layer: None,
        }
    }

    #[test]
    fn finds_layer_only_nodes_and_pins() {
        let mut board = Board::new("b", "board");
        board.nodes.insert("a".into(), node("a", 10.0));
        let mut layer = Layer {
            id: "l".into(),
            name: "Layer".into(),
            comment: None,
            parent_id: None,
            nodes: HashMap::new(),
            pins: HashMap::new(),
            coordinates: (0.0, 0.0, 0.0),
            color: None,
        };
        layer.nodes.insert("hidden".into(), node("hidden", 500.0));
        layer.nodes.insert("a".into(), node("a", 10.0));
        board.layers.insert("l".into(), layer);

        assert!(board.node("hidden").is_some());
        assert_eq!(board.node_count(), 2);
        assert_eq!(board.pin_by_id("hidden-in").map(|p| p.name.as_str()), Some("input"));
        assert_eq!(board.node_of_pin("a-in").map(|n| n.id.as_str()), Some("a"));
        assert_eq!(board.rightmost_node().map(|n| n.id.as_str()), Some("hidden"));
    }
}
