use crate::command::{GenericCommand, Mutated};
use crate::error::{GraphError, Result};
use crate::types::{Board, Comment, Layer, Node, PinType, Variable};
use std::collections::HashSet;

impl Board {
    /// Apply a single mutation in memory.
    ///
    /// New entities always receive fresh ids; the returned [`Mutated`] carries them.
    /// There is no undo log: a failed command leaves the board untouched.
    pub fn execute(&mut self, command: GenericCommand) -> Result<Mutated> {
        let kind = command.kind();
        let result = match command {
            GenericCommand::AddNode {
                node,
                current_layer,
            } => self.add_node(node, current_layer),
            GenericCommand::RemoveNode { node_id } => self.remove_node(&node_id),
            GenericCommand::ConnectPins {
                from_node,
                from_pin,
                to_node,
                to_pin,
            } => self.connect(&from_node, &from_pin, &to_node, &to_pin),
            GenericCommand::DisconnectPins {
                from_node,
                from_pin,
                to_node,
                to_pin,
            } => self.disconnect(&from_node, &from_pin, &to_node, &to_pin),
            GenericCommand::UpdateNode { old_node, node } => self.update_node(old_node, node),
            GenericCommand::MoveNode {
                node_id,
                to_coordinates,
                current_layer,
                ..
            } => self.move_node(&node_id, to_coordinates, current_layer),
            GenericCommand::UpsertVariable { variable, .. } => Ok(self.upsert_variable(variable)),
            GenericCommand::RemoveVariable { variable_id } => self
                .variables
                .remove(&variable_id)
                .map(|v| Mutated::Removed { id: v.id })
                .ok_or(GraphError::VariableNotFound(variable_id)),
            GenericCommand::UpsertComment {
                comment,
                current_layer,
                ..
            } => self.upsert_comment(comment, current_layer),
            GenericCommand::RemoveComment { comment_id } => self
                .comments
                .remove(&comment_id)
                .map(|c| Mutated::Removed { id: c.id })
                .ok_or(GraphError::CommentNotFound(comment_id)),
            GenericCommand::UpsertLayer { layer, node_ids } => self.upsert_layer(layer, node_ids),
            GenericCommand::AddNodesToLayer { layer_id, node_ids } => {
                self.add_nodes_to_layer(&layer_id, &node_ids)
            }
            GenericCommand::RemoveNodesFromLayer { layer_id, node_ids } => {
                self.remove_nodes_from_layer(&layer_id, &node_ids)
            }
            GenericCommand::RemoveLayer {
                layer_id,
                preserve_nodes,
            } => self.remove_layer(&layer_id, preserve_nodes),
        };

        match &result {
            Ok(mutated) => {
                self.version.2 += 1;
                log::debug!("{} applied to board {} ({})", kind, self.id, mutated.id());
            }
            Err(err) => log::debug!("{} rejected on board {}: {}", kind, self.id, err),
        }
        result
    }

    fn add_node(&mut self, mut node: Node, current_layer: Option<String>) -> Result<Mutated> {
        if let Some(layer_id) = &current_layer {
            self.require_layer(layer_id)?;
        }

        let mut taken = self.taken_ids();
        node.id = fresh_id(&mut taken, "node");
        let pins = std::mem::take(&mut node.pins);
        for mut pin in pins.into_values() {
            pin.id = fresh_id(&mut taken, "pin");
            pin.connected_to.clear();
            pin.depends_on.clear();
            node.pins.insert(pin.id.clone(), pin);
        }
        node.layer = current_layer;

        if let Some(layer) = node.layer.as_ref().and_then(|id| self.layers.get_mut(id)) {
            layer.nodes.insert(node.id.clone(), node.clone());
        }
        self.nodes.insert(node.id.clone(), node.clone());
        Ok(Mutated::Node(node))
    }

    fn remove_node(&mut self, node_id: &str) -> Result<Mutated> {
        let node = self
            .node(node_id)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;

        self.nodes.remove(node_id);
        for layer in self.layers.values_mut() {
            layer.nodes.remove(node_id);
        }

        let pin_ids: HashSet<&String> = node.pins.keys().collect();
        let affected: Vec<String> = self
            .nodes_iter()
            .filter(|other| {
                other.pins.values().any(|pin| {
                    pin.connected_to.iter().any(|id| pin_ids.contains(id))
                        || pin.depends_on.iter().any(|id| pin_ids.contains(id))
                })
            })
            .map(|other| other.id.clone())
            .collect();
        for other_id in affected {
            self.update_node_copies(&other_id, |other| {
                for pin in other.pins.values_mut() {
                    pin.connected_to.retain(|id| !pin_ids.contains(id));
                    pin.depends_on.retain(|id| !pin_ids.contains(id));
                }
            });
        }

        Ok(Mutated::Removed { id: node.id })
    }

    fn connection_endpoints(
        &self,
        from_node: &str,
        from_pin: &str,
        to_node: &str,
        to_pin: &str,
    ) -> Result<()> {
        let source = self
            .node(from_node)
            .ok_or_else(|| GraphError::NodeNotFound(from_node.to_string()))?;
        let target = self
            .node(to_node)
            .ok_or_else(|| GraphError::NodeNotFound(to_node.to_string()))?;
        let out_pin = source.pins.get(from_pin).ok_or_else(|| GraphError::PinNotFound {
            node_id: from_node.to_string(),
            pin_id: from_pin.to_string(),
        })?;
        let in_pin = target.pins.get(to_pin).ok_or_else(|| GraphError::PinNotFound {
            node_id: to_node.to_string(),
            pin_id: to_pin.to_string(),
        })?;

        if from_node == to_node {
            return Err(GraphError::InvalidConnection(format!(
                "node {from_node} cannot connect to itself"
            )));
        }
        if out_pin.pin_type != PinType::Output || in_pin.pin_type != PinType::Input {
            return Err(GraphError::InvalidConnection(format!(
                "{} ({:?}) -> {} ({:?}) must go from an output to an input",
                out_pin.name, out_pin.pin_type, in_pin.name, in_pin.pin_type
            )));
        }
        if out_pin.is_execution() != in_pin.is_execution() {
            return Err(GraphError::InvalidConnection(format!(
                "{} and {} mix execution and data pins",
                out_pin.name, in_pin.name
            )));
        }
        Ok(())
    }

    fn connect(
        &mut self,
        from_node: &str,
        from_pin: &str,
        to_node: &str,
        to_pin: &str,
    ) -> Result<Mutated> {
        self.connection_endpoints(from_node, from_pin, to_node, to_pin)?;

        self.update_node_copies(from_node, |node| {
            if let Some(pin) = node.pins.get_mut(from_pin) {
                pin.connected_to.insert(to_pin.to_string());
            }
        });
        self.update_node_copies(to_node, |node| {
            if let Some(pin) = node.pins.get_mut(to_pin) {
                pin.depends_on.insert(from_pin.to_string());
            }
        });

        Ok(Mutated::Connection {
            from_pin: from_pin.to_string(),
            to_pin: to_pin.to_string(),
        })
    }

    fn disconnect(
        &mut self,
        from_node: &str,
        from_pin: &str,
        to_node: &str,
        to_pin: &str,
    ) -> Result<Mutated> {
        self.connection_endpoints(from_node, from_pin, to_node, to_pin)?;

        let connected = self
            .node(from_node)
            .and_then(|node| node.pins.get(from_pin))
            .is_some_and(|pin| pin.connected_to.contains(to_pin));
        if !connected {
            return Err(GraphError::InvalidConnection(format!(
                "{from_pin} is not connected to {to_pin}"
            )));
        }

        self.update_node_copies(from_node, |node| {
            if let Some(pin) = node.pins.get_mut(from_pin) {
                pin.connected_to.remove(to_pin);
            }
        });
        self.update_node_copies(to_node, |node| {
            if let Some(pin) = node.pins.get_mut(to_pin) {
                pin.depends_on.remove(from_pin);
            }
        });

        Ok(Mutated::Connection {
            from_pin: from_pin.to_string(),
            to_pin: to_pin.to_string(),
        })
    }

    fn update_node(&mut self, old_node: Option<Node>, node: Node) -> Result<Mutated> {
        let current = self
            .node(&node.id)
            .ok_or_else(|| GraphError::NodeNotFound(node.id.clone()))?;
        if let Some(old) = &old_node {
            if old != current {
                return Err(GraphError::Stale(node.id.clone()));
            }
        }

        let replacement = node.clone();
        self.update_node_copies(&node.id, |existing| *existing = replacement.clone());
        Ok(Mutated::Node(node))
    }

    fn move_node(
        &mut self,
        node_id: &str,
        to: crate::types::Coordinates,
        current_layer: Option<String>,
    ) -> Result<Mutated> {
        let node = self
            .node(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
        let layer_change = match current_layer {
            Some(layer_id) if node.layer.as_deref() != Some(layer_id.as_str()) => {
                self.require_layer(&layer_id)?;
                Some(layer_id)
            }
            _ => None,
        };

        self.update_node_copies(node_id, |node| node.coordinates = to);
        if let Some(layer_id) = layer_change {
            self.set_node_layer(node_id, Some(layer_id));
        }

        self.node(node_id)
            .cloned()
            .map(Mutated::Node)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))
    }

    fn upsert_variable(&mut self, mut variable: Variable) -> Mutated {
        if variable.id.is_empty() {
            let mut taken = self.taken_ids();
            variable.id = fresh_id(&mut taken, "var");
        }
        self.variables.insert(variable.id.clone(), variable.clone());
        Mutated::Variable(variable)
    }

    fn upsert_comment(
        &mut self,
        mut comment: Comment,
        current_layer: Option<String>,
    ) -> Result<Mutated> {
        if let Some(layer_id) = &current_layer {
            self.require_layer(layer_id)?;
            comment.layer = current_layer.clone();
        }
        if comment.id.is_empty() {
            let mut taken = self.taken_ids();
            comment.id = fresh_id(&mut taken, "comment");
        }
        self.comments.insert(comment.id.clone(), comment.clone());
        Ok(Mutated::Comment(comment))
    }

    fn upsert_layer(&mut self, mut layer: Layer, node_ids: Vec<String>) -> Result<Mutated> {
        if let Some(parent_id) = &layer.parent_id {
            self.require_layer(parent_id)?;
        }
        self.require_nodes(&node_ids)?;

        if layer.id.is_empty() {
            let mut taken = self.taken_ids();
            layer.id = fresh_id(&mut taken, "layer");
        }
        if let Some(existing) = self.layers.get(&layer.id) {
            layer.nodes = existing.nodes.clone();
        }
        let layer_id = layer.id.clone();
        self.layers.insert(layer_id.clone(), layer);

        for node_id in &node_ids {
            self.set_node_layer(node_id, Some(layer_id.clone()));
        }

        self.layers
            .get(&layer_id)
            .cloned()
            .map(Mutated::Layer)
            .ok_or(GraphError::LayerNotFound(layer_id))
    }

    fn add_nodes_to_layer(&mut self, layer_id: &str, node_ids: &[String]) -> Result<Mutated> {
        self.require_layer(layer_id)?;
        self.require_nodes(node_ids)?;
        for node_id in node_ids {
            self.set_node_layer(node_id, Some(layer_id.to_string()));
        }
        self.layers
            .get(layer_id)
            .cloned()
            .map(Mutated::Layer)
            .ok_or_else(|| GraphError::LayerNotFound(layer_id.to_string()))
    }

    fn remove_nodes_from_layer(&mut self, layer_id: &str, node_ids: &[String]) -> Result<Mutated> {
        let parent = self.require_layer(layer_id)?.parent_id.clone();
        self.require_nodes(node_ids)?;
        for node_id in node_ids {
            let in_layer = self
                .node(node_id)
                .is_some_and(|node| node.layer.as_deref() == Some(layer_id));
            if !in_layer {
                return Err(GraphError::Other(format!(
                    "node {node_id} is not in layer {layer_id}"
                )));
            }
        }
        for node_id in node_ids {
            self.set_node_layer(node_id, parent.clone());
        }
        self.layers
            .get(layer_id)
            .cloned()
            .map(Mutated::Layer)
            .ok_or_else(|| GraphError::LayerNotFound(layer_id.to_string()))
    }

    fn remove_layer(&mut self, layer_id: &str, preserve_nodes: bool) -> Result<Mutated> {
        let parent = self.require_layer(layer_id)?.parent_id.clone();

        let member_ids: Vec<String> = self
            .nodes_iter()
            .filter(|node| node.layer.as_deref() == Some(layer_id))
            .map(|node| node.id.clone())
            .collect();
        for node_id in &member_ids {
            if preserve_nodes {
                self.set_node_layer(node_id, parent.clone());
            } else {
                self.remove_node(node_id)?;
            }
        }

        for layer in self.layers.values_mut() {
            if layer.parent_id.as_deref() == Some(layer_id) {
                layer.parent_id = parent.clone();
            }
        }
        for comment in self.comments.values_mut() {
            if comment.layer.as_deref() == Some(layer_id) {
                comment.layer = parent.clone();
            }
        }

        self.layers.remove(layer_id);
        Ok(Mutated::Removed {
            id: layer_id.to_string(),
        })
    }

    fn set_node_layer(&mut self, node_id: &str, layer_id: Option<String>) {
        let Some(mut node) = self.node(node_id).cloned() else {
            return;
        };
        for layer in self.layers.values_mut() {
            layer.nodes.remove(node_id);
        }
        node.layer = layer_id;
        if let Some(layer) = node.layer.as_ref().and_then(|id| self.layers.get_mut(id)) {
            layer.nodes.insert(node.id.clone(), node.clone());
        }
        self.nodes.insert(node.id.clone(), node);
    }

    fn require_layer(&self, layer_id: &str) -> Result<&Layer> {
        self.layers
            .get(layer_id)
            .ok_or_else(|| GraphError::LayerNotFound(layer_id.to_string()))
    }

    fn require_nodes(&self, node_ids: &[String]) -> Result<()> {
        match node_ids.iter().find(|id| self.node(id).is_none()) {
            Some(missing) => Err(GraphError::NodeNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    fn taken_ids(&self) -> HashSet<String> {
        let mut taken = HashSet::new();
        for node in self.nodes_iter() {
            taken.insert(node.id.clone());
            taken.extend(node.pins.keys().cloned());
        }
        for layer in self.layers.values() {
            taken.insert(layer.id.clone());
            taken.extend(layer.pins.keys().cloned());
        }
        taken.extend(self.variables.keys().cloned());
        taken.extend(self.comments.keys().cloned());
        taken
    }
}

fn fresh_id(taken: &mut HashSet<String>, prefix: &str) -> String {
    let mut n = taken.len() + 1;
    loop {
        let candidate = format!("{prefix}-{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Pin, VariableType};
    use std::collections::HashMap;

    fn pin(name: &str, pin_type: PinType, data_type: VariableType) -> Pin {
        Pin {
            id: name.to_string(),
            name: name.to_string(),
            friendly_name: name.to_string(),
            description: String::new(),
            pin_type,
            data_type,
            value_type: Default::default(),
            default_value: None,
            connected_to: Default::default(),
            depends_on: Default::default(),
        }
    }

    fn prototype(name: &str) -> Node {
        let mut pins = HashMap::new();
        for p in [
            pin("exec_in", PinType::Input, VariableType::Execution),
            pin("exec_out", PinType::Output, VariableType::Execution),
            pin("value", PinType::Input, VariableType::String),
            pin("result", PinType::Output, VariableType::String),
        ] {
            pins.insert(p.id.clone(), p);
        }
        Node {
            id: String::new(),
            name: name.to_string(),
            friendly_name: name.to_string(),
            category: String::new(),
            description: String::new(),
            comment: None,
            pins,
            coordinates: (0.0, 0.0, 0.0),
            layer: None,
        }
    }

    fn pin_id(node: &Node, name: &str) -> String {
        node.pins
            .values()
            .find(|p| p.name == name)
            .map(|p| p.id.clone())
            .unwrap()
    }

    fn add(board: &mut Board, name: &str) -> Node {
        board
            .execute(GenericCommand::AddNode {
                node: prototype(name),
                current_layer: None,
            })
            .unwrap()
            .into_node()
            .unwrap()
    }

    #[test]
    fn add_node_assigns_fresh_ids() {
        let mut board = Board::new("b", "board");
        let a = add(&mut board, "log");
        let b = add(&mut board, "log");
        assert_ne!(a.id, b.id);
        assert!(a.pins.keys().all(|id| !b.pins.contains_key(id)));
        assert_eq!(board.version.2, 2);
    }

    #[test]
    fn connect_and_disconnect_track_both_sides() {
        let mut board = Board::new("b", "board");
        let a = add(&mut board, "source");
        let b = add(&mut board, "sink");
        let out = pin_id(&a, "result");
        let input = pin_id(&b, "value");

        board
            .execute(GenericCommand::ConnectPins {
                from_node: a.id.clone(),
                from_pin: out.clone(),
                to_node: b.id.clone(),
                to_pin: input.clone(),
            })
            .unwrap();
        assert!(board.nodes[&a.id].pins[&out].connected_to.contains(&input));
        assert!(board.nodes[&b.id].pins[&input].depends_on.contains(&out));

        board
            .execute(GenericCommand::DisconnectPins {
                from_node: a.id.clone(),
                from_pin: out.clone(),
                to_node: b.id.clone(),
                to_pin: input.clone(),
            })
            .unwrap();
        assert!(board.nodes[&a.id].pins[&out].connected_to.is_empty());

        let again = board.execute(GenericCommand::DisconnectPins {
            from_node: a.id.clone(),
            from_pin: out,
            to_node: b.id.clone(),
            to_pin: input,
        });
        assert!(matches!(again, Err(GraphError::InvalidConnection(_))));
    }

    #[test]
    fn connect_rejects_input_to_input_and_mixed_kinds() {
        let mut board = Board::new("b", "board");
        let a = add(&mut board, "a");
        let b = add(&mut board, "b");

        let wrong_direction = board.execute(GenericCommand::ConnectPins {
            from_node: a.id.clone(),
            from_pin: pin_id(&a, "value"),
            to_node: b.id.clone(),
            to_pin: pin_id(&b, "value"),
        });
        assert!(matches!(wrong_direction, Err(GraphError::InvalidConnection(_))));

        let mixed = board.execute(GenericCommand::ConnectPins {
            from_node: a.id.clone(),
            from_pin: pin_id(&a, "exec_out"),
            to_node: b.id.clone(),
            to_pin: pin_id(&b, "value"),
        });
        assert!(matches!(mixed, Err(GraphError::InvalidConnection(_))));
        assert_eq!(board.version.2, 2);
    }

    #[test]
    fn update_node_detects_stale_snapshot() {
        let mut board = Board::new("b", "board");
        let a = add(&mut board, "a");
        let mut stale = a.clone();
        stale.friendly_name = "changed elsewhere".into();
        let mut updated = a.clone();
        updated.friendly_name = "Renamed".into();

        let result = board.execute(GenericCommand::UpdateNode {
            old_node: Some(stale),
            node: updated.clone(),
        });
        assert!(matches!(result, Err(GraphError::Stale(_))));

        board
            .execute(GenericCommand::UpdateNode {
                old_node: Some(a),
                node: updated,
            })
            .unwrap();
        let stored = board.nodes.values().next().unwrap();
        assert_eq!(stored.friendly_name, "Renamed");
    }

    #[test]
    fn layer_membership_round_trip() {
        let mut board = Board::new("b", "board");
        let a = add(&mut board, "a");
        let layer = match board
            .execute(GenericCommand::UpsertLayer {
                layer: Layer {
                    id: String::new(),
                    name: "Group".into(),
                    comment: None,
                    parent_id: None,
                    nodes: HashMap::new(),
                    pins: HashMap::new(),
                    coordinates: (0.0, 0.0, 0.0),
                    color: None,
                },
                node_ids: vec![a.id.clone()],
            })
            .unwrap()
        {
            Mutated::Layer(layer) => layer,
            other => panic!("unexpected {other:?}"),
        };
        assert!(layer.nodes.contains_key(&a.id));
        assert_eq!(board.nodes[&a.id].layer.as_deref(), Some(layer.id.as_str()));

        board
            .execute(GenericCommand::RemoveNodesFromLayer {
                layer_id: layer.id.clone(),
                node_ids: vec![a.id.clone()],
            })
            .unwrap();
        assert!(board.nodes[&a.id].layer.is_none());
        assert!(board.layers[&layer.id].nodes.is_empty());

        board
            .execute(GenericCommand::AddNodesToLayer {
                layer_id: layer.id.clone(),
                node_ids: vec![a.id.clone()],
            })
            .unwrap();
        board
            .execute(GenericCommand::RemoveLayer {
                layer_id: layer.id.clone(),
                preserve_nodes: true,
            })
            .unwrap();
        assert!(board.layers.is_empty());
        assert!(board.nodes[&a.id].layer.is_none());
    }

    #[test]
    fn remove_node_drops_dangling_connections() {
        let mut board = Board::new("b", "board");
        let a = add(&mut board, "a");
        let b = add(&mut board, "b");
        let out = pin_id(&a, "result");
        board
            .execute(GenericCommand::ConnectPins {
                from_node: a.id.clone(),
                from_pin: out.clone(),
                to_node: b.id.clone(),
                to_pin: pin_id(&b, "value"),
            })
            .unwrap();

        board
            .execute(GenericCommand::RemoveNode {
                node_id: b.id.clone(),
            })
            .unwrap();
        assert!(board.nodes[&a.id].pins[&out].connected_to.is_empty());
        assert!(matches!(
            board.execute(GenericCommand::RemoveNode { node_id: b.id }),
            Err(GraphError::NodeNotFound(_))
        ));
    }
}
