use crate::error::{GraphError, Result};
use crate::types::Board;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Hard cap on parent-pointer walks, even for acyclic chains
pub const MAX_LAYER_DEPTH: usize = 40;

/// A set of layers whose parent pointers form a loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerCycle {
    /// Layer ids in the cycle, sorted
    pub layers: Vec<String>,
}

/// Parent/child structure of the board's layers.
///
/// Edges point from parent to child. Parent ids that name a missing layer are
/// treated as roots.
pub struct LayerForest<'a> {
    board: &'a Board,
    graph: DiGraph<&'a str, ()>,
    index: HashMap<&'a str, NodeIndex>,
}

impl<'a> LayerForest<'a> {
    pub fn new(board: &'a Board) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        let mut ids: Vec<&str> = board.layers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        for id in ids {
            index.insert(id, graph.add_node(id));
        }

        for layer in board.layers.values() {
            let Some(parent_id) = layer.parent_id.as_deref() else {
                continue;
            };
            match (index.get(parent_id), index.get(layer.id.as_str())) {
                (Some(&parent), Some(&child)) => {
                    graph.add_edge(parent, child, ());
                }
                _ => log::debug!(
                    "Layer {} references missing parent {}",
                    layer.id,
                    parent_id
                ),
            }
        }

        Self {
            board,
            graph,
            index,
        }
    }

    /// Report every parent-pointer cycle instead of silently tolerating it
    pub fn validate(&self) -> Vec<LayerCycle> {
        let mut cycles: Vec<LayerCycle> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|component| {
                let mut layers: Vec<String> = component
                    .into_iter()
                    .map(|idx| self.graph[idx].to_string())
                    .collect();
                layers.sort();
                LayerCycle { layers }
            })
            .collect();
        cycles.sort_by(|a, b| a.layers.cmp(&b.layers));
        cycles
    }

    /// Direct child layers of `layer_id`
    pub fn children(&self, layer_id: &str) -> Vec<&'a str> {
        let Some(&idx) = self.index.get(layer_id) else {
            return Vec::new();
        };
        let mut children: Vec<&str> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|child| self.graph[child])
            .collect();
        children.sort_unstable();
        children
    }

    /// Breadcrumb of layer names from the outermost ancestor down to `layer_id`
    pub fn path(&self, layer_id: &str) -> Result<Vec<String>> {
        let (names, error) = self.walk(layer_id);
        match error {
            Some(err) => Err(err),
            None => Ok(names),
        }
    }

    /// Like [`LayerForest::path`] but always returns, keeping whatever was collected
    /// before a cycle or the depth cap stopped the walk
    pub fn path_lossy(&self, layer_id: &str) -> Vec<String> {
        let (names, error) = self.walk(layer_id);
        if let Some(err) = error {
            log::warn!("Truncated layer path for {}: {}", layer_id, err);
        }
        names
    }

    fn walk(&self, layer_id: &str) -> (Vec<String>, Option<GraphError>) {
        let mut names = Vec::new();
        let mut order: Vec<&str> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = Some(layer_id);
        let mut error = None;

        while let Some(id) = current {
            if !visited.insert(id) {
                let start = order.iter().position(|seen| *seen == id).unwrap_or(0);
                error = Some(GraphError::LayerCycle {
                    layer_id: layer_id.to_string(),
                    cycle: order[start..].iter().map(|s| s.to_string()).collect(),
                });
                break;
            }
            if order.len() >= MAX_LAYER_DEPTH {
                error = Some(GraphError::LayerDepthExceeded {
                    layer_id: layer_id.to_string(),
                    max_depth: MAX_LAYER_DEPTH,
                });
                break;
            }
            let Some(layer) = self.board.layers.get(id) else {
                break;
            };
            order.push(id);
            names.push(layer.name.clone());
            current = layer.parent_id.as_deref();
        }

        names.reverse();
        (names, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Layer;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn layer(id: &str, parent: Option<&str>) -> Layer {
        Layer {
            id: id.to_string(),
            name: id.to_uppercase(),
            comment: None,
            parent_id: parent.map(str::to_string),
            nodes: HashMap::new(),
            pins: HashMap::new(),
            coordinates: (0.0, 0.0, 0.0),
            color: None,
        }
    }

    fn board(layers: Vec<Layer>) -> Board {
        let mut board = Board::new("b", "board");
        for layer in layers {
            board.layers.insert(layer.id.clone(), layer);
        }
        board
    }

    #[test]
    fn path_lists_ancestors_outermost_first() {
        let board = board(vec![
            layer("root", None),
            layer("mid", Some("root")),
            layer("leaf", Some("mid")),
        ]);
        let forest = LayerForest::new(&board);

        assert_eq!(forest.path("leaf").unwrap(), vec!["ROOT", "MID", "LEAF"]);
        assert_eq!(forest.children("root"), vec!["mid"]);
        assert!(forest.validate().is_empty());
    }

    #[test]
    fn dangling_parent_is_treated_as_root() {
        let board = board(vec![layer("orphan", Some("gone"))]);
        let forest = LayerForest::new(&board);
        assert_eq!(forest.path("orphan").unwrap(), vec!["ORPHAN"]);
    }

    #[test]
    fn three_cycle_is_reported_and_walk_terminates() {
        let board = board(vec![
            layer("a", Some("c")),
            layer("b", Some("a")),
            layer("c", Some("b")),
            layer("entry", Some("a")),
        ]);
        let forest = LayerForest::new(&board);

        let cycles = forest.validate();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].layers, vec!["a", "b", "c"]);

        match forest.path("entry") {
            Err(GraphError::LayerCycle { cycle, .. }) => assert_eq!(cycle.len(), 3),
            other => panic!("expected cycle error, got {other:?}"),
        }

        let lossy = forest.path_lossy("entry");
        assert_eq!(lossy.len(), 4);
        assert_eq!(lossy.last().map(String::as_str), Some("ENTRY"));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let board = board(vec![layer("self", Some("self"))]);
        let forest = LayerForest::new(&board);
        assert_eq!(forest.validate().len(), 1);
        assert!(forest.path("self").is_err());
    }

    #[test]
    fn deep_chain_hits_depth_cap() {
        let mut layers = vec![layer("l0", None)];
        for i in 1..=MAX_LAYER_DEPTH + 5 {
            let parent = format!("l{}", i - 1);
            layers.push(layer(&format!("l{i}"), Some(parent.as_str())));
        }
        let board = board(layers);
        let forest = LayerForest::new(&board);

        let leaf = format!("l{}", MAX_LAYER_DEPTH + 5);
        assert!(matches!(
            forest.path(&leaf),
            Err(GraphError::LayerDepthExceeded { .. })
        ));
        assert_eq!(forest.path_lossy(&leaf).len(), MAX_LAYER_DEPTH);
    }
}
