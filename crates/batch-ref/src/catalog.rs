use flowboard_graph::Node;

/// Prototype nodes that `AddNode` may instantiate
pub trait NodeCatalog: Send + Sync {
    fn find(&self, node_type: &str) -> Option<&Node>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeCatalog for Vec<Node> {
    /// Exact type name first, then a case-insensitive match
    fn find(&self, node_type: &str) -> Option<&Node> {
        let node_type = node_type.trim();
        self.iter()
            .find(|node| node.name == node_type)
            .or_else(|| {
                self.iter()
                    .find(|node| node.name.eq_ignore_ascii_case(node_type))
            })
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prototype(name: &str) -> Node {
        Node {
            id: format!("proto-{name}"),
            name: name.to_string(),
            friendly_name: name.to_string(),
            category: String::new(),
            description: String::new(),
            comment: None,
            pins: Default::default(),
            coordinates: (0.0, 0.0, 0.0),
            layer: None,
        }
    }

    #[test]
    fn exact_match_wins_over_case_insensitive() {
        let catalog = vec![prototype("Log"), prototype("log")];
        assert_eq!(catalog.find("log").unwrap().id, "proto-log");
        assert_eq!(catalog.find("LOG").unwrap().id, "proto-Log");
        assert!(catalog.find("missing").is_none());
        assert!(!NodeCatalog::is_empty(&catalog));
    }
}
