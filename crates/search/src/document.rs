use flowboard_graph::{decode_default_value, display_value, Board, LayerForest, Node, PinType};
use serde::Serialize;
use std::collections::HashMap;

const COMMENT_TITLE_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchResultType {
    Node,
    Layer,
    Pin,
    PinValue,
    Comment,
    Variable,
}

impl SearchResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Layer => "layer",
            Self::Pin => "pin",
            Self::PinValue => "pin-value",
            Self::Comment => "comment",
            Self::Variable => "variable",
        }
    }
}

/// One searchable entity of the board; also the ranked result type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SearchResultType,
    pub node_id: Option<String>,
    pub layer_id: Option<String>,
    /// Ancestor layer names, outermost first
    pub layer_path: Vec<String>,
    pub name: String,
    pub description: Option<String>,
    pub matched_field: Option<String>,
    pub matched_value: Option<String>,
    pub category: Option<String>,
    pub pin_name: Option<String>,
    pub pin_type: Option<PinType>,
    pub data_type: Option<String>,
    /// Node type name for node documents, owning node name for pin documents
    #[serde(skip)]
    pub node_name: Option<String>,
    pub search_text: String,
    pub score: f32,
}

impl SearchResult {
    fn new(id: impl Into<String>, kind: SearchResultType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            node_id: None,
            layer_id: None,
            layer_path: Vec::new(),
            name: name.into(),
            description: None,
            matched_field: None,
            matched_value: None,
            category: None,
            pin_name: None,
            pin_type: None,
            data_type: None,
            node_name: None,
            search_text: String::new(),
            score: 0.0,
        }
    }

    /// Identity used to collapse several hits on the same logical entity
    pub fn dedup_key(&self) -> (SearchResultType, Option<&str>, Option<&str>) {
        let node_or_id = self.node_id.as_deref().or(Some(self.id.as_str()));
        (self.kind, node_or_id, self.pin_name.as_deref())
    }
}

/// Build the full document corpus for a board snapshot
pub fn build_documents(board: &Board) -> Vec<SearchResult> {
    let forest = LayerForest::new(board);
    let mut paths: HashMap<String, Vec<String>> = HashMap::new();
    let mut path_of = |layer_id: Option<&str>| -> Vec<String> {
        let Some(layer_id) = layer_id else {
            return Vec::new();
        };
        paths
            .entry(layer_id.to_string())
            .or_insert_with(|| forest.path_lossy(layer_id))
            .clone()
    };

    let mut docs = Vec::new();

    let mut nodes: Vec<&Node> = board.nodes_iter().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    for node in nodes {
        let layer_path = path_of(node.layer.as_deref());
        node_documents(node, &layer_path, &mut docs);
    }

    let mut layers: Vec<_> = board.layers.values().collect();
    layers.sort_by(|a, b| a.id.cmp(&b.id));
    for layer in layers {
        let mut doc = SearchResult::new(&layer.id, SearchResultType::Layer, &layer.name);
        doc.layer_id = Some(layer.id.clone());
        doc.layer_path = path_of(layer.parent_id.as_deref());
        doc.description = non_empty(layer.comment.as_deref());
        doc.search_text = join([
            layer.name.as_str(),
            layer.comment.as_deref().unwrap_or_default(),
            layer
                .nodes
                .values()
                .map(|n| n.friendly_name.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .as_str(),
        ]);
        docs.push(doc);
    }

    let mut comments: Vec<_> = board.comments.values().collect();
    comments.sort_by(|a, b| a.id.cmp(&b.id));
    for comment in comments {
        let mut doc = SearchResult::new(
            &comment.id,
            SearchResultType::Comment,
            title(&comment.content),
        );
        doc.layer_id = comment.layer.clone();
        doc.layer_path = path_of(comment.layer.as_deref());
        doc.matched_value = Some(comment.content.clone());
        doc.search_text = join([
            comment.content.as_str(),
            comment.author.as_deref().unwrap_or_default(),
        ]);
        docs.push(doc);
    }

    let mut variables: Vec<_> = board.variables.values().collect();
    variables.sort_by(|a, b| a.id.cmp(&b.id));
    for variable in variables {
        let mut doc = SearchResult::new(&variable.id, SearchResultType::Variable, &variable.name);
        doc.description = non_empty(variable.description.as_deref());
        doc.data_type = Some(variable.data_type.as_str().to_string());
        if !variable.secret {
            doc.matched_value = variable
                .default_value
                .as_deref()
                .and_then(decode_default_value)
                .map(|value| display_value(&value))
                .filter(|value| !value.is_empty());
        }
        doc.search_text = join([
            variable.name.as_str(),
            variable.description.as_deref().unwrap_or_default(),
            variable.data_type.as_str(),
        ]);
        docs.push(doc);
    }

    log::debug!("Built {} search documents for board {}", docs.len(), board.id);
    docs
}

fn node_documents(node: &Node, layer_path: &[String], docs: &mut Vec<SearchResult>) {
    let mut pins: Vec<_> = node.pins.values().collect();
    pins.sort_by(|a, b| a.id.cmp(&b.id));

    let pin_names: Vec<&str> = pins
        .iter()
        .flat_map(|pin| [pin.name.as_str(), pin.friendly_name.as_str()])
        .collect();

    let mut doc = SearchResult::new(&node.id, SearchResultType::Node, &node.friendly_name);
    doc.node_id = Some(node.id.clone());
    doc.layer_id = node.layer.clone();
    doc.layer_path = layer_path.to_vec();
    doc.description = non_empty(Some(node.description.as_str()));
    doc.category = non_empty(Some(node.category.as_str()));
    doc.node_name = Some(node.name.clone());
    doc.search_text = join([
        node.friendly_name.as_str(),
        node.name.as_str(),
        node.category.as_str(),
        pin_names.join(" ").as_str(),
    ]);
    docs.push(doc);

    if let Some(comment) = node.comment.as_deref().filter(|c| !c.trim().is_empty()) {
        let mut doc = SearchResult::new(
            format!("{}:comment", node.id),
            SearchResultType::Comment,
            title(comment),
        );
        doc.node_id = Some(node.id.clone());
        doc.layer_id = node.layer.clone();
        doc.layer_path = layer_path.to_vec();
        doc.matched_value = Some(comment.to_string());
        doc.node_name = Some(node.friendly_name.clone());
        doc.search_text = join([comment, node.friendly_name.as_str()]);
        docs.push(doc);
    }

    for pin in pins.into_iter().filter(|pin| !pin.is_execution()) {
        let mut doc = SearchResult::new(
            format!("{}:{}", node.id, pin.id),
            SearchResultType::Pin,
            &pin.friendly_name,
        );
        doc.node_id = Some(node.id.clone());
        doc.layer_id = node.layer.clone();
        doc.layer_path = layer_path.to_vec();
        doc.description = non_empty(Some(pin.description.as_str()));
        doc.pin_name = Some(pin.name.clone());
        doc.pin_type = Some(pin.pin_type);
        doc.data_type = Some(pin.data_type.as_str().to_string());
        doc.node_name = Some(node.friendly_name.clone());
        doc.search_text = join([
            pin.friendly_name.as_str(),
            pin.name.as_str(),
            node.friendly_name.as_str(),
        ]);

        let value = pin
            .default_value
            .as_deref()
            .and_then(decode_default_value)
            .map(|value| display_value(&value))
            .filter(|value| !value.trim().is_empty());

        if let Some(value) = value {
            let mut value_doc = doc.clone();
            value_doc.id = format!("{}:value", doc.id);
            value_doc.kind = SearchResultType::PinValue;
            value_doc.search_text = join([value.as_str(), pin.friendly_name.as_str()]);
            value_doc.matched_value = Some(value);
            docs.push(doc);
            docs.push(value_doc);
        } else {
            docs.push(doc);
        }
    }
}

fn title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() <= COMMENT_TITLE_CHARS {
        return first_line.to_string();
    }
    let mut title: String = first_line.chars().take(COMMENT_TITLE_CHARS).collect();
    title.push('…');
    title
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
