use async_trait::async_trait;
use flowboard_batch::{
    ApplierConfig, BatchApplier, CommandStatus, InMemoryFacility, MutationError,
    MutationErrorKind, MutationFacility, RecordingNotifier, SettlePoint,
};
use flowboard_graph::{
    decode_default_value, Board, GenericCommand, Mutated, Node, Pin, PinType, ValueType,
    VariableType,
};
use flowboard_protocol::{parse_command_batch, BoardCommand};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Mutex;

fn pin(id: &str, name: &str, friendly: &str, pin_type: PinType, data_type: VariableType) -> Pin {
    Pin {
        id: id.to_string(),
        name: name.to_string(),
        friendly_name: friendly.to_string(),
        description: String::new(),
        pin_type,
        data_type,
        value_type: ValueType::Normal,
        default_value: None,
        connected_to: Default::default(),
        depends_on: Default::default(),
    }
}

fn prototype(name: &str, friendly: &str, data_pins: Vec<Pin>) -> Node {
    let mut pins = vec![
        pin("exec_in", "exec_in", "Input", PinType::Input, VariableType::Execution),
        pin("exec_out", "exec_out", "Output", PinType::Output, VariableType::Execution),
    ];
    pins.extend(data_pins);
    Node {
        id: name.to_string(),
        name: name.to_string(),
        friendly_name: friendly.to_string(),
        category: "Test".to_string(),
        description: String::new(),
        comment: None,
        pins: pins.into_iter().map(|p| (p.id.clone(), p)).collect(),
        coordinates: (0.0, 0.0, 0.0),
        layer: None,
    }
}

fn catalog() -> Vec<Node> {
    vec![
        prototype(
            "log",
            "Log",
            vec![pin("message", "message", "Message", PinType::Input, VariableType::String)],
        ),
        prototype(
            "http_request",
            "HTTP Request",
            vec![
                pin("url", "url", "URL", PinType::Input, VariableType::String),
                pin("body", "response_body", "Body", PinType::Output, VariableType::String),
            ],
        ),
    ]
}

fn commands(raw: serde_json::Value) -> Vec<BoardCommand> {
    parse_command_batch(&raw.to_string()).unwrap()
}

fn pin_value(node: &Node, name: &str) -> Option<serde_json::Value> {
    node.pins
        .values()
        .find(|pin| pin.name == name)
        .and_then(|pin| pin.default_value.as_deref())
        .and_then(decode_default_value)
}

/// In-memory board that records fences and can refuse node replacements
struct ScriptedFacility {
    inner: InMemoryFacility,
    stale_updates: bool,
    fences: Mutex<Vec<SettlePoint>>,
}

impl ScriptedFacility {
    fn new(board: Board) -> Self {
        Self {
            inner: InMemoryFacility::new(board),
            stale_updates: false,
            fences: Mutex::new(Vec::new()),
        }
    }

    fn fences(&self) -> Vec<SettlePoint> {
        self.fences.lock().unwrap().clone()
    }
}

#[async_trait]
impl MutationFacility for ScriptedFacility {
    async fn execute(&self, command: GenericCommand) -> Result<Mutated, MutationError> {
        if self.stale_updates && matches!(command, GenericCommand::UpdateNode { .. }) {
            return Err(MutationError::new(
                MutationErrorKind::StaleVersion,
                "board version moved on",
            ));
        }
        self.inner.execute(command).await
    }

    async fn snapshot(&self) -> Result<Board, MutationError> {
        self.inner.snapshot().await
    }

    async fn fence(&self, point: SettlePoint) -> bool {
        self.fences.lock().unwrap().push(point);
        true
    }
}

#[tokio::test]
async fn node_creation_runs_before_everything_else() {
    let board = Board::new("b", "board");
    let facility = InMemoryFacility::new(board.clone());
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "ConnectPins", "from_node": "H", "from_pin": "exec_out",
         "to_node": "A", "to_pin": "exec_in"},
        {"command_type": "AddNode", "node_type": "log", "ref_id": "A"},
        {"command_type": "UpdateNodePin", "node_id": "A", "pin_id": "Message", "value": "hi"},
        {"command_type": "AddNode", "node_type": "http_request", "ref_id": "H"}
    ]));

    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(ApplierConfig::immediate())
        .apply(&board, batch)
        .await;

    assert_eq!(report.failed(), 0, "{:?}", notifier.notices());
    assert!(report.refetch_required);
    let order: Vec<usize> = report.outcomes.iter().map(|o| o.index).collect();
    assert_eq!(order, vec![1, 3, 0, 2]);

    let kinds: Vec<&str> = facility
        .journal()
        .await
        .iter()
        .map(GenericCommand::kind)
        .collect();
    assert_eq!(kinds, vec!["AddNode", "AddNode", "ConnectPins", "UpdateNode"]);
}

#[tokio::test]
async fn created_node_is_reachable_through_every_alias() {
    let board = Board::new("b", "board");
    let facility = InMemoryFacility::new(board.clone());
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "UpdateNodePin", "node_id": "A", "pin_id": "url", "value": "one"},
        {"command_type": "UpdateNodePin", "node_id": "$2", "pin_id": "URL", "value": "two"},
        {"command_type": "AddNode", "node_type": "http_request", "ref_id": "A"},
        {"command_type": "UpdateNodePin", "node_id": "http_request", "pin_id": "URL",
         "value": "three"},
        {"command_type": "UpdateNodePin", "node_id": "node-1", "pin_id": "url",
         "value": "\"https://example.com\""}
    ]));

    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(ApplierConfig::immediate())
        .apply(&board, batch)
        .await;

    assert_eq!(report.failed(), 0, "{:?}", notifier.notices());
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].node_id, "node-1");
    assert_eq!(
        report.created[0].aliases,
        vec!["A", "$2", "node-1", "http_request"]
    );

    let board = facility.into_board();
    assert_eq!(board.node_count(), 1);
    let node = board.node("node-1").unwrap();
    assert_eq!(pin_value(node, "url"), Some(json!("https://example.com")));
}

#[tokio::test]
async fn refs_numbered_from_one_keep_their_nodes() {
    let board = Board::new("b", "board");
    let facility = InMemoryFacility::new(board.clone());
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "AddNode", "node_type": "log", "ref_id": "$1"},
        {"command_type": "AddNode", "node_type": "http_request", "ref_id": "$2"},
        {"command_type": "UpdateNodePin", "node_id": "$1", "pin_id": "message", "value": "hi"},
        {"command_type": "UpdateNodePin", "node_id": "$2", "pin_id": "url", "value": "u"},
        {"command_type": "ConnectPins", "from_node": "$2", "from_pin": "exec_out",
         "to_node": "$1", "to_pin": "exec_in"}
    ]));

    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(ApplierConfig::immediate())
        .apply(&board, batch)
        .await;

    assert_eq!(report.failed(), 0, "{:?}", notifier.notices());
    let log_id = report.created[0].node_id.clone();
    let http_id = report.created[1].node_id.clone();
    assert!(report.created[0].aliases.contains(&"$1".to_string()));
    assert!(!report.created[1].aliases.contains(&"$1".to_string()));

    let board = facility.into_board();
    let log = board.node(&log_id).unwrap();
    assert_eq!(log.name, "log");
    assert_eq!(pin_value(log, "message"), Some(json!("hi")));
    let http = board.node(&http_id).unwrap();
    assert_eq!(pin_value(http, "url"), Some(json!("u")));
    let exec_in = log.pins.values().find(|p| p.name == "exec_in").unwrap();
    assert_eq!(exec_in.depends_on.len(), 1);
}

#[tokio::test]
async fn placeholder_steps_connect_through_their_ref() {
    let board = Board::new("b", "board");
    let facility = InMemoryFacility::new(board.clone());
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "ConnectPins", "from_node": "step", "from_pin": "exec_out",
         "to_node": "printer", "to_pin": "exec_in"},
        {"command_type": "ConnectPins", "from_node": "step", "from_pin": "Summary",
         "to_node": "printer", "to_pin": "message"},
        {"command_type": "AddPlaceholder", "name": "Summarize feed", "ref_id": "step",
         "pins": [{"name": "summary", "friendly_name": "Summary", "pin_type": "Output",
                   "data_type": "String"}]},
        {"command_type": "AddNode", "node_type": "log", "ref_id": "printer"}
    ]));

    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(ApplierConfig::immediate())
        .apply(&board, batch)
        .await;

    assert_eq!(report.failed(), 0, "{:?}", notifier.notices());
    assert_eq!(report.created.len(), 2);
    let creation_kinds: Vec<&str> = report.outcomes[..2].iter().map(|o| o.kind).collect();
    assert_eq!(creation_kinds, vec!["AddPlaceholder", "AddNode"]);
    assert!(report.created[0].aliases.contains(&"step".to_string()));

    let board = facility.into_board();
    let step = board.node(&report.created[0].node_id).unwrap();
    assert_eq!(step.name, "placeholder");
    assert_eq!(step.friendly_name, "Summarize feed");
    let summary = step.pins.values().find(|p| p.name == "summary").unwrap();
    assert_eq!(summary.connected_to.len(), 1);
    let exec_out = step.pins.values().find(|p| p.name == "exec_out").unwrap();
    assert_eq!(exec_out.connected_to.len(), 1);

    let printer = board.node(&report.created[1].node_id).unwrap();
    let message = printer.pins.values().find(|p| p.name == "message").unwrap();
    assert!(message.depends_on.contains(summary.id.as_str()));
}

#[tokio::test]
async fn one_bad_command_does_not_stop_the_batch() {
    let board = Board::new("b", "board");
    let facility = InMemoryFacility::new(board.clone());
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "AddNode", "node_type": "log", "ref_id": "A"},
        {"command_type": "AddNode", "node_type": "log", "ref_id": "B"},
        {"command_type": "ConnectPins", "from_node": "ghost", "from_pin": "exec_out",
         "to_node": "B", "to_pin": "exec_in"},
        {"command_type": "ConnectPins", "from_node": "A", "from_pin": "exec_out",
         "to_node": "B", "to_pin": "exec_in"},
        {"command_type": "UpdateNodePin", "node_id": "B", "pin_id": "message", "value": "hi"}
    ]));

    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(ApplierConfig::immediate())
        .apply(&board, batch)
        .await;

    assert_eq!(report.applied(), 4);
    assert_eq!(report.failed(), 1);
    match &report.outcome(2).unwrap().status {
        CommandStatus::Failed { reason } => {
            assert!(reason.contains("ghost"), "{reason}");
            assert!(reason.contains("Known references"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("command 2"));

    let board = facility.into_board();
    let b = report.created[1].node_id.as_str();
    let exec_in = board.node(b).unwrap().pins.values().find(|p| p.name == "exec_in").unwrap();
    assert_eq!(exec_in.depends_on.len(), 1);
}

#[tokio::test]
async fn unknown_pin_and_node_type_are_reported_once_each() {
    let board = Board::new("b", "board");
    let facility = InMemoryFacility::new(board.clone());
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "AddNode", "node_type": "teleporter"},
        {"command_type": "AddNode", "node_type": "log", "ref_id": "A"},
        {"command_type": "UpdateNodePin", "node_id": "A", "pin_id": "nonexistent", "value": 1}
    ]));

    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(ApplierConfig::immediate())
        .apply(&board, batch)
        .await;

    assert_eq!(report.failed(), 2);
    let notices = notifier.notices();
    assert_eq!(notices.len(), 2);
    assert!(notices[0].message.contains("teleporter"));
    assert!(notices[1].message.contains("nonexistent"));
    assert!(notices[1].message.contains("Available pins"));
}

#[tokio::test]
async fn stale_version_is_reported_with_its_kind() {
    let board = Board::new("b", "board");
    let mut facility = ScriptedFacility::new(board.clone());
    facility.stale_updates = true;
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "AddNode", "node_type": "log", "ref_id": "A"},
        {"command_type": "UpdateNodePin", "node_id": "A", "pin_id": "message", "value": "x"}
    ]));

    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(ApplierConfig::immediate())
        .apply(&board, batch)
        .await;

    assert_eq!(report.failed(), 1);
    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("stale version"), "{}", notices[0].message);
}

#[tokio::test]
async fn fences_replace_fixed_delays() {
    let board = Board::new("b", "board");
    let facility = ScriptedFacility::new(board.clone());
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "AddNode", "node_type": "log", "ref_id": "A"},
        {"command_type": "AddNode", "node_type": "log", "ref_id": "B"},
        {"command_type": "ConnectPins", "from_node": "A", "from_pin": "exec_out",
         "to_node": "B", "to_pin": "exec_in"},
        {"command_type": "UpdateNodePin", "node_id": "B", "pin_id": "message", "value": "x"}
    ]));

    // Default config: the fence must short-circuit the real delays.
    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .apply(&board, batch)
        .await;

    assert_eq!(report.failed(), 0, "{:?}", notifier.notices());
    assert_eq!(
        facility.fences(),
        vec![
            SettlePoint::BetweenCommands,
            SettlePoint::AfterConnect,
            SettlePoint::BetweenCommands
        ]
    );
}

#[tokio::test]
async fn entity_commands_target_existing_ids() {
    let board = Board::new("b", "board");
    let facility = InMemoryFacility::new(board.clone());
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "AddNode", "node_type": "log", "ref_id": "A", "position": {"x": 0, "y": 0}},
        {"command_type": "AddNode", "node_type": "log", "ref_id": "B", "position": {"x": 100, "y": 40}},
        {"command_type": "CreateLayer", "name": "Logging", "node_ids": ["A", "B"]},
        {"command_type": "CreateVariable", "name": "token", "data_type": "string",
         "default_value": "secret", "secret": true},
        {"command_type": "CreateComment", "content": "note", "position": {"x": 5, "y": 5}},
        {"command_type": "DeleteComment", "comment_id": "missing"},
        {"command_type": "MoveNode", "node_id": "A", "position": {"x": 300, "y": 10}}
    ]));

    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(ApplierConfig::immediate())
        .apply(&board, batch)
        .await;

    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcome(5).unwrap().status,
        CommandStatus::Failed { .. }
    ));

    let board = facility.into_board();
    let layer = board.layers.values().next().unwrap();
    assert_eq!(layer.name, "Logging");
    assert_eq!(layer.nodes.len(), 2);
    assert_eq!(layer.coordinates, (50.0, 20.0, 0.0));

    let variable = board.variables.values().next().unwrap();
    assert!(variable.secret);
    assert_eq!(
        variable.default_value.as_deref().and_then(decode_default_value),
        Some(json!("secret"))
    );
    assert_eq!(board.comments.len(), 1);

    let a = report.created[0].node_id.as_str();
    assert_eq!(board.node(a).unwrap().coordinates, (300.0, 10.0, 0.0));
    assert_eq!(board.node(a).unwrap().layer.as_deref(), Some(layer.id.as_str()));
}

#[tokio::test]
async fn default_positions_follow_the_grid() {
    let board = Board::new("b", "board");
    let facility = InMemoryFacility::new(board.clone());
    let catalog = catalog();
    let notifier = RecordingNotifier::new();

    let batch = commands(json!([
        {"command_type": "AddNode", "node_type": "log", "ref_id": "a"},
        {"command_type": "AddNode", "node_type": "log", "ref_id": "b"},
        {"command_type": "AddNode", "node_type": "log", "ref_id": "c"},
        {"command_type": "AddNode", "node_type": "log", "ref_id": "d"}
    ]));

    let report = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(ApplierConfig::immediate())
        .apply(&board, batch)
        .await;

    let board = facility.into_board();
    let coords: Vec<_> = report
        .created
        .iter()
        .map(|c| board.node(&c.node_id).unwrap().coordinates)
        .collect();
    assert_eq!(
        coords,
        vec![
            (0.0, 0.0, 0.0),
            (300.0, 0.0, 0.0),
            (600.0, 0.0, 0.0),
            (0.0, 200.0, 0.0)
        ]
    );
}
