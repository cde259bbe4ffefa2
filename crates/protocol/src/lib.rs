use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod command;

pub use command::{BoardCommand, NodePosition, PlaceholderPinDef};

pub const COMMAND_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Copilot-style response wrapper carrying a command list
#[derive(Debug, Deserialize)]
struct CommandEnvelope {
    commands: Vec<BoardCommand>,
}

const OPEN_TAG: &str = "<commands>";
const CLOSE_TAG: &str = "</commands>";

/// Parse a command batch.
///
/// Accepts a bare JSON array, `{ "commands": [...] }`, or free text carrying one
/// or more `<commands>[...]</commands>` blocks. Repeated commands are dropped,
/// keeping the first (see [`commands_are_duplicate`]).
pub fn parse_command_batch(raw: &str) -> Result<Vec<BoardCommand>> {
    let blocks = tagged_blocks(raw);
    let mut parsed = Vec::new();
    if blocks.is_empty() {
        parsed.extend(parse_json_batch(raw)?);
    } else {
        for (i, block) in blocks.iter().enumerate() {
            let commands = parse_json_batch(block)
                .with_context(|| format!("in <commands> block {}", i + 1))?;
            parsed.extend(commands);
        }
    }

    let mut batch: Vec<BoardCommand> = Vec::with_capacity(parsed.len());
    for command in parsed {
        if batch
            .iter()
            .any(|existing| commands_are_duplicate(existing, &command))
        {
            log::debug!("Dropping duplicate {} command", command.kind());
            continue;
        }
        batch.push(command);
    }
    Ok(batch)
}

fn tagged_blocks(raw: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = raw;
    while let Some(start) = rest.find(OPEN_TAG) {
        let body = &rest[start + OPEN_TAG.len()..];
        let Some(end) = body.find(CLOSE_TAG) else {
            break;
        };
        blocks.push(&body[..end]);
        rest = &body[end + CLOSE_TAG.len()..];
    }
    blocks
}

fn parse_json_batch(raw: &str) -> Result<Vec<BoardCommand>> {
    let value: serde_json::Value =
        serde_json::from_str(raw.trim()).context("command batch is not valid JSON")?;

    if value.is_array() {
        return serde_json::from_value(value).context("invalid board command in batch");
    }
    if value.get("commands").is_some() {
        let envelope: CommandEnvelope =
            serde_json::from_value(value).context("invalid board command in batch")?;
        return Ok(envelope.commands);
    }
    anyhow::bail!("expected a JSON array of commands or an object with a `commands` field")
}

/// Whether `b` repeats `a`: same node type and ref for `AddNode`, same name or
/// ref for `AddPlaceholder`, same target for `RemoveNode`, same endpoints for
/// `ConnectPins`. Other commands never count as duplicates.
pub fn commands_are_duplicate(a: &BoardCommand, b: &BoardCommand) -> bool {
    use BoardCommand::*;

    match (a, b) {
        (
            AddNode {
                node_type: t1,
                ref_id: r1,
                ..
            },
            AddNode {
                node_type: t2,
                ref_id: r2,
                ..
            },
        ) => t1 == t2 && r1 == r2,
        (
            AddPlaceholder {
                name: n1,
                ref_id: r1,
                ..
            },
            AddPlaceholder {
                name: n2,
                ref_id: r2,
                ..
            },
        ) => n1 == n2 || r1 == r2,
        (RemoveNode { node_id: id1, .. }, RemoveNode { node_id: id2, .. }) => id1 == id2,
        (
            ConnectPins {
                from_node: f1,
                from_pin: fp1,
                to_node: t1,
                to_pin: tp1,
                ..
            },
            ConnectPins {
                from_node: f2,
                from_pin: fp2,
                to_node: t2,
                to_pin: tp2,
                ..
            },
        ) => f1 == f2 && fp1 == fp2 && t1 == t2 && tp1 == tp2,
        _ => false,
    }
}

/// JSON schema of a command batch, for prompting command generators
pub fn command_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(Vec<BoardCommand>);
    serde_json::to_value(&schema).unwrap_or(serde_json::Value::Null)
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
