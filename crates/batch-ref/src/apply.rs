use crate::catalog::NodeCatalog;
use crate::config::ApplierConfig;
use crate::context::ResolutionContext;
use crate::error::{ApplyError, Result};
use crate::facility::{MutationFacility, SettlePoint};
use crate::notify::{Notice, Notifier};
use crate::report::{BatchReport, CommandOutcome, CommandStatus, CreatedNode};
use flowboard_graph::{
    encode_default_value, normalize_literal, Board, Comment, GenericCommand, Layer, Node, Pin,
    PinType, ValueType, Variable, VariableType,
};
use flowboard_protocol::{BoardCommand, NodePosition, PlaceholderPinDef};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Node type name given to `AddPlaceholder` steps
pub const PLACEHOLDER_NODE_TYPE: &str = "placeholder";

/// Applies a copilot command batch through a [`MutationFacility`].
///
/// Node creation runs first so later commands can address new nodes by any of
/// their aliases; everything else follows in input order. A failing command is
/// reported once and skipped, the batch always runs to completion.
pub struct BatchApplier<'a> {
    facility: &'a dyn MutationFacility,
    catalog: &'a dyn NodeCatalog,
    notifier: &'a dyn Notifier,
    config: ApplierConfig,
}

impl<'a> BatchApplier<'a> {
    pub fn new(
        facility: &'a dyn MutationFacility,
        catalog: &'a dyn NodeCatalog,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            facility,
            catalog,
            notifier,
            config: ApplierConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ApplierConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn apply(&self, board: &Board, commands: Vec<BoardCommand>) -> BatchReport {
        let mut ctx = ResolutionContext::seed(board);
        let mut view = board.clone();
        let mut report = BatchReport {
            refetch_required: true,
            ..BatchReport::default()
        };

        log::info!(
            "Applying {} commands to board {} ({} nodes)",
            commands.len(),
            board.id,
            board.node_count()
        );

        let (creations, rest): (Vec<_>, Vec<_>) = commands
            .into_iter()
            .enumerate()
            .partition(|(_, command)| command.is_node_creation());

        let origin = self.config.layout.origin(board);
        for (ordinal, (index, command)) in creations.into_iter().enumerate() {
            let kind = command.kind();
            let default_position = self.config.layout.position(origin, ordinal);
            match self
                .create_node(&mut ctx, &mut view, index, command, default_position)
                .await
            {
                Ok(created) => {
                    report.outcomes.push(CommandOutcome {
                        index,
                        kind,
                        status: CommandStatus::Applied,
                        entity_id: Some(created.node_id.clone()),
                    });
                    report.created.push(created);
                }
                Err(err) => report.outcomes.push(self.fail(index, kind, &err)),
            }
        }

        let mut stale = false;
        let mut first = report.outcomes.is_empty();
        for (index, command) in rest {
            if !first {
                self.settle(SettlePoint::BetweenCommands).await;
            }
            first = false;

            let kind = command.kind();
            let is_connect = matches!(command, BoardCommand::ConnectPins { .. });
            let needs_fresh = stale || matches!(command, BoardCommand::UpdateNodePin { .. });

            match self.run(&ctx, &mut view, needs_fresh, command).await {
                Ok(entity_id) => {
                    stale = true;
                    report.outcomes.push(CommandOutcome {
                        index,
                        kind,
                        status: CommandStatus::Applied,
                        entity_id: Some(entity_id),
                    });
                    if is_connect {
                        self.settle(SettlePoint::AfterConnect).await;
                    }
                }
                Err(err) => report.outcomes.push(self.fail(index, kind, &err)),
            }
        }

        log::info!(
            "Batch on board {} finished: {} applied, {} failed, {} nodes created",
            board.id,
            report.applied(),
            report.failed(),
            ctx.created_count()
        );
        report
    }

    async fn create_node(
        &self,
        ctx: &mut ResolutionContext,
        view: &mut Board,
        index: usize,
        command: BoardCommand,
        default_position: NodePosition,
    ) -> Result<CreatedNode> {
        let (mut node, label, ref_id, position, target_layer) = match command {
            BoardCommand::AddNode {
                node_type,
                ref_id,
                position,
                friendly_name,
                target_layer,
                ..
            } => {
                let mut node = self.catalog.find(&node_type).cloned().ok_or_else(|| {
                    ApplyError::UnknownNodeType {
                        node_type: node_type.clone(),
                        catalog_size: self.catalog.len(),
                    }
                })?;
                if let Some(friendly_name) = friendly_name.filter(|name| !name.trim().is_empty())
                {
                    node.friendly_name = friendly_name;
                }
                (node, node_type, ref_id, position, target_layer)
            }
            BoardCommand::AddPlaceholder {
                name,
                ref_id,
                position,
                pins,
                target_layer,
                ..
            } => {
                let node = placeholder_node(&name, pins.unwrap_or_default())?;
                (node, name, ref_id, position, target_layer)
            }
            other => return Err(ApplyError::UnexpectedResponse(other.kind().to_string())),
        };
        if let Some(layer_id) = &target_layer {
            require_layer(view, layer_id)?;
        }

        let position = position.unwrap_or(default_position);
        node.coordinates = (position.x as f32, position.y as f32, 0.0);

        let created = self
            .facility
            .execute(GenericCommand::AddNode {
                node,
                current_layer: target_layer,
            })
            .await?
            .into_node()
            .ok_or_else(|| ApplyError::UnexpectedResponse("AddNode".to_string()))?;

        let aliases = ctx.register_created(&created, ref_id.as_deref(), index);
        log::debug!(
            "Node creation #{} '{}' created {} at ({}, {})",
            index,
            label,
            created.id,
            position.x,
            position.y
        );
        let node_id = created.id.clone();
        view.nodes.insert(node_id.clone(), created);
        Ok(CreatedNode { node_id, aliases })
    }

    async fn run(
        &self,
        ctx: &ResolutionContext,
        view: &mut Board,
        needs_fresh: bool,
        command: BoardCommand,
    ) -> Result<String> {
        if needs_fresh {
            match self.facility.snapshot().await {
                Ok(board) => *view = board,
                // Only pin updates must see authoritative pin ids.
                Err(err) if matches!(command, BoardCommand::UpdateNodePin { .. }) => {
                    return Err(err.into())
                }
                Err(err) => log::warn!("Board refetch failed, using local view: {}", err),
            }
        }

        let generic = translate(ctx, view, command)?;
        let mutated = self.facility.execute(generic).await?;
        Ok(mutated.id().to_string())
    }

    async fn settle(&self, point: SettlePoint) {
        if self.facility.fence(point).await {
            return;
        }
        let delay = match point {
            SettlePoint::BetweenCommands => self.config.settle.inter_command,
            SettlePoint::AfterConnect => self.config.settle.post_connect,
        };
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
    }

    fn fail(&self, index: usize, kind: &'static str, err: &ApplyError) -> CommandOutcome {
        log::warn!("Skipping {} at position {}: {}", kind, index, err);
        self.notifier
            .notify(Notice::error(format!("{kind} (command {index}) failed: {err}")));
        CommandOutcome {
            index,
            kind,
            status: CommandStatus::Failed {
                reason: err.to_string(),
            },
            entity_id: None,
        }
    }
}

/// Turn a reference-based command into an id-addressed mutation against `view`
fn translate(
    ctx: &ResolutionContext,
    view: &Board,
    command: BoardCommand,
) -> Result<GenericCommand> {
    let generic = match command {
        BoardCommand::AddNode { .. } | BoardCommand::AddPlaceholder { .. } => {
            return Err(ApplyError::UnexpectedResponse(command.kind().to_string()))
        }
        BoardCommand::RemoveNode { node_id, .. } => GenericCommand::RemoveNode {
            node_id: ctx.resolve_node(&node_id, view)?.id,
        },
        BoardCommand::ConnectPins {
            from_node,
            from_pin,
            to_node,
            to_pin,
            ..
        } => {
            let (from_node, from_pin, to_node, to_pin) =
                resolve_endpoints(ctx, view, &from_node, &from_pin, &to_node, &to_pin)?;
            GenericCommand::ConnectPins {
                from_node,
                from_pin,
                to_node,
                to_pin,
            }
        }
        BoardCommand::DisconnectPins {
            from_node,
            from_pin,
            to_node,
            to_pin,
            ..
        } => {
            let (from_node, from_pin, to_node, to_pin) =
                resolve_endpoints(ctx, view, &from_node, &from_pin, &to_node, &to_pin)?;
            GenericCommand::DisconnectPins {
                from_node,
                from_pin,
                to_node,
                to_pin,
            }
        }
        BoardCommand::UpdateNodePin {
            node_id,
            pin_id,
            value,
            ..
        } => {
            let old_node = ctx.resolve_node(&node_id, view)?;
            let pin = ctx.resolve_pin(&node_id, &old_node, &pin_id)?;
            let bytes = encode_default_value(&normalize_literal(value)).map_err(|source| {
                ApplyError::Encoding {
                    target: format!("{}.{}", old_node.id, pin_id),
                    source,
                }
            })?;

            let mut node = old_node.clone();
            if let Some(target) = node.pins.get_mut(&pin.pin_id) {
                target.default_value = Some(bytes);
            }
            log::debug!(
                "UpdateNodePin '{}'.'{}' resolved to {}.{} ({:?})",
                node_id,
                pin_id,
                node.id,
                pin.pin_id,
                pin.via
            );
            GenericCommand::UpdateNode {
                old_node: Some(old_node),
                node,
            }
        }
        BoardCommand::MoveNode {
            node_id,
            position,
            target_layer,
            ..
        } => {
            let node = ctx.resolve_node(&node_id, view)?;
            if let Some(layer_id) = &target_layer {
                require_layer(view, layer_id)?;
            }
            GenericCommand::MoveNode {
                to_coordinates: (position.x as f32, position.y as f32, node.coordinates.2),
                from_coordinates: Some(node.coordinates),
                node_id: node.id,
                current_layer: target_layer,
            }
        }
        BoardCommand::CreateVariable {
            name,
            data_type,
            value_type,
            default_value,
            description,
            secret,
            ..
        } => {
            let data_type =
                VariableType::parse_loose(&data_type).ok_or_else(|| ApplyError::InvalidValue {
                    field: "data_type".to_string(),
                    reason: format!("unknown variable type '{data_type}'"),
                })?;
            let value_type = match value_type {
                Some(raw) => {
                    ValueType::parse_loose(&raw).ok_or_else(|| ApplyError::InvalidValue {
                        field: "value_type".to_string(),
                        reason: format!("unknown value type '{raw}'"),
                    })?
                }
                None => ValueType::Normal,
            };
            let default_value = default_value
                .map(|value| encode(&name, value))
                .transpose()?;
            GenericCommand::UpsertVariable {
                variable: Variable {
                    id: String::new(),
                    name,
                    data_type,
                    value_type,
                    description,
                    default_value,
                    secret,
                    exposed: false,
                    editable: true,
                },
                old_variable: None,
            }
        }
        BoardCommand::UpdateVariable {
            variable_id,
            name,
            default_value,
            description,
            ..
        } => {
            let old = view
                .variables
                .get(&variable_id)
                .cloned()
                .ok_or(ApplyError::VariableNotFound(variable_id))?;
            let mut variable = old.clone();
            if let Some(name) = name {
                variable.name = name;
            }
            if let Some(value) = default_value {
                variable.default_value = Some(encode(&variable.name, value)?);
            }
            if description.is_some() {
                variable.description = description;
            }
            GenericCommand::UpsertVariable {
                variable,
                old_variable: Some(old),
            }
        }
        BoardCommand::DeleteVariable { variable_id, .. } => {
            if !view.variables.contains_key(&variable_id) {
                return Err(ApplyError::VariableNotFound(variable_id));
            }
            GenericCommand::RemoveVariable { variable_id }
        }
        BoardCommand::CreateComment {
            content,
            position,
            width,
            height,
            color,
            target_layer,
            ..
        } => {
            if let Some(layer_id) = &target_layer {
                require_layer(view, layer_id)?;
            }
            GenericCommand::UpsertComment {
                comment: Comment {
                    id: String::new(),
                    content,
                    color,
                    coordinates: (position.x as f32, position.y as f32, 0.0),
                    width: width.map(|w| w as f32),
                    height: height.map(|h| h as f32),
                    z_index: None,
                    author: None,
                    timestamp: now_millis(),
                    layer: target_layer.clone(),
                },
                old_comment: None,
                current_layer: target_layer,
            }
        }
        BoardCommand::UpdateComment {
            comment_id,
            content,
            color,
            position,
            ..
        } => {
            let old = view
                .comments
                .get(&comment_id)
                .cloned()
                .ok_or(ApplyError::CommentNotFound(comment_id))?;
            let mut comment = old.clone();
            if let Some(content) = content {
                comment.content = content;
            }
            if color.is_some() {
                comment.color = color;
            }
            if let Some(position) = position {
                comment.coordinates = (position.x as f32, position.y as f32, old.coordinates.2);
            }
            comment.timestamp = now_millis();
            GenericCommand::UpsertComment {
                current_layer: comment.layer.clone(),
                comment,
                old_comment: Some(old),
            }
        }
        BoardCommand::DeleteComment { comment_id, .. } => {
            if !view.comments.contains_key(&comment_id) {
                return Err(ApplyError::CommentNotFound(comment_id));
            }
            GenericCommand::RemoveComment { comment_id }
        }
        BoardCommand::CreateLayer {
            name,
            node_ids,
            position,
            color,
            target_layer,
            ..
        } => {
            if let Some(layer_id) = &target_layer {
                require_layer(view, layer_id)?;
            }
            let node_ids = resolve_node_ids(ctx, view, &node_ids)?;
            let coordinates = position
                .map(|p| (p.x as f32, p.y as f32, 0.0))
                .unwrap_or_else(|| centroid(view, &node_ids));
            GenericCommand::UpsertLayer {
                layer: Layer {
                    id: String::new(),
                    name,
                    comment: None,
                    parent_id: target_layer,
                    nodes: Default::default(),
                    pins: Default::default(),
                    coordinates,
                    color,
                },
                node_ids,
            }
        }
        BoardCommand::AddNodesToLayer {
            layer_id, node_ids, ..
        } => {
            require_layer(view, &layer_id)?;
            GenericCommand::AddNodesToLayer {
                node_ids: resolve_node_ids(ctx, view, &node_ids)?,
                layer_id,
            }
        }
        BoardCommand::RemoveNodesFromLayer {
            layer_id, node_ids, ..
        } => {
            require_layer(view, &layer_id)?;
            GenericCommand::RemoveNodesFromLayer {
                node_ids: resolve_node_ids(ctx, view, &node_ids)?,
                layer_id,
            }
        }
        BoardCommand::RemoveLayer { layer_id, .. } => {
            require_layer(view, &layer_id)?;
            GenericCommand::RemoveLayer {
                layer_id,
                preserve_nodes: true,
            }
        }
    };
    Ok(generic)
}

fn resolve_endpoints(
    ctx: &ResolutionContext,
    view: &Board,
    from_node: &str,
    from_pin: &str,
    to_node: &str,
    to_pin: &str,
) -> Result<(String, String, String, String)> {
    let source = ctx.resolve_node(from_node, view)?;
    let target = ctx.resolve_node(to_node, view)?;
    let out_pin = ctx.resolve_pin(from_node, &source, from_pin)?;
    let in_pin = ctx.resolve_pin(to_node, &target, to_pin)?;

    log::debug!(
        "'{}'.'{}' -> '{}'.'{}' resolved to {}.{} ({:?}) -> {}.{} ({:?})",
        from_node,
        from_pin,
        to_node,
        to_pin,
        source.id,
        out_pin.pin_id,
        out_pin.via,
        target.id,
        in_pin.pin_id,
        in_pin.via
    );
    Ok((source.id, out_pin.pin_id, target.id, in_pin.pin_id))
}

fn resolve_node_ids(
    ctx: &ResolutionContext,
    view: &Board,
    references: &[String],
) -> Result<Vec<String>> {
    references
        .iter()
        .map(|reference| ctx.resolve_node(reference, view).map(|node| node.id))
        .collect()
}

/// Placeholder step node: execution pins plus the requested custom pins
fn placeholder_node(name: &str, pins: Vec<PlaceholderPinDef>) -> Result<Node> {
    let exec = |id: &str, friendly: &str, pin_type| Pin {
        id: id.to_string(),
        name: id.to_string(),
        friendly_name: friendly.to_string(),
        description: String::new(),
        pin_type,
        data_type: VariableType::Execution,
        value_type: ValueType::Normal,
        default_value: None,
        connected_to: Default::default(),
        depends_on: Default::default(),
    };

    let mut node = Node {
        id: String::new(),
        name: PLACEHOLDER_NODE_TYPE.to_string(),
        friendly_name: name.to_string(),
        category: "Placeholder".to_string(),
        description: String::new(),
        comment: None,
        pins: Default::default(),
        coordinates: (0.0, 0.0, 0.0),
        layer: None,
    };
    for pin in [
        exec("exec_in", "Input", PinType::Input),
        exec("exec_out", "Output", PinType::Output),
    ] {
        node.pins.insert(pin.id.clone(), pin);
    }

    for def in pins {
        let invalid = |field: &str, reason: String| ApplyError::InvalidValue {
            field: format!("pins.{}.{field}", def.name),
            reason,
        };
        if def.name.trim().is_empty() {
            return Err(ApplyError::InvalidValue {
                field: "pins.name".to_string(),
                reason: "placeholder pin names must not be empty".to_string(),
            });
        }
        if node.pins.contains_key(&def.name) {
            return Err(invalid("name", "duplicate pin name".to_string()));
        }
        let pin_type = PinType::parse_loose(&def.pin_type)
            .ok_or_else(|| invalid("pin_type", format!("unknown pin type '{}'", def.pin_type)))?;
        let data_type = VariableType::parse_loose(&def.data_type)
            .ok_or_else(|| invalid("data_type", format!("unknown data type '{}'", def.data_type)))?;
        let value_type = match def.value_type.as_deref() {
            Some(raw) => ValueType::parse_loose(raw)
                .ok_or_else(|| invalid("value_type", format!("unknown value type '{raw}'")))?,
            None => ValueType::Normal,
        };
        node.pins.insert(
            def.name.clone(),
            Pin {
                id: def.name.clone(),
                name: def.name.clone(),
                friendly_name: def.friendly_name.clone(),
                description: def.description.clone().unwrap_or_default(),
                pin_type,
                data_type,
                value_type,
                default_value: None,
                connected_to: Default::default(),
                depends_on: Default::default(),
            },
        );
    }
    Ok(node)
}

fn require_layer<'b>(view: &'b Board, layer_id: &str) -> Result<&'b Layer> {
    view.layer(layer_id)
        .ok_or_else(|| ApplyError::LayerNotFound(layer_id.to_string()))
}

fn encode(target: &str, value: serde_json::Value) -> Result<Vec<u8>> {
    encode_default_value(&normalize_literal(value)).map_err(|source| ApplyError::Encoding {
        target: target.to_string(),
        source,
    })
}

fn centroid(view: &Board, node_ids: &[String]) -> flowboard_graph::Coordinates {
    let members: Vec<&Node> = node_ids.iter().filter_map(|id| view.node(id)).collect();
    if members.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let count = members.len() as f32;
    let (x, y) = members.iter().fold((0.0, 0.0), |(x, y), node| {
        (x + node.coordinates.0, y + node.coordinates.1)
    });
    (x / count, y / count, 0.0)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
