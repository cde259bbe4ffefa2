use crate::error::{ApplyError, Result};
use flowboard_graph::{Board, Node};
use std::collections::{HashMap, HashSet};

/// How a pin reference was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMatchKind {
    Id,
    Name,
    NameCaseInsensitive,
    FriendlyName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinMatch {
    pub pin_id: String,
    pub via: PinMatchKind,
}

/// Pin lookup for one node: id → exact name → case-insensitive name → friendly name
#[derive(Debug, Clone, Default)]
pub struct PinTable {
    ids: HashSet<String>,
    by_name: HashMap<String, String>,
    by_lower_name: HashMap<String, String>,
    by_friendly: HashMap<String, String>,
    listing: Vec<String>,
}

impl PinTable {
    pub fn from_node(node: &Node) -> Self {
        let mut pins: Vec<_> = node.pins.values().collect();
        pins.sort_by(|a, b| a.id.cmp(&b.id));

        let mut table = Self::default();
        for pin in pins {
            table.ids.insert(pin.id.clone());
            table
                .by_name
                .entry(pin.name.clone())
                .or_insert_with(|| pin.id.clone());
            table
                .by_lower_name
                .entry(pin.name.to_lowercase())
                .or_insert_with(|| pin.id.clone());
            table
                .by_friendly
                .entry(pin.friendly_name.to_lowercase())
                .or_insert_with(|| pin.id.clone());
            table.listing.push(format!(
                "{} \"{}\" ({:?}, {})",
                pin.name,
                pin.friendly_name,
                pin.pin_type,
                pin.data_type.as_str()
            ));
        }
        table.listing.sort();
        table
    }

    pub fn resolve(&self, reference: &str) -> Option<PinMatch> {
        let reference = reference.trim();
        if self.ids.contains(reference) {
            return Some(PinMatch {
                pin_id: reference.to_string(),
                via: PinMatchKind::Id,
            });
        }
        if let Some(id) = self.by_name.get(reference) {
            return Some(PinMatch {
                pin_id: id.clone(),
                via: PinMatchKind::Name,
            });
        }
        let lowered = reference.to_lowercase();
        if let Some(id) = self.by_lower_name.get(&lowered) {
            return Some(PinMatch {
                pin_id: id.clone(),
                via: PinMatchKind::NameCaseInsensitive,
            });
        }
        self.by_friendly.get(&lowered).map(|id| PinMatch {
            pin_id: id.clone(),
            via: PinMatchKind::FriendlyName,
        })
    }

    /// Human-readable pin listing for error reports
    pub fn available(&self) -> Vec<String> {
        self.listing.clone()
    }

    fn contains_id(&self, pin_id: &str) -> bool {
        self.ids.contains(pin_id)
    }
}

/// Strength of a batch alias; a weaker alias never displaces a stronger one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum AliasRank {
    TypeName,
    Positional,
    Explicit,
}

/// Per-batch reference state.
///
/// Maps every alias of a node created in this batch (explicit ref id, `$N`,
/// node type name, real id) to the created node, and keeps a [`PinTable`]
/// per reference. Lives exactly as long as one batch application.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    nodes: HashMap<String, Node>,
    pins: HashMap<String, PinTable>,
    ranks: HashMap<String, AliasRank>,
}

impl ResolutionContext {
    /// Start a batch with pin tables for every node already on the board
    pub fn seed(board: &Board) -> Self {
        let mut ctx = Self::default();
        for node in board.nodes_iter() {
            ctx.pins.insert(node.id.clone(), PinTable::from_node(node));
        }
        ctx
    }

    /// Register a node created at batch `position`; returns the aliases it answers to.
    ///
    /// An explicit ref id always binds. `$N` and the real id bind unless an
    /// earlier node claimed the same string as its explicit ref id. The type
    /// name binds to the latest node of that type unless anything stronger
    /// already holds it.
    pub fn register_created(
        &mut self,
        node: &Node,
        ref_id: Option<&str>,
        position: usize,
    ) -> Vec<String> {
        let table = PinTable::from_node(node);
        let candidates = [
            ref_id
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| (r.to_string(), AliasRank::Explicit)),
            Some((format!("${position}"), AliasRank::Positional)),
            Some((node.id.clone(), AliasRank::Positional)),
            Some((node.name.clone(), AliasRank::TypeName)),
        ];

        let mut aliases: Vec<String> = Vec::new();
        for (alias, rank) in candidates.into_iter().flatten() {
            if aliases.contains(&alias) {
                continue;
            }
            let held = self.ranks.get(&alias).copied();
            let holder = self.nodes.get(&alias).map(|n| n.id.clone());
            let other_holder = holder.as_deref().is_some_and(|id| id != node.id);

            let binds = match (rank, held) {
                (_, None) => true,
                (AliasRank::Explicit, Some(AliasRank::Explicit)) => {
                    if other_holder {
                        log::warn!(
                            "Reference '{}' rebound from {} to {}",
                            alias,
                            holder.as_deref().unwrap_or_default(),
                            node.id
                        );
                    }
                    true
                }
                (rank, Some(held)) => rank >= held,
            };
            if !binds {
                log::debug!(
                    "Alias '{}' of node {} kept by {}",
                    alias,
                    node.id,
                    holder.as_deref().unwrap_or_default()
                );
                continue;
            }

            self.ranks.insert(alias.clone(), rank);
            self.bind(alias.clone(), node, &table);
            aliases.push(alias);
        }

        log::debug!("Registered node {} under {:?}", node.id, aliases);
        aliases
    }

    fn bind(&mut self, alias: String, node: &Node, table: &PinTable) {
        self.nodes.insert(alias.clone(), node.clone());
        self.pins.insert(alias, table.clone());
    }

    /// Real node id behind a batch alias, if any
    pub fn real_id<'a>(&'a self, reference: &'a str) -> Option<&'a str> {
        self.nodes.get(reference.trim()).map(|node| node.id.as_str())
    }

    /// Resolve a node reference against batch aliases first, then real board ids
    pub fn resolve_node(&self, reference: &str, board: &Board) -> Result<Node> {
        let reference = reference.trim();
        if let Some(created) = self.nodes.get(reference) {
            return Ok(board.node(&created.id).cloned().unwrap_or_else(|| created.clone()));
        }
        board
            .node(reference)
            .cloned()
            .ok_or_else(|| ApplyError::NodeNotFound {
                reference: reference.to_string(),
                known: self.known_references(board),
            })
    }

    /// Resolve a pin on an already resolved node.
    ///
    /// The table recorded for `node_ref` is used while its ids still exist on
    /// `node`; otherwise the table is rebuilt from `node` itself.
    pub fn resolve_pin(&self, node_ref: &str, node: &Node, pin_ref: &str) -> Result<PinMatch> {
        let recorded = self
            .pins
            .get(node_ref.trim())
            .or_else(|| self.pins.get(&node.id))
            .filter(|table| node.pins.keys().all(|id| table.contains_id(id)));

        let fresh;
        let table = match recorded {
            Some(table) => table,
            None => {
                fresh = PinTable::from_node(node);
                &fresh
            }
        };

        match table.resolve(pin_ref) {
            Some(found) if node.pins.contains_key(&found.pin_id) => Ok(found),
            _ => Err(ApplyError::PinNotFound {
                node_ref: node_ref.to_string(),
                node_id: node.id.clone(),
                pin: pin_ref.to_string(),
                available: table.available(),
            }),
        }
    }

    /// Every reference a command may use right now, sorted
    pub fn known_references(&self, board: &Board) -> Vec<String> {
        let mut known: Vec<String> = self
            .nodes
            .keys()
            .cloned()
            .chain(board.nodes_iter().map(|node| node.id.clone()))
            .collect();
        known.sort();
        known.dedup();
        known
    }

    pub fn created_count(&self) -> usize {
        self.nodes
            .values()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}
