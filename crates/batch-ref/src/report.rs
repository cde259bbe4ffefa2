use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandStatus {
    Applied,
    Failed { reason: String },
}

/// What happened to one command of the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    /// Position in the input list
    pub index: usize,
    pub kind: &'static str,
    #[serde(flatten)]
    pub status: CommandStatus,
    /// Id of the entity the mutation produced or touched
    pub entity_id: Option<String>,
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        self.status == CommandStatus::Applied
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedNode {
    pub node_id: String,
    pub aliases: Vec<String>,
}

/// Result of one batch application, outcomes in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<CommandOutcome>,
    pub created: Vec<CreatedNode>,
    /// The caller must refetch the board; the applier's local view is not authoritative
    pub refetch_required: bool,
}

impl BatchReport {
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.applied()
    }

    pub fn outcome(&self, index: usize) -> Option<&CommandOutcome> {
        self.outcomes.iter().find(|o| o.index == index)
    }
}
