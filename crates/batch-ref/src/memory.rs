use crate::error::{MutationError, MutationErrorKind};
use crate::facility::{MutationFacility, SettlePoint};
use async_trait::async_trait;
use flowboard_graph::{Board, GenericCommand, GraphError, Mutated};
use tokio::sync::Mutex;

/// Facility backed by a board held in memory.
///
/// Mutations are serialized by the lock and visible as soon as `execute`
/// returns, so no settle delay is needed after them.
pub struct InMemoryFacility {
    state: Mutex<State>,
}

struct State {
    board: Board,
    journal: Vec<GenericCommand>,
}

impl InMemoryFacility {
    pub fn new(board: Board) -> Self {
        Self {
            state: Mutex::new(State {
                board,
                journal: Vec::new(),
            }),
        }
    }

    /// Successfully applied mutations, oldest first
    pub async fn journal(&self) -> Vec<GenericCommand> {
        self.state.lock().await.journal.clone()
    }

    pub fn into_board(self) -> Board {
        self.state.into_inner().board
    }
}

#[async_trait]
impl MutationFacility for InMemoryFacility {
    async fn execute(&self, command: GenericCommand) -> Result<Mutated, MutationError> {
        let mut state = self.state.lock().await;
        let mutated = state
            .board
            .execute(command.clone())
            .map_err(mutation_error)?;
        state.journal.push(command);
        Ok(mutated)
    }

    async fn snapshot(&self) -> Result<Board, MutationError> {
        Ok(self.state.lock().await.board.clone())
    }

    async fn fence(&self, _point: SettlePoint) -> bool {
        true
    }
}

fn mutation_error(err: GraphError) -> MutationError {
    let kind = match &err {
        GraphError::Stale(_) => MutationErrorKind::StaleVersion,
        GraphError::NodeNotFound(_)
        | GraphError::PinNotFound { .. }
        | GraphError::LayerNotFound(_)
        | GraphError::VariableNotFound(_)
        | GraphError::CommentNotFound(_) => MutationErrorKind::NotFound,
        _ => MutationErrorKind::Rejected,
    };
    MutationError::new(kind, err.to_string())
}
