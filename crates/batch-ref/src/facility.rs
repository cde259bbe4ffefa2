use crate::error::MutationError;
use async_trait::async_trait;
use flowboard_graph::{Board, GenericCommand, Mutated};

/// Points in a batch where the applier waits for the facility to catch up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePoint {
    /// Before the next second-pass command
    BetweenCommands,
    /// Right after a successful pin connection
    AfterConnect,
}

/// External, serializing mutation API of a board.
///
/// At most one call is in flight at a time: the applier awaits every
/// `execute` before issuing the next one.
#[async_trait]
pub trait MutationFacility: Send + Sync {
    async fn execute(&self, command: GenericCommand) -> Result<Mutated, MutationError>;

    /// Authoritative board state as of now
    async fn snapshot(&self) -> Result<Board, MutationError>;

    /// Wait until every acknowledged mutation is visible to readers.
    ///
    /// Returns `false` when the facility has no such acknowledgement; the
    /// applier then falls back to its configured delays.
    async fn fence(&self, _point: SettlePoint) -> bool {
        false
    }
}
