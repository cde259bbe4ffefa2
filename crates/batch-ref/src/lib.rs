//! # Flowboard Batch
//!
//! Applies copilot-generated [`BoardCommand`](flowboard_protocol::BoardCommand)
//! batches to a live board. Commands address nodes and pins by human-readable
//! references; this crate resolves them to real ids and drives an external
//! [`MutationFacility`] one mutation at a time.
//!
//! ## Architecture
//!
//! ```text
//! Vec<BoardCommand>
//!     │
//!     ├──> Pass 1: AddNode, AddPlaceholder (input order)
//!     │      ├─ NodeCatalog lookup or placeholder pins
//!     │      ├─ GridLayout default position
//!     │      └─ ResolutionContext: ref_id, $N, type name, real id
//!     │
//!     └──> Pass 2: everything else (input order)
//!            ├─ node refs: batch aliases, then board ids
//!            ├─ pin refs: id → name → lowercase name → friendly name
//!            ├─ MutationFacility::execute(GenericCommand)
//!            └─ fence() or SettlePolicy delay
//!
//! BatchReport ── one outcome per command, one Notice per failure
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use flowboard_batch::{BatchApplier, InMemoryFacility, LogNotifier};
//! use flowboard_graph::Board;
//!
//! # async fn run(board: Board, catalog: Vec<flowboard_graph::Node>) {
//! let facility = InMemoryFacility::new(board.clone());
//! let commands = flowboard_protocol::parse_command_batch(
//!     r#"[{"command_type":"AddNode","node_type":"log","ref_id":"A"}]"#,
//! )
//! .unwrap();
//! let report = BatchApplier::new(&facility, &catalog, &LogNotifier)
//!     .apply(&board, commands)
//!     .await;
//! assert!(report.refetch_required);
//! # }
//! ```

mod apply;
mod catalog;
mod config;
mod context;
mod error;
mod facility;
mod layout;
mod memory;
mod notify;
mod report;

pub use apply::{BatchApplier, PLACEHOLDER_NODE_TYPE};
pub use catalog::NodeCatalog;
pub use config::{ApplierConfig, SettlePolicy};
pub use context::{PinMatch, PinMatchKind, PinTable, ResolutionContext};
pub use error::{ApplyError, MutationError, MutationErrorKind, Result};
pub use facility::{MutationFacility, SettlePoint};
pub use layout::GridLayout;
pub use memory::InMemoryFacility;
pub use notify::{LogNotifier, Notice, NoticeIcon, Notifier, RecordingNotifier};
pub use report::{BatchReport, CommandOutcome, CommandStatus, CreatedNode};
