//! # Flowboard Search
//!
//! Ranked free-text search over a board snapshot: nodes, pins, pin values,
//! layers, comments and variables.
//!
//! ## Architecture
//!
//! ```text
//! Board snapshot
//!     │
//!     ├──> build_documents()        one SearchResult per entity
//!     │      └─ layer breadcrumbs via LayerForest
//!     │
//!     ├──> BoardIndex::build()      per-field inverted index
//!     │      ├─ terms: words + camelCase parts
//!     │      └─ prefixes: 3..=7 chars of longer terms
//!     │
//!     └──> BoardIndex::search()
//!            ├─ BM25 × field boost (SearchProfile)
//!            ├─ prefix hits, nucleo fuzzy expansion
//!            ├─ exact-name bonus
//!            └─ dedup (type, node, pin) → sort → limit
//! ```
//!
//! [`IndexCache`] is the entry point for callers: it memoizes indexes by board
//! content (SHA-256 of the snapshot) so an unchanged board is never re-indexed.
//! Long-lived callers such as an editor session keep one cache and call
//! [`IndexCache::get_or_build`] on every snapshot; the `flowboard` CLI builds
//! through a single-entry cache per invocation.
//!
//! ```no_run
//! use flowboard_search::{IndexCache, SearchProfile};
//!
//! # fn run(board: flowboard_graph::Board) -> flowboard_search::Result<()> {
//! let cache = IndexCache::new(4, SearchProfile::board());
//! let index = cache.get_or_build(&board)?;
//! for hit in index.search("http request")? {
//!     println!("{} {}", hit.kind.as_str(), hit.name);
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod document;
mod error;
mod fuzzy;
mod highlight;
mod index;
mod profile;
mod tokenizer;

pub use cache::{fingerprint, BoardFingerprint, IndexCache};
pub use document::{build_documents, SearchResult, SearchResultType};
pub use error::{Result, SearchError};
pub use fuzzy::FuzzyTerms;
pub use highlight::highlight;
pub use index::{BoardIndex, Field};
pub use profile::{Bm25Config, FieldBoosts, FuzzyConfig, SearchProfile};
pub use tokenizer::{tokenize_field, tokenize_query, FieldTokens};
