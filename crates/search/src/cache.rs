use crate::error::{Result, SearchError};
use crate::index::BoardIndex;
use crate::profile::SearchProfile;
use flowboard_graph::Board;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const DEFAULT_CAPACITY: usize = 8;

/// Content hash of a board snapshot
pub type BoardFingerprint = [u8; 32];

/// Memoizes [`BoardIndex`] builds per board content.
///
/// Keys are SHA-256 digests of the canonical JSON snapshot, so any mutation
/// yields a fresh index and an unchanged board reuses the cached one.
pub struct IndexCache {
    profile: SearchProfile,
    entries: Mutex<LruCache<BoardFingerprint, Arc<BoardIndex>>>,
}

impl IndexCache {
    pub fn new(capacity: usize, profile: SearchProfile) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            profile,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get_or_build(&self, board: &Board) -> Result<Arc<BoardIndex>> {
        let key = fingerprint(board)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SearchError::Other("index cache lock poisoned".to_string()))?;

        if let Some(index) = entries.get(&key) {
            log::debug!("Index cache hit for board {}", board.id);
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(BoardIndex::build(board, self.profile.clone()));
        entries.put(key, Arc::clone(&index));
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, SearchProfile::board())
    }
}

/// SHA-256 over the board serialized with sorted object keys
pub fn fingerprint(board: &Board) -> Result<BoardFingerprint> {
    let canonical = serde_json::to_value(board)?;
    let bytes = serde_json::to_vec(&canonical)?;
    let digest = Sha256::digest(&bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(out)
}
