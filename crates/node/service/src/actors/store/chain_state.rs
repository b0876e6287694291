//! Shared chain-state cursors.

use basalt_primitives::ChainEntry;
use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug)]
struct ChainStateInner {
    /// Height of the highest chain-index entry known to be fully valid.
    /// Written by the validation side, read by the store loop.
    highest_valid: AtomicU64,
    /// The highest entry known to be durably persisted. Written by the store
    /// loop strictly after the corresponding repository commit succeeds.
    highest_persisted: RwLock<ChainEntry>,
}

/// Cheap-to-clone handle over the two height-ordered chain cursors shared
/// between the validation engine and the storage pipeline.
///
/// The store loop only ever reads the valid cursor and writes the persisted
/// cursor; the setters for the valid cursor exist for the validation side and
/// for tests.
#[derive(Debug, Clone)]
pub struct ChainStateHandle {
    inner: Arc<ChainStateInner>,
}

impl ChainStateHandle {
    /// Creates a handle with both cursors at the given entry.
    pub fn new(entry: ChainEntry) -> Self {
        Self {
            inner: Arc::new(ChainStateInner {
                highest_valid: AtomicU64::new(entry.height),
                highest_persisted: RwLock::new(entry),
            }),
        }
    }

    /// Returns the height of the highest fully-valid chain-index entry.
    pub fn highest_valid_height(&self) -> u64 {
        self.inner.highest_valid.load(Ordering::Acquire)
    }

    /// Advances the highest fully-valid height.
    pub fn set_highest_valid_height(&self, height: u64) {
        self.inner.highest_valid.store(height, Ordering::Release);
    }

    /// Returns the highest durably-persisted entry.
    pub fn highest_persisted(&self) -> ChainEntry {
        *self.inner.highest_persisted.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a new highest durably-persisted entry.
    pub fn set_highest_persisted(&self, entry: ChainEntry) {
        *self.inner.highest_persisted.write().unwrap_or_else(PoisonError::into_inner) = entry;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn cursors_are_independent() {
        let genesis = ChainEntry::new(B256::repeat_byte(1), B256::ZERO, 0);
        let state = ChainStateHandle::new(genesis);
        assert_eq!(state.highest_valid_height(), 0);
        assert_eq!(state.highest_persisted(), genesis);

        state.set_highest_valid_height(10);
        assert_eq!(state.highest_valid_height(), 10);
        assert_eq!(state.highest_persisted(), genesis);

        let tip = ChainEntry::new(B256::repeat_byte(2), genesis.hash, 1);
        state.set_highest_persisted(tip);
        assert_eq!(state.highest_persisted(), tip);

        // Clones observe the same cursors.
        let clone = state.clone();
        assert_eq!(clone.highest_persisted(), tip);
    }
}
