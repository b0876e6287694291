//! Buffer of validated blocks awaiting durable storage.

use super::{ChainIndex, ChainStateHandle, metrics};
use alloy_primitives::B256;
use basalt_primitives::{Block, ChainEntry};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// A validated block waiting to be persisted, together with its chain-index
/// entry at the time it was offered.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    /// The validated block.
    pub block: Block,
    /// The chain-index entry the block was recognized at.
    pub entry: ChainEntry,
}

/// Concurrent buffer decoupling "block has been validated" from "block has
/// been durably stored".
///
/// Producers (the validation notification path) insert concurrently through
/// [`Self::offer`]; the store loop is the only bulk consumer through
/// [`Self::take`]. Occupancy is a batching heuristic only, never a
/// correctness mechanism.
#[derive(derive_more::Debug)]
pub struct PendingBlocks {
    entries: DashMap<B256, PendingEntry>,
    #[debug(skip)]
    index: Arc<dyn ChainIndex>,
    state: ChainStateHandle,
}

impl PendingBlocks {
    /// Creates an empty buffer over the given chain index and state cursors.
    pub fn new(index: Arc<dyn ChainIndex>, state: ChainStateHandle) -> Self {
        Self { entries: DashMap::new(), index, state }
    }

    /// Offers a validated block to the buffer.
    ///
    /// Blocks the chain index no longer recognizes are dropped silently; this
    /// is the normal outcome of a reorg racing a still-in-flight block.
    /// Blocks at or below the persisted tip are already superseded and are
    /// likewise dropped.
    pub fn offer(&self, block: Block) {
        let hash = block.hash();
        let Some(entry) = self.index.entry_by_hash(&hash) else {
            trace!(target: "block_store", block = %hash, "Dropping pending block on abandoned fork");
            return;
        };
        if entry.height <= self.state.highest_persisted().height {
            trace!(target: "block_store", block = %entry, "Dropping superseded pending block");
            return;
        }
        self.entries.insert(hash, PendingEntry { block, entry });
        metrics::record_pending(self.entries.len());
    }

    /// Atomically removes and returns the entry for `hash`, if buffered.
    pub fn take(&self, hash: &B256) -> Option<PendingEntry> {
        let taken = self.entries.remove(hash).map(|(_, entry)| entry);
        if taken.is_some() {
            metrics::record_pending(self.entries.len());
        }
        taken
    }

    /// Returns whether the buffer currently holds `hash`.
    pub fn contains(&self, hash: &B256) -> bool {
        self.entries.contains_key(hash)
    }

    /// Approximate occupancy, used only for batch-trigger decisions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops entries the chain index no longer recognizes.
    ///
    /// Called after a reorg rollback so entries orphaned while buffered do not
    /// accumulate.
    pub(super) fn prune_stale(&self) {
        self.entries.retain(|hash, pending| {
            self.index.entry_by_hash(hash).is_some_and(|entry| entry == pending.entry)
        });
        metrics::record_pending(self.entries.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestChain, TestChainIndex};

    #[test]
    fn offer_filters_unrecognized_and_superseded() {
        let chain = TestChain::new(4, 7);
        let index = Arc::new(TestChainIndex::new(&chain));
        let state = ChainStateHandle::new(chain.entry(1));
        let pending = PendingBlocks::new(index, state);

        // Not on the recognized chain.
        let orphan = TestChain::new(2, 99).block(1).clone();
        pending.offer(orphan);
        assert!(pending.is_empty());

        // At the persisted tip height: superseded.
        pending.offer(chain.block(1).clone());
        assert!(pending.is_empty());

        // Strictly above the persisted tip: buffered.
        pending.offer(chain.block(2).clone());
        assert_eq!(pending.len(), 1);
        assert!(pending.contains(&chain.entry(2).hash));
    }

    #[test]
    fn take_is_remove_and_return() {
        let chain = TestChain::new(3, 1);
        let index = Arc::new(TestChainIndex::new(&chain));
        let state = ChainStateHandle::new(chain.entry(0));
        let pending = PendingBlocks::new(index, state);

        pending.offer(chain.block(1).clone());
        let hash = chain.entry(1).hash;
        let taken = pending.take(&hash).expect("buffered");
        assert_eq!(taken.block, *chain.block(1));
        assert_eq!(taken.entry, chain.entry(1));
        assert!(pending.take(&hash).is_none());
    }

    #[test]
    fn prune_drops_reorged_entries() {
        let chain = TestChain::new(4, 3);
        let index = Arc::new(TestChainIndex::new(&chain));
        let state = ChainStateHandle::new(chain.entry(0));
        let pending = PendingBlocks::new(index.clone(), state);

        pending.offer(chain.block(2).clone());
        pending.offer(chain.block(3).clone());
        assert_eq!(pending.len(), 2);

        // Reorg to a chain sharing only heights 0..=1.
        let fork = chain.fork_at(2, 55, 4);
        index.set_chain(&fork);
        pending.prune_stale();
        assert!(pending.is_empty());
    }
}
