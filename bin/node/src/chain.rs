//! In-process chain collaborators for running the storage pipeline standalone.
//!
//! The consensus and peer-to-peer services ship separately; this module gives
//! the binary a recognized chain (genesis only) and an inert fetcher so the
//! storage service can run, idle, and shut down cleanly on its own.

use alloy_primitives::B256;
use basalt_node_service::{BlockFetcher, ChainIndex};
use basalt_primitives::{Block, BlockHeader, ChainEntry};
use bytes::Bytes;
use tracing::trace;

/// Deterministic development genesis block.
pub(crate) fn dev_genesis() -> Block {
    Block {
        header: BlockHeader {
            parent_hash: B256::ZERO,
            state_root: B256::ZERO,
            transactions_root: B256::ZERO,
            timestamp: 1_231_006_505,
            nonce: 2_083_236_893,
        },
        transactions: vec![],
    }
}

/// A fixed, genesis-only chain index.
#[derive(Debug)]
pub(crate) struct StaticChainIndex {
    entries: Vec<ChainEntry>,
}

impl StaticChainIndex {
    pub(crate) fn new(genesis: &Block) -> Self {
        Self { entries: vec![ChainEntry::new(genesis.hash(), B256::ZERO, 0)] }
    }
}

impl ChainIndex for StaticChainIndex {
    fn entry_at(&self, height: u64) -> Option<ChainEntry> {
        self.entries.get(height as usize).copied()
    }

    fn entry_by_hash(&self, hash: &B256) -> Option<ChainEntry> {
        self.entries.iter().find(|entry| entry.hash == *hash).copied()
    }
}

/// A fetcher with no peers: requests are dropped and nothing ever completes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IdleFetcher;

impl BlockFetcher for IdleFetcher {
    fn request(&self, entry: &ChainEntry) {
        trace!(target: "basalt_node", block = %entry, "No peers available to serve request");
    }

    fn poll(&self, _entry: &ChainEntry) -> Option<Bytes> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_genesis_is_deterministic() {
        assert_eq!(dev_genesis().hash(), dev_genesis().hash());
        assert_eq!(dev_genesis().header.parent_hash, B256::ZERO);
    }

    #[test]
    fn static_index_recognizes_only_genesis() {
        let genesis = dev_genesis();
        let index = StaticChainIndex::new(&genesis);
        assert_eq!(index.entry_at(0).map(|e| e.hash), Some(genesis.hash()));
        assert!(index.entry_at(1).is_none());
        assert!(index.entry_by_hash(&B256::repeat_byte(9)).is_none());
    }
}
