//! Chain-index entry type.

use alloy_primitives::B256;

/// A single entry of the best-chain index: the identity of one block at one
/// height of the currently recognized chain.
///
/// Entries are cheap to copy and are passed by value between the chain index,
/// the block fetcher, and the storage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChainEntry {
    /// The block hash at this height.
    pub hash: B256,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The height of the block in the chain.
    pub height: u64,
}

impl ChainEntry {
    /// Creates a new chain entry.
    pub const fn new(hash: B256, parent_hash: B256, height: u64) -> Self {
        Self { hash, parent_hash, height }
    }

    /// Returns `true` if `child` directly extends `self`.
    pub fn is_parent_of(&self, child: &Self) -> bool {
        child.parent_hash == self.hash && child.height == self.height + 1
    }
}

impl core::fmt::Display for ChainEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.hash, self.height)
    }
}
