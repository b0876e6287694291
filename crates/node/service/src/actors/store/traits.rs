//! Collaborator traits consumed by the block store actor.

use alloy_primitives::B256;
use basalt_primitives::ChainEntry;
use bytes::Bytes;

/// An ordered, height-addressable view of the best known chain.
///
/// Owned by the consensus/validation engine; the storage pipeline only reads
/// it. Entries may change between calls when the best chain is reorganized,
/// and the store loop is built to tolerate that.
pub trait ChainIndex: Send + Sync {
    /// Returns the entry at the given height of the recognized chain, if the
    /// chain has grown that far.
    fn entry_at(&self, height: u64) -> Option<ChainEntry>;

    /// Returns the entry for the given block hash if the recognized chain
    /// contains it at any height.
    fn entry_by_hash(&self, hash: &B256) -> Option<ChainEntry>;
}

/// Asynchronous network retrieval of block bytes, driven by the store loop's
/// fetch path.
///
/// `request` is fire-and-forget; completed downloads are picked up through
/// `poll`, which never blocks. Implementations live in the peer-to-peer
/// subsystem.
pub trait BlockFetcher: Send + Sync {
    /// Asks the network for the block identified by `entry`.
    fn request(&self, entry: &ChainEntry);

    /// Returns the downloaded bytes for `entry` once available, consuming
    /// them. `None` while the download is still in flight.
    fn poll(&self, entry: &ChainEntry) -> Option<Bytes>;
}
