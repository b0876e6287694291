use crate::StorageError;
use alloy_primitives::B256;
use basalt_primitives::Block;

/// Durable, single-writer storage of blocks, the optional transaction index,
/// and the stored-tip record.
///
/// Mutating operations are serialized internally: concurrent callers queue
/// behind one logical writer rather than race. Every mutating call is a single
/// atomic batch — partial application is never observable, and a failed call
/// leaves the store exactly as it was.
///
/// Implementations are expected to be cheap to share behind an `Arc` and safe
/// for concurrent reads.
pub trait BlockStore: Send + Sync {
    /// Performs first-run setup and configuration validation.
    ///
    /// On an empty store, writes the genesis block, the tip record pointing at
    /// it, and the transaction-index marker as one commit. On an existing
    /// store, verifies that the persisted transaction-index marker matches the
    /// configured setting; a mismatch is only repairable while the stored tip
    /// is still genesis, otherwise it is a fatal
    /// [`StorageError::TxIndexMismatch`].
    fn initialize(&self, genesis: &Block) -> Result<(), StorageError>;

    /// Inserts every block not already present (indexing its transactions when
    /// the index is enabled), then sets the tip record to `next_tip`, all as
    /// one atomic batch.
    ///
    /// Re-inserting an already-present block is a no-op, not an error: the
    /// stored bytes are left untouched and no index entries are duplicated.
    /// `index_transactions` must match the store's configured setting.
    fn put(
        &self,
        next_tip: B256,
        blocks: &[Block],
        index_transactions: bool,
    ) -> Result<(), StorageError>;

    /// Returns the block stored under `hash`, if any.
    fn block(&self, hash: &B256) -> Result<Option<Block>, StorageError>;

    /// Returns whether a block is stored under `hash`.
    ///
    /// This is a key-presence check only; it never deserializes transaction
    /// bodies.
    fn contains(&self, hash: &B256) -> Result<bool, StorageError>;

    /// Returns the hash of the block owning `tx_hash`, if the transaction
    /// index is enabled and the transaction is indexed.
    fn transaction_owner(&self, tx_hash: &B256) -> Result<Option<B256>, StorageError>;

    /// Removes the given blocks and their transaction-index entries, then sets
    /// the tip record to `new_tip`, all as one atomic batch.
    ///
    /// Used exclusively for reorg rollback.
    fn delete(&self, new_tip: B256, hashes: &[B256]) -> Result<(), StorageError>;

    /// Updates the tip record without touching block records.
    ///
    /// Used when a block already on disk becomes the new logical tip.
    fn set_tip(&self, hash: B256) -> Result<(), StorageError>;

    /// Returns the stored tip hash, or `None` before initialization.
    fn tip(&self) -> Result<Option<B256>, StorageError>;
}
