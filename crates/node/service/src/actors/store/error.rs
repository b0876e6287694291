//! Error type for the block store actor.

use alloy_primitives::B256;
use basalt_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by block store activations.
///
/// Transient storage failures are retried on the next scheduled activation;
/// invariant violations terminate the actor, since they indicate repository
/// corruption or a chain-index bug.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The repository reported an error. The batch that triggered it was not
    /// applied.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The store has no tip record after initialization.
    #[error("block store has no tip record after initialization")]
    Uninitialized,

    /// The reorg rollback walk reached genesis without finding a block the
    /// chain index recognizes.
    #[error("no fork point found walking back from stored tip {0}")]
    ForkPointNotFound(B256),

    /// A block referenced by the stored chain is missing from the repository.
    #[error("stored chain references missing block {0}")]
    MissingBlock(B256),
}

impl StoreError {
    /// Returns `true` if the error must terminate the actor rather than be
    /// retried.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Uninitialized |
                Self::ForkPointNotFound(_) |
                Self::MissingBlock(_) |
                Self::Storage(StorageError::TxIndexMismatch { .. })
        )
    }
}
